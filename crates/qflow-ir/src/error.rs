//! Error types for the IR crate.

use crate::gate::GateId;
use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A gate violates a structural invariant of the circuit model.
    ///
    /// Optimization stages treat such gates as inert instead of failing.
    #[error("Invalid gate{}: {reason}", format_gate_context(.gate))]
    InvalidGate {
        /// The offending gate, if it has an id.
        gate: Option<GateId>,
        /// What is wrong with it.
        reason: String,
    },

    /// Qubit not declared in the circuit.
    #[error("Qubit {qubit} not found in circuit{}", format_gate_context(.gate))]
    QubitNotFound {
        /// The qubit that was not found.
        qubit: QubitId,
        /// Optional gate for context.
        gate: Option<GateId>,
    },

    /// The dependency graph contains a cycle.
    ///
    /// Impossible for a well-formed circuit; signals an upstream data-model
    /// violation and is never downgraded to a warning.
    #[error("Cycle detected in gate dependency graph at gate '{gate}'")]
    CycleDetected {
        /// A gate on the cycle (the gray node that was revisited).
        gate: GateId,
    },

    /// Unknown gate id referenced.
    #[error("Unknown gate '{0}'")]
    UnknownGate(GateId),
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate: &Option<GateId>) -> String {
    match gate {
        Some(id) => format!(" (gate: {id})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

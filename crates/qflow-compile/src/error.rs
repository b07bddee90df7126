//! Error types for the optimization pipeline.

use qflow_ir::{IrError, QubitId};
use thiserror::Error;

/// Errors that can occur during optimization.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// The mapper could not place every logical qubit on the hardware.
    #[error("Qubit mapping incomplete: {} of {required} logical qubits unplaced on '{hardware}' ({available} physical)", .unplaced.len())]
    MappingIncomplete {
        /// Name of the hardware model.
        hardware: String,
        /// Logical qubits that need a physical home.
        required: usize,
        /// Physical qubits the hardware offers.
        available: usize,
        /// Logical qubits left without an assignment.
        unplaced: Vec<QubitId>,
    },

    /// A pass needs a hardware model with connectivity.
    #[error("Hardware model '{0}' has no connectivity")]
    MissingHardwareModel(String),

    /// Pass execution failed.
    #[error("Pass '{name}' failed: {reason}")]
    PassFailed {
        /// Pass name.
        name: String,
        /// What went wrong.
        reason: String,
    },

    /// Invalid pipeline configuration.
    #[error("Invalid optimization options: {0}")]
    InvalidConfiguration(String),
}

impl CompileError {
    /// Whether the error must abort the whole pipeline.
    ///
    /// Only a dependency cycle is fatal; every other stage failure falls back
    /// to the previous stage's output.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CompileError::Ir(IrError::CycleDetected { .. }))
    }
}

/// Result type for optimization operations.
pub type CompileResult<T> = Result<T, CompileError>;

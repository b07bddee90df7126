//! Error types for the sim crate.

use thiserror::Error;

/// Errors produced by state-vector simulation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// The state vector for this many qubits would not fit the configured limit.
    ///
    /// Raised before any amplitude is allocated.
    #[error("Simulating {required} qubits exceeds the limit of {max} (state vector of 2^{required} amplitudes)")]
    CapacityExceeded {
        /// Qubits the circuit needs.
        required: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A gate failed validation in strict mode.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] qflow_ir::IrError),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

//! qflow State-Vector Simulator
//!
//! Exact simulation of a gate list over a full complex amplitude vector.
//! The simulator is independent of the optimizer: it accepts any gate list,
//! optimized or not, and reports measurement statistics for the final state.
//!
//! # Conventions
//!
//! - Wires are the declared qubits plus any qubit a gate references, in
//!   ascending id order. Wire 0 is the leftmost character of every bitstring.
//! - Rotation and phase angles are in degrees.
//! - `measure` does not collapse the state; the reported distribution is the
//!   one a measurement at the end of the circuit would sample.
//!
//! # Performance
//!
//! | Qubits | Memory | Simulation Speed |
//! |--------|--------|------------------|
//! | 10 | ~16 KB | Instant |
//! | 15 | ~512 KB | Fast |
//! | 20 | ~16 MB | Moderate |
//! | 24 | ~256 MB | Slow (default limit) |
//!
//! # Example
//!
//! ```rust
//! use qflow_ir::Circuit;
//! use qflow_sim::Simulator;
//!
//! let result = Simulator::new().run(&Circuit::bell().unwrap()).unwrap();
//! let probabilities = result.probability_map();
//!
//! // Expect 50% |00⟩ and 50% |11⟩
//! assert_eq!(probabilities.len(), 2);
//! assert!((probabilities["00"] - 0.5).abs() < 1e-12);
//! assert!((probabilities["11"] - 0.5).abs() < 1e-12);
//! ```

pub mod error;
mod simulator;
mod statevector;

pub use error::{SimError, SimResult};
pub use simulator::{
    DEFAULT_MAX_QUBITS, DEFAULT_PROBABILITY_THRESHOLD, SimulationReport, SimulationResult,
    Simulator, SimulatorConfig,
};
pub use statevector::{Statevector, bitstring};

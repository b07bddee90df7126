//! Built-in optimization passes.
//!
//! Passes are organized into two categories:
//! - [`agnostic`]: passes that only look at the gate list
//! - [`target`]: passes that need the hardware model

pub mod agnostic;
pub mod target;

pub use agnostic::{DepthReduction, GateSynthesis, SynthesisStats};
pub use target::{CNOT_THRESHOLD, NoiseAwareCancellation, QubitMapping};

//! Target-agnostic passes.
//!
//! These passes only look at the gate list; they never consult the
//! hardware model.

pub mod scheduling;
pub mod synthesis;

pub use scheduling::DepthReduction;
pub use synthesis::{GateSynthesis, SynthesisStats};

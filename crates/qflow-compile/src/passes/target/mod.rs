//! Target-specific passes.
//!
//! These passes consult the hardware model in the [`PropertySet`](crate::PropertySet).

pub mod mapping;
pub mod noise;

pub use mapping::QubitMapping;
pub use noise::{CNOT_THRESHOLD, NoiseAwareCancellation};

//! CLI command implementations.

pub mod common;
pub mod metrics;
pub mod optimize;
pub mod run;
pub mod simulate;

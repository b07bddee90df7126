//! Optimization options.

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};
use crate::hardware::HardwareModel;

/// Highest meaningful synthesis level.
pub const MAX_SYNTHESIS_LEVEL: u8 = 3;

/// Which stages of the optimization pipeline run, and how.
///
/// The default value turns every stage off, so optimizing with it returns
/// the input gates unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizationOptions {
    /// Rewrite passes to run (0 disables the rewrite engine).
    pub synthesis_level: u8,
    /// Run the noise-aware CNOT reducer.
    pub noise_aware: bool,
    /// Target hardware for mapping and fidelity estimates.
    pub hardware_model: HardwareModel,
    /// Re-time gates to their earliest slots.
    pub depth_reduction: bool,
    /// Compress the schedule to at most this many columns.
    pub max_depth: Option<u32>,
    /// Map logical qubits onto the hardware connectivity.
    pub qubit_mapping: bool,
    /// Keep the identity layout when it already satisfies the hardware.
    pub preserve_layout: bool,
}

impl OptimizationOptions {
    /// Options with every stage off.
    pub fn none() -> Self {
        Self::default()
    }

    /// Set the synthesis level.
    #[must_use]
    pub fn with_synthesis_level(mut self, level: u8) -> Self {
        self.synthesis_level = level;
        self
    }

    /// Enable the noise-aware reducer.
    #[must_use]
    pub fn with_noise_aware(mut self, enabled: bool) -> Self {
        self.noise_aware = enabled;
        self
    }

    /// Enable depth reduction, optionally bounded.
    #[must_use]
    pub fn with_depth_reduction(mut self, max_depth: Option<u32>) -> Self {
        self.depth_reduction = true;
        self.max_depth = max_depth;
        self
    }

    /// Enable qubit mapping onto `hardware`.
    #[must_use]
    pub fn with_mapping(mut self, hardware: HardwareModel, preserve_layout: bool) -> Self {
        self.qubit_mapping = true;
        self.hardware_model = hardware;
        self.preserve_layout = preserve_layout;
        self
    }

    /// Set the hardware model without enabling mapping.
    #[must_use]
    pub fn with_hardware(mut self, hardware: HardwareModel) -> Self {
        self.hardware_model = hardware;
        self
    }

    /// Whether every stage is off.
    pub fn is_noop(&self) -> bool {
        self.synthesis_level == 0 && !self.noise_aware && !self.qubit_mapping && !self.depth_reduction
    }

    /// Reject option combinations no stage can honour.
    pub fn validate(&self) -> CompileResult<()> {
        if self.synthesis_level > MAX_SYNTHESIS_LEVEL {
            return Err(CompileError::InvalidConfiguration(format!(
                "synthesisLevel must be 0..={MAX_SYNTHESIS_LEVEL}, got {}",
                self.synthesis_level
            )));
        }
        if self.max_depth == Some(0) {
            return Err(CompileError::InvalidConfiguration(
                "maxDepth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

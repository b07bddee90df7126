//! Pass manager and the top-level `optimize` entry point.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use qflow_ir::{Circuit, CircuitMetrics, Gate, Qubit, QubitId, depth_of};

use crate::error::CompileResult;
use crate::hardware::HardwareModel;
use crate::options::{MAX_SYNTHESIS_LEVEL, OptimizationOptions};
use crate::pass::Pass;
use crate::passes::{
    DepthReduction, GateSynthesis, NoiseAwareCancellation, QubitMapping, SynthesisStats,
};
use crate::property::{Layout, PassReport, PropertySet};

/// Manages and executes a sequence of optimization passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Names of the passes, in execution order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run all passes on `gates`.
    ///
    /// Each pass receives the previous pass's output. A pass that fails with
    /// a non-fatal error is logged and skipped, keeping its input; a fatal
    /// error aborts the run.
    #[instrument(skip_all, fields(gates = gates.len()))]
    pub fn run(&self, gates: &[Gate], properties: &mut PropertySet) -> CompileResult<Vec<Gate>> {
        info!(
            "Running pass manager with {} passes on {} gates",
            self.passes.len(),
            gates.len()
        );

        let mut current = gates.to_vec();
        for pass in &self.passes {
            if !pass.should_run(&current, properties) {
                debug!("Skipping pass: {}", pass.name());
                continue;
            }

            debug!("Running pass: {}", pass.name());
            let mut report = PassReport {
                pass: pass.name().to_string(),
                gates_before: current.len(),
                gates_after: current.len(),
                depth_before: depth_of(&current),
                depth_after: depth_of(&current),
                skipped: None,
            };

            match pass.run(&current, properties) {
                Ok(out) => {
                    report.gates_after = out.len();
                    report.depth_after = depth_of(&out);
                    current = out;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Pass {} failed, keeping its input: {e}", pass.name());
                    report.skipped = Some(e.to_string());
                }
            }

            debug!(
                "Pass {} completed, gates: {}, depth: {}",
                pass.name(),
                report.gates_after,
                report.depth_after
            );
            properties.reports.push(report);
        }

        info!(
            "Pass manager completed, final depth: {}, gates: {}",
            depth_of(&current),
            current.len()
        );

        Ok(current)
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the pass sequence for a set of [`OptimizationOptions`].
///
/// Stage order is fixed: synthesis, noise-aware reduction, qubit mapping,
/// depth reduction. Disabled stages are left out.
pub struct PassManagerBuilder {
    options: OptimizationOptions,
    properties: PropertySet,
}

impl PassManagerBuilder {
    /// Create a builder with every stage off.
    pub fn new() -> Self {
        Self {
            options: OptimizationOptions::default(),
            properties: PropertySet::new(),
        }
    }

    /// Start from a full set of options.
    pub fn from_options(options: &OptimizationOptions) -> Self {
        Self::new().with_options(options.clone())
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: OptimizationOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the synthesis level (clamped to 0..=3).
    #[must_use]
    pub fn with_synthesis_level(mut self, level: u8) -> Self {
        self.options.synthesis_level = level.min(MAX_SYNTHESIS_LEVEL);
        self
    }

    /// Set the declared qubits of the circuit.
    #[must_use]
    pub fn with_qubits(mut self, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        self.properties.qubits = qubits.into_iter().collect();
        self
    }

    /// Set the target hardware.
    #[must_use]
    pub fn with_hardware(mut self, hardware: HardwareModel) -> Self {
        self.options.hardware_model = hardware;
        self
    }

    /// Build the pass manager and return it with the properties.
    pub fn build(self) -> (PassManager, PropertySet) {
        let options = self.options;
        let mut properties = self.properties;
        let mut pm = PassManager::new();

        if options.synthesis_level > 0 {
            pm.add_pass(GateSynthesis::new(options.synthesis_level.min(MAX_SYNTHESIS_LEVEL)));
        }
        if options.noise_aware {
            pm.add_pass(NoiseAwareCancellation);
        }
        if options.qubit_mapping {
            pm.add_pass(QubitMapping::new(options.preserve_layout));
        }
        if options.depth_reduction {
            pm.add_pass(DepthReduction::new(options.max_depth));
        }

        if !options.hardware_model.is_empty() {
            properties.hardware = Some(options.hardware_model);
        }

        (pm, properties)
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Output of [`optimize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// The optimized gates.
    pub gates: Vec<Gate>,
    /// Layout chosen by the mapper, when mapping ran and succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    /// One report per executed pass.
    pub reports: Vec<PassReport>,
    /// Rule counts from gate synthesis, when it ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<SynthesisStats>,
    /// Metrics of the input gates.
    pub metrics_before: CircuitMetrics,
    /// Metrics of the optimized gates.
    pub metrics_after: CircuitMetrics,
}

impl OptimizationResult {
    /// Rebuild a circuit from the optimized gates.
    ///
    /// With a layout, the declared qubits become the physical qubits used,
    /// keeping the logical qubits' names.
    pub fn to_circuit(&self, original: &Circuit) -> Circuit {
        let qubits = match &self.layout {
            Some(layout) => {
                let mut qubits: Vec<Qubit> = layout
                    .iter()
                    .map(|(logical, physical)| {
                        let name = original
                            .qubits
                            .iter()
                            .find(|q| q.id == logical)
                            .map_or_else(|| logical.to_string(), |q| q.name.clone());
                        Qubit::named(QubitId(physical), name)
                    })
                    .collect();
                qubits.sort_by_key(|q| q.id);
                qubits
            }
            None => original.qubits.clone(),
        };
        Circuit::from_parts(qubits, self.gates.clone())
    }

    /// Whether mapping was requested but the gates were left unmapped.
    pub fn mapping_failed(&self) -> bool {
        self.reports
            .iter()
            .any(|r| r.pass == "QubitMapping" && r.skipped.is_some())
    }
}

/// Metrics for a gate list, with a fidelity estimate when the hardware
/// model is non-empty.
pub fn analyze(num_qubits: usize, gates: &[Gate], hardware: &HardwareModel) -> CircuitMetrics {
    let mut metrics = CircuitMetrics::compute(num_qubits, gates);
    if !hardware.is_empty() {
        metrics.estimated_fidelity = Some(hardware.estimated_fidelity(gates));
    }
    metrics
}

/// Optimize a circuit.
///
/// Runs the stages enabled in `options` on a copy of the circuit's gates.
/// Identical input and options always give identical output. Fails only
/// on invalid options or a cyclic dependency graph.
#[instrument(skip_all, fields(qubits = circuit.num_qubits(), gates = circuit.gates().len()))]
pub fn optimize(
    circuit: &Circuit,
    options: &OptimizationOptions,
) -> CompileResult<OptimizationResult> {
    options.validate()?;

    let (pm, mut properties) = PassManagerBuilder::from_options(options)
        .with_qubits(circuit.qubit_ids())
        .build();
    let gates = pm.run(circuit.gates(), &mut properties)?;

    let width = properties
        .layout
        .as_ref()
        .map_or(circuit.num_qubits(), |l| l.len().max(circuit.num_qubits()));
    Ok(OptimizationResult {
        metrics_before: analyze(circuit.num_qubits(), circuit.gates(), &options.hardware_model),
        metrics_after: analyze(width, &gates, &options.hardware_model),
        gates,
        synthesis: properties.remove::<SynthesisStats>(),
        layout: properties.layout,
        reports: properties.reports,
    })
}

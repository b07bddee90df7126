//! Circuit simulation and result views.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use qflow_ir::{Circuit, Gate, QubitId};

use crate::error::{SimError, SimResult};
use crate::statevector::{Statevector, bitstring};

/// Default qubit ceiling: 2^24 amplitudes, 256 MiB of `Complex64`.
pub const DEFAULT_MAX_QUBITS: usize = 24;

/// Default display threshold for the filtered probability map.
pub const DEFAULT_PROBABILITY_THRESHOLD: f64 = 1e-3;

/// Simulator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatorConfig {
    /// Largest number of wires the simulator will allocate a state for.
    pub max_qubits: usize,
    /// Probabilities at or below this are left out of the filtered map.
    pub probability_threshold: f64,
    /// Fail on malformed gates instead of skipping them.
    pub strict: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_qubits: DEFAULT_MAX_QUBITS,
            probability_threshold: DEFAULT_PROBABILITY_THRESHOLD,
            strict: false,
        }
    }
}

/// Exact state-vector simulator.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    /// Create a simulator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a simulator with explicit settings.
    pub fn with_config(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// The settings in use.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Simulate a circuit.
    pub fn run(&self, circuit: &Circuit) -> SimResult<SimulationResult> {
        self.run_gates(&circuit.qubit_ids(), circuit.gates())
    }

    /// Simulate `gates` over the declared qubits.
    ///
    /// Wires are the declared qubits plus any qubit a gate references, in
    /// ascending id order. Gates run in ascending `position`, ties in list
    /// order. `measure` leaves the state alone. Gates with no amplitude rule
    /// or unresolvable operands are skipped with a warning, or rejected in
    /// strict mode.
    #[instrument(skip_all, fields(gates = gates.len()))]
    pub fn run_gates(&self, qubits: &[QubitId], gates: &[Gate]) -> SimResult<SimulationResult> {
        let mut wire_set: BTreeSet<QubitId> = qubits.iter().copied().collect();
        for gate in gates {
            wire_set.extend(gate.touched_qubits());
        }
        let wires: Vec<QubitId> = wire_set.into_iter().collect();

        let limit = self.config.max_qubits.min(usize::BITS as usize - 2);
        if wires.len() > limit {
            return Err(SimError::CapacityExceeded {
                required: wires.len(),
                max: limit,
            });
        }

        let start = Instant::now();
        debug!("Starting simulation: {} wires, {} gates", wires.len(), gates.len());

        let wire_of = |q: QubitId| wires.binary_search(&q).ok();

        let mut order: Vec<usize> = (0..gates.len()).collect();
        order.sort_by_key(|&i| gates[i].position);

        let mut sv = Statevector::new(wires.len());
        let mut skipped = 0;
        for i in order {
            let gate = &gates[i];
            let resolved = gate
                .operands()
                .filter(|_| gate.is_valid())
                .and_then(|ops| ops.into_iter().map(wire_of).collect::<Option<Vec<_>>>());

            let applied = resolved.is_some_and(|ws| sv.apply(&gate.kind, &ws));
            if !applied {
                if self.config.strict {
                    gate.validate()?;
                    return Err(SimError::Ir(qflow_ir::IrError::InvalidGate {
                        gate: Some(gate.id.clone()),
                        reason: format!("'{}' has no simulation rule", gate.name()),
                    }));
                }
                warn!("Skipping gate {} ('{}'): not simulable", gate.id, gate.name());
                skipped += 1;
            }
        }

        debug!("Simulation completed in {:?}", start.elapsed());

        Ok(SimulationResult {
            wires,
            amplitudes: sv.into_amplitudes(),
            threshold: self.config.probability_threshold,
            skipped_gates: skipped,
        })
    }
}

/// Final state of a simulation and the statistics derived from it.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Qubit on each wire, wire 0 first (leftmost bit).
    pub wires: Vec<QubitId>,
    /// Final amplitudes, big-endian over `wires`.
    pub amplitudes: Vec<Complex64>,
    /// Display threshold the simulator was configured with.
    pub threshold: f64,
    /// Gates that were not applied.
    pub skipped_gates: usize,
}

impl SimulationResult {
    /// Number of wires.
    pub fn num_qubits(&self) -> usize {
        self.wires.len()
    }

    fn bitstring(&self, index: usize) -> String {
        bitstring(index, self.wires.len())
    }

    /// `|amplitude|²` per basis state, unfiltered.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Sum of every probability; 1 up to rounding.
    pub fn total_probability(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    /// Bitstrings whose probability exceeds `threshold`.
    pub fn probability_map_with(&self, threshold: f64) -> BTreeMap<String, f64> {
        self.amplitudes
            .iter()
            .enumerate()
            .map(|(i, a)| (i, a.norm_sqr()))
            .filter(|&(_, p)| p > threshold)
            .map(|(i, p)| (self.bitstring(i), p))
            .collect()
    }

    /// Bitstrings whose probability exceeds the configured threshold.
    pub fn probability_map(&self) -> BTreeMap<String, f64> {
        self.probability_map_with(self.threshold)
    }

    /// Per-qubit `[P(0), P(1)]`.
    pub fn marginals(&self) -> BTreeMap<QubitId, [f64; 2]> {
        let n = self.wires.len();
        let mut out: BTreeMap<QubitId, [f64; 2]> =
            self.wires.iter().map(|&q| (q, [0.0, 0.0])).collect();
        for (i, amp) in self.amplitudes.iter().enumerate() {
            let p = amp.norm_sqr();
            for (w, q) in self.wires.iter().enumerate() {
                let bit = (i >> (n - 1 - w)) & 1;
                if let Some(entry) = out.get_mut(q) {
                    entry[bit] += p;
                }
            }
        }
        out
    }

    /// Amplitudes as `{bitstring: [re, im]}`, omitting exact zeros.
    pub fn amplitude_map(&self) -> BTreeMap<String, [f64; 2]> {
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.norm_sqr() > 0.0)
            .map(|(i, a)| (self.bitstring(i), [a.re, a.im]))
            .collect()
    }

    /// Draw `shots` measurement outcomes with a seeded generator.
    ///
    /// The same seed always yields the same histogram.
    pub fn sample_counts(&self, shots: u64, seed: u64) -> BTreeMap<String, u64> {
        let mut cumulative = Vec::with_capacity(self.amplitudes.len());
        let mut acc = 0.0;
        for amp in &self.amplitudes {
            acc += amp.norm_sqr();
            cumulative.push(acc);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut counts = BTreeMap::new();
        let last = self.amplitudes.len().saturating_sub(1);
        for _ in 0..shots {
            let r: f64 = rng.r#gen::<f64>() * acc;
            let outcome = cumulative.partition_point(|&c| c <= r).min(last);
            *counts.entry(self.bitstring(outcome)).or_insert(0) += 1;
        }
        counts
    }

    /// Serializable summary for callers outside Rust.
    pub fn report(&self, include_amplitudes: bool) -> SimulationReport {
        SimulationReport {
            qubits: self.wires.clone(),
            probabilities: self.probability_map(),
            marginals: self.marginals(),
            amplitudes: include_amplitudes.then(|| self.amplitude_map()),
            counts: None,
            skipped_gates: self.skipped_gates,
        }
    }
}

/// JSON-friendly view of a [`SimulationResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    /// Qubit on each bit position, leftmost first.
    pub qubits: Vec<QubitId>,
    /// Filtered probability map.
    pub probabilities: BTreeMap<String, f64>,
    /// Per-qubit `[P(0), P(1)]`.
    pub marginals: BTreeMap<QubitId, [f64; 2]>,
    /// `{bitstring: [re, im]}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitudes: Option<BTreeMap<String, [f64; 2]>>,
    /// Sampled histogram, when shots were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<BTreeMap<String, u64>>,
    /// Gates that were not applied.
    pub skipped_gates: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use qflow_ir::{GateKind, IrError};

    #[test]
    fn test_bell_probabilities() {
        let result = Simulator::new().run(&Circuit::bell().unwrap()).unwrap();
        let map = result.probability_map();
        assert_eq!(map.len(), 2);
        assert!((map["00"] - 0.5).abs() < 1e-12);
        assert!((map["11"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_capacity_checked_first() {
        let config = SimulatorConfig {
            max_qubits: 3,
            ..SimulatorConfig::default()
        };
        let circuit = Circuit::with_qubits(4);
        let err = Simulator::with_config(config).run(&circuit).unwrap_err();
        assert!(matches!(
            err,
            SimError::CapacityExceeded {
                required: 4,
                max: 3
            }
        ));
    }

    #[test]
    fn test_referenced_qubits_become_wires() {
        let gates = vec![Gate::single(GateKind::X, QubitId(7), 0)];
        let result = Simulator::new().run_gates(&[QubitId(2)], &gates).unwrap();
        assert_eq!(result.wires, vec![QubitId(2), QubitId(7)]);
        assert_eq!(result.probability_map().keys().next().unwrap(), "01");
    }

    #[test]
    fn test_position_order_not_list_order() {
        let gates = vec![
            Gate::single(GateKind::Rz { phi: Some(90.0) }, QubitId(0), 2),
            Gate::single(GateKind::H, QubitId(0), 3),
            Gate::single(GateKind::H, QubitId(0), 0),
        ];
        let result = Simulator::new().run_gates(&[QubitId(0)], &gates).unwrap();
        // H, RZ(90), H leaves equal weights; list order would give |0>.
        let map = result.probability_map();
        assert!((map["0"] - 0.5).abs() < 1e-12);
        assert!((map["1"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_measure_is_noop() {
        let mut circuit = Circuit::bell().unwrap();
        circuit.measure_all().unwrap();
        let result = Simulator::new().run(&circuit).unwrap();
        assert_eq!(result.probability_map().len(), 2);
        assert_eq!(result.skipped_gates, 0);
    }

    #[test]
    fn test_malformed_gate_skipped_or_rejected() {
        let gates = vec![
            Gate::new(GateKind::Cnot, QubitId(0)),
            Gate::single(GateKind::X, QubitId(0), 1),
        ];
        let lenient = Simulator::new().run_gates(&[QubitId(0)], &gates).unwrap();
        assert_eq!(lenient.skipped_gates, 1);
        assert_eq!(lenient.probability_map().keys().next().unwrap(), "1");

        let strict = Simulator::with_config(SimulatorConfig {
            strict: true,
            ..SimulatorConfig::default()
        });
        let err = strict.run_gates(&[QubitId(0)], &gates).unwrap_err();
        assert!(matches!(err, SimError::Ir(IrError::InvalidGate { .. })));
    }

    #[test]
    fn test_marginals() {
        let mut circuit = Circuit::with_qubits(2);
        circuit.x(QubitId(1)).unwrap();
        circuit.h(QubitId(0)).unwrap();
        let marginals = Simulator::new().run(&circuit).unwrap().marginals();
        assert!((marginals[&QubitId(0)][0] - 0.5).abs() < 1e-12);
        assert!((marginals[&QubitId(1)][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sampling_is_seeded() {
        let result = Simulator::new().run(&Circuit::bell().unwrap()).unwrap();
        let a = result.sample_counts(1000, 42);
        let b = result.sample_counts(1000, 42);
        assert_eq!(a, b);
        assert_eq!(a.values().sum::<u64>(), 1000);
        assert!(a.keys().all(|k| k == "00" || k == "11"));
    }

    #[test]
    fn test_empty_circuit() {
        let result = Simulator::new().run(&Circuit::new()).unwrap();
        assert_eq!(result.num_qubits(), 0);
        assert_eq!(result.probability_map().get(""), Some(&1.0));
    }

    #[test]
    fn test_report_serializes() {
        let result = Simulator::new().run(&Circuit::bell().unwrap()).unwrap();
        let value = serde_json::to_value(result.report(true)).unwrap();
        assert_eq!(value["qubits"], serde_json::json!([0, 1]));
        assert!(value["amplitudes"]["11"].is_array());
        assert!(value.get("counts").is_none());
    }
}

//! Static circuit metrics.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::circuit::depth_of;
use crate::gate::{Gate, GateKind};

/// Gate-level statistics of a circuit, as shown in the editor's metrics panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitMetrics {
    /// Timeline columns used (`max(position) + 1`).
    pub circuit_depth: u32,
    /// Number of qubits.
    pub circuit_width: usize,
    /// Gate count per type string.
    pub gate_count: BTreeMap<String, usize>,
    /// Number of T gates.
    pub t_count: usize,
    /// Number of distinct columns holding a T gate.
    pub t_depth: usize,
    /// Number of CNOT gates.
    pub cnot_count: usize,
    /// Non-measure gates touching one qubit.
    pub single_qubit_gates: usize,
    /// Non-measure gates touching two qubits.
    pub two_qubit_gates: usize,
    /// Non-measure gates touching three or more qubits.
    pub multi_qubit_gates: usize,
    /// Number of measurements.
    pub measurement_count: usize,
    /// Entangling gates over all non-measure gates.
    pub entanglement_ratio: f64,
    /// Number of distinct columns holding an entangling gate.
    pub entanglement_depth: usize,
    /// `2^min(width, depth)`, 0 for an empty circuit.
    pub quantum_volume: u64,
    /// Product of per-gate success probabilities, when a hardware model
    /// supplied error rates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_fidelity: Option<f64>,
}

impl CircuitMetrics {
    /// Compute metrics for `gates` on a circuit of `num_qubits` qubits.
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(num_qubits: usize, gates: &[Gate]) -> Self {
        let mut gate_count: BTreeMap<String, usize> = BTreeMap::new();
        let mut t_positions = BTreeSet::new();
        let mut entangling_positions = BTreeSet::new();
        let (mut single, mut two, mut multi) = (0, 0, 0);
        let mut cnot_count = 0;
        let mut measurement_count = 0;

        for gate in gates {
            *gate_count.entry(gate.name().to_string()).or_default() += 1;
            match gate.kind {
                GateKind::Cnot => cnot_count += 1,
                GateKind::T => {
                    t_positions.insert(gate.position);
                }
                GateKind::Measure => {
                    measurement_count += 1;
                    continue;
                }
                _ => {}
            }

            match gate.touched_qubits().len() {
                0 | 1 => single += 1,
                2 => {
                    two += 1;
                    entangling_positions.insert(gate.position);
                }
                _ => {
                    multi += 1;
                    entangling_positions.insert(gate.position);
                }
            }
        }

        let circuit_depth = depth_of(gates);
        let non_measure = (single + two + multi).max(1);
        let qv_qubits = num_qubits.min(circuit_depth as usize).min(63);

        Self {
            circuit_depth,
            circuit_width: num_qubits,
            t_count: gate_count.get("t").copied().unwrap_or(0),
            gate_count,
            t_depth: t_positions.len(),
            cnot_count,
            single_qubit_gates: single,
            two_qubit_gates: two,
            multi_qubit_gates: multi,
            measurement_count,
            entanglement_ratio: (two + multi) as f64 / non_measure as f64,
            entanglement_depth: entangling_positions.len(),
            quantum_volume: if qv_qubits > 0 { 1 << qv_qubits } else { 0 },
            estimated_fidelity: None,
        }
    }

    /// Total number of gates, measurements included.
    pub fn total_gates(&self) -> usize {
        self.gate_count.values().sum()
    }
}

//! Integration tests for rewrite safety across measurements and
//! multi-qubit gates, plus end-to-end pipeline scenarios on editor JSON.

use qflow_compile::passes::GateSynthesis;
use qflow_compile::{HardwareModel, OptimizationOptions, optimize};
use qflow_ir::{Circuit, GateKind, QubitId};

/// Helper: gate type names touching a qubit, in position order.
fn ops_on_qubit(gates: &[qflow_ir::Gate], qubit: QubitId) -> Vec<String> {
    let mut on: Vec<_> = gates.iter().filter(|g| g.touches(qubit)).collect();
    on.sort_by_key(|g| g.position);
    on.iter().map(|g| g.name().to_string()).collect()
}

fn load(json: &str) -> Circuit {
    serde_json::from_str(json).expect("valid circuit JSON")
}

// ============================================================================
// Measurements and entangling gates are barriers
// ============================================================================

#[test]
fn test_h_measure_h_not_optimized() {
    let mut circuit = Circuit::with_qubits(1);
    circuit.h(QubitId(0)).unwrap();
    circuit.measure(QubitId(0)).unwrap();
    circuit.h(QubitId(0)).unwrap();

    let out = GateSynthesis::new(3).synthesize(circuit.gates()).0;
    assert_eq!(ops_on_qubit(&out, QubitId(0)), vec!["h", "measure", "h"]);
}

#[test]
fn test_rotations_split_by_measure_do_not_merge() {
    let mut circuit = Circuit::with_qubits(1);
    circuit.rz(45.0, QubitId(0)).unwrap();
    circuit.measure(QubitId(0)).unwrap();
    circuit.rz(45.0, QubitId(0)).unwrap();

    let out = GateSynthesis::new(3).synthesize(circuit.gates()).0;
    assert_eq!(out.len(), 3);
}

#[test]
fn test_x_cnot_x_on_control_kept() {
    let mut circuit = Circuit::with_qubits(2);
    circuit.x(QubitId(0)).unwrap();
    circuit.cnot(QubitId(0), QubitId(1)).unwrap();
    circuit.x(QubitId(0)).unwrap();

    let options = OptimizationOptions::none().with_synthesis_level(3);
    let result = optimize(&circuit, &options).unwrap();
    assert_eq!(result.gates, circuit.gates);
}

#[test]
fn test_cancellation_on_other_wire_survives_cnot() {
    let mut circuit = Circuit::with_qubits(3);
    circuit.cnot(QubitId(0), QubitId(1)).unwrap();
    circuit.h(QubitId(2)).unwrap();
    circuit.h(QubitId(2)).unwrap();

    let options = OptimizationOptions::none().with_synthesis_level(1);
    let result = optimize(&circuit, &options).unwrap();
    assert_eq!(result.gates.len(), 1);
    assert_eq!(result.gates[0].kind, GateKind::Cnot);
}

// ============================================================================
// Editor JSON scenarios
// ============================================================================

#[test]
fn test_hadamard_pair_from_json() {
    let circuit = load(
        r#"{
            "qubits": [{"id": 0, "name": "q0"}],
            "gates": [
                {"id": "a", "type": "h", "qubit": 0, "position": 0},
                {"id": "b", "type": "h", "qubit": 0, "position": 1}
            ],
            "maxPosition": 2
        }"#,
    );
    let options = OptimizationOptions::none().with_synthesis_level(1);
    assert!(optimize(&circuit, &options).unwrap().gates.is_empty());
}

#[test]
fn test_rotation_merge_from_json() {
    let circuit = load(
        r#"{
            "qubits": [{"id": 0, "name": "q0"}],
            "gates": [
                {"id": "a", "type": "rx", "qubit": 0, "params": {"theta": 30}, "position": 0},
                {"id": "b", "type": "rx", "qubit": 0, "params": {"angle": 60}, "position": 1}
            ]
        }"#,
    );
    for level in 1..=3 {
        let options = OptimizationOptions::none().with_synthesis_level(level);
        let gates = optimize(&circuit, &options).unwrap().gates;
        assert_eq!(gates.len(), 1);
        assert_eq!(gates[0].kind, GateKind::Rx { theta: Some(90.0) });

        let wire = serde_json::to_value(&gates[0]).unwrap();
        assert_eq!(wire["params"]["theta"], 90.0);
    }
}

#[test]
fn test_malformed_gate_passes_through() {
    let circuit = load(
        r#"{
            "qubits": [{"id": 0}, {"id": 1}],
            "gates": [
                {"id": "bad", "type": "cnot", "qubit": 0, "position": 0},
                {"id": "r", "type": "ry", "qubit": 1, "params": {"phi": 10}, "position": 0},
                {"id": "r2", "type": "ry", "qubit": 1, "params": {"theta": 10}, "position": 1}
            ]
        }"#,
    );
    let options = OptimizationOptions::none()
        .with_synthesis_level(3)
        .with_depth_reduction(None);
    let result = optimize(&circuit, &options).unwrap();
    assert_eq!(result.gates.len(), 3);
    assert!(result.reports.iter().all(|r| r.skipped.is_none()));
}

#[test]
fn test_gate_in_last_column() {
    let circuit = load(
        r#"{
            "qubits": [{"id": 0}],
            "gates": [{"id": "edge", "type": "h", "qubit": 0, "position": 4294967295}]
        }"#,
    );

    let result = optimize(&circuit, &OptimizationOptions::none()).unwrap();
    assert_eq!(result.gates, circuit.gates);
    assert_eq!(result.metrics_before.circuit_depth, u32::MAX);

    let rescheduled = optimize(&circuit, &OptimizationOptions::none().with_depth_reduction(None))
        .unwrap();
    assert_eq!(rescheduled.gates[0].position, 0);
}

#[test]
fn test_full_pipeline_on_ring() {
    let mut circuit = Circuit::with_qubits(4);
    circuit.h(QubitId(0)).unwrap();
    for _ in 0..6 {
        circuit.cnot(QubitId(0), QubitId(3)).unwrap();
    }
    circuit.cnot(QubitId(1), QubitId(2)).unwrap();
    circuit.h(QubitId(0)).unwrap();

    let options = OptimizationOptions::none()
        .with_synthesis_level(2)
        .with_noise_aware(true)
        .with_mapping(HardwareModel::ring(4), false)
        .with_depth_reduction(None);
    let result = optimize(&circuit, &options).unwrap();

    // The reducer drops the six identical CNOTs. Synthesis already ran,
    // so the two Hs it leaves adjacent stay.
    assert_eq!(result.gates.len(), 3);
    assert_eq!(
        result
            .gates
            .iter()
            .filter(|g| matches!(g.kind, GateKind::Cnot))
            .count(),
        1
    );
    assert_eq!(result.reports.len(), 4);
    assert!(!result.mapping_failed());
    assert!(result.metrics_after.circuit_depth <= result.metrics_before.circuit_depth);
}

//! End-to-end simulation tests, including circuits coming out of the optimizer.

use proptest::prelude::*;
use qflow_ir::{Circuit, Gate, GateKind, QubitId};
use qflow_sim::{SimError, Simulator, SimulatorConfig};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_bell_from_json() {
    let circuit: Circuit = serde_json::from_str(
        r#"{
            "qubits": [{"id": 0, "name": "q0"}, {"id": 1, "name": "q1"}],
            "gates": [
                {"id": "h", "type": "h", "qubit": 0, "position": 0},
                {"id": "cx", "type": "cnot", "qubit": 0, "targets": [1], "position": 1}
            ]
        }"#,
    )
    .unwrap();

    let map = Simulator::new().run(&circuit).unwrap().probability_map();
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["00", "11"]);
    assert_close(map["00"], 0.5);
    assert_close(map["11"], 0.5);
}

#[test]
fn test_ghz_has_two_outcomes() {
    let result = Simulator::new().run(&Circuit::ghz(4).unwrap()).unwrap();
    let map = result.probability_map();
    assert_eq!(map.len(), 2);
    assert_close(map["0000"], 0.5);
    assert_close(map["1111"], 0.5);
}

#[test]
fn test_threshold_filters_small_outcomes() {
    // RY(4°) puts sin²(2°) ≈ 1.2e-3 on |1⟩, RY(2°) about 3e-4.
    let mut circuit = Circuit::with_qubits(2);
    circuit.ry(4.0, QubitId(0)).unwrap();
    circuit.ry(2.0, QubitId(1)).unwrap();
    let result = Simulator::new().run(&circuit).unwrap();

    let shown = result.probability_map();
    assert!(shown.contains_key("10"));
    assert!(!shown.contains_key("01"));
    assert_close(result.probabilities().iter().sum(), 1.0);
    assert_eq!(result.probability_map_with(0.0).len(), 4);
}

#[test]
fn test_capacity_error_before_allocation() {
    // 40 wires would need 2^40 amplitudes; the check must fire first.
    let circuit = Circuit::with_qubits(40);
    let err = Simulator::new().run(&circuit).unwrap_err();
    assert!(matches!(err, SimError::CapacityExceeded { required: 40, .. }));
}

#[test]
fn test_mapped_physical_qubits_are_wires() {
    // A mapper may move a 2-qubit circuit onto physical qubits 3 and 5.
    let gates = vec![
        Gate::single(GateKind::H, QubitId(3), 0),
        Gate::controlled(GateKind::Cnot, QubitId(3), QubitId(5), 1),
    ];
    let result = Simulator::new().run_gates(&[], &gates).unwrap();
    assert_eq!(result.wires, vec![QubitId(3), QubitId(5)]);
    let map = result.probability_map();
    assert_close(map["00"], 0.5);
    assert_close(map["11"], 0.5);
}

#[test]
fn test_custom_gate_skipped() {
    let mut circuit = Circuit::with_qubits(1);
    circuit.push(Gate::single(
        GateKind::from_wire("mystery", &Default::default()),
        QubitId(0),
        0,
    ));
    circuit.x(QubitId(0)).unwrap();

    let result = Simulator::new().run(&circuit).unwrap();
    assert_eq!(result.skipped_gates, 1);
    assert_close(result.probability_map()["1"], 1.0);

    let strict = Simulator::with_config(SimulatorConfig {
        strict: true,
        ..SimulatorConfig::default()
    });
    assert!(strict.run(&circuit).is_err());
}

#[test]
fn test_sampling_tracks_distribution() {
    let mut circuit = Circuit::with_qubits(1);
    circuit.ry(120.0, QubitId(0)).unwrap();
    let result = Simulator::new().run(&circuit).unwrap();

    // P(1) = sin²(60°) = 0.75
    let counts = result.sample_counts(10_000, 7);
    let ones = counts.get("1").copied().unwrap_or(0) as f64 / 10_000.0;
    assert!((ones - 0.75).abs() < 0.03, "sampled P(1) = {ones}");
    assert_eq!(counts, result.sample_counts(10_000, 7));
}

#[derive(Debug, Clone)]
enum Op {
    H(u32),
    X(u32),
    S(u32),
    T(u32),
    Rotation(u8, u32, i32),
    Cnot(u32, u32),
    Cz(u32, u32),
    Swap(u32, u32),
    Measure(u32),
}

fn arb_pair(n: u32) -> impl Strategy<Value = (u32, u32)> {
    (0..n, 0..n).prop_filter("distinct qubits", |(a, b)| a != b)
}

fn arb_op(n: u32) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..n).prop_map(Op::H),
        (0..n).prop_map(Op::X),
        (0..n).prop_map(Op::S),
        (0..n).prop_map(Op::T),
        (0_u8..4, 0..n, -720_i32..720).prop_map(|(k, q, a)| Op::Rotation(k, q, a)),
        arb_pair(n).prop_map(|(c, t)| Op::Cnot(c, t)),
        arb_pair(n).prop_map(|(c, t)| Op::Cz(c, t)),
        arb_pair(n).prop_map(|(a, b)| Op::Swap(a, b)),
        (0..n).prop_map(Op::Measure),
    ]
}

fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (2_u32..=6).prop_flat_map(|n| {
        prop::collection::vec(arb_op(n), 0..=40).prop_map(move |ops| {
            let mut c = Circuit::with_qubits(n);
            for op in ops {
                let _ = match op {
                    Op::H(q) => c.h(QubitId(q)),
                    Op::X(q) => c.x(QubitId(q)),
                    Op::S(q) => c.s(QubitId(q)),
                    Op::T(q) => c.t(QubitId(q)),
                    Op::Rotation(0, q, a) => c.rx(f64::from(a), QubitId(q)),
                    Op::Rotation(1, q, a) => c.ry(f64::from(a), QubitId(q)),
                    Op::Rotation(2, q, a) => c.rz(f64::from(a), QubitId(q)),
                    Op::Rotation(_, q, a) => c.p(f64::from(a), QubitId(q)),
                    Op::Cnot(a, b) => c.cnot(QubitId(a), QubitId(b)),
                    Op::Cz(a, b) => c.cz(QubitId(a), QubitId(b)),
                    Op::Swap(a, b) => c.swap(QubitId(a), QubitId(b)),
                    Op::Measure(q) => c.measure(QubitId(q)),
                };
            }
            c
        })
    })
}

proptest! {
    /// Unitary evolution keeps total probability at 1.
    #[test]
    fn test_probability_conserved(circuit in arb_circuit()) {
        let result = Simulator::new().run(&circuit).unwrap();
        prop_assert!((result.total_probability() - 1.0).abs() < 1e-9);
        prop_assert_eq!(result.skipped_gates, 0);
    }

    /// Each qubit's marginals sum to 1.
    #[test]
    fn test_marginals_sum_to_one(circuit in arb_circuit()) {
        let result = Simulator::new().run(&circuit).unwrap();
        for [p0, p1] in result.marginals().into_values() {
            prop_assert!((p0 + p1 - 1.0).abs() < 1e-9);
        }
    }
}

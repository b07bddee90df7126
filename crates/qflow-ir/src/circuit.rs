//! High-level circuit model and builder API.

use serde::{Deserialize, Serialize};

use crate::dag::DependencyGraph;
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateId, GateKind};
use crate::qubit::{Qubit, QubitId};

/// A quantum circuit: declared qubits plus gates placed on a timeline.
///
/// `max_position` is a display hint kept for the editor; it is not an
/// invariant. Stages may produce gates past it, so callers recompute it
/// with [`Circuit::recompute_max_position`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circuit {
    /// Declared qubits.
    pub qubits: Vec<Qubit>,
    /// Gates in editor order.
    #[serde(default)]
    pub gates: Vec<Gate>,
    /// Number of timeline columns shown by the editor.
    #[serde(default)]
    pub max_position: u32,
    /// Counter for generating gate ids.
    #[serde(skip)]
    next_gate_id: u64,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new() -> Self {
        Self {
            qubits: vec![],
            gates: vec![],
            max_position: 0,
            next_gate_id: 0,
        }
    }

    /// Create a circuit with `num_qubits` qubits `q0..q{n-1}`.
    pub fn with_qubits(num_qubits: u32) -> Self {
        let mut circuit = Self::new();
        for _ in 0..num_qubits {
            circuit.add_qubit();
        }
        circuit
    }

    /// Create a circuit from declared qubits and an existing gate list.
    pub fn from_parts(qubits: Vec<Qubit>, gates: Vec<Gate>) -> Self {
        let mut circuit = Self {
            qubits,
            gates,
            max_position: 0,
            next_gate_id: 0,
        };
        circuit.recompute_max_position();
        circuit
    }

    /// Declare a new qubit with the next free id.
    pub fn add_qubit(&mut self) -> QubitId {
        let id = self
            .qubits
            .iter()
            .map(|q| q.id.0 + 1)
            .max()
            .map_or(QubitId(0), QubitId);
        self.qubits.push(Qubit::new(id));
        id
    }

    /// Number of declared qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Declared qubit ids in declaration order.
    pub fn qubit_ids(&self) -> Vec<QubitId> {
        self.qubits.iter().map(|q| q.id).collect()
    }

    /// The gates.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Look up a gate by id.
    pub fn gate(&self, id: &GateId) -> Option<&Gate> {
        self.gates.iter().find(|g| &g.id == id)
    }

    /// Number of timeline columns used: `max(position) + 1`, or 0.
    pub fn depth(&self) -> u32 {
        depth_of(&self.gates)
    }

    /// Refresh `max_position` from the gates and return it.
    pub fn recompute_max_position(&mut self) -> u32 {
        self.max_position = self.depth();
        self.max_position
    }

    /// Replace the gate list, refreshing `max_position`.
    #[must_use]
    pub fn with_gates(mut self, gates: Vec<Gate>) -> Self {
        self.gates = gates;
        self.recompute_max_position();
        self
    }

    /// Check that every gate references declared qubits only.
    pub fn check_qubits(&self) -> IrResult<()> {
        for gate in &self.gates {
            for q in gate.touched_qubits() {
                if !self.qubits.iter().any(|d| d.id == q) {
                    return Err(IrError::QubitNotFound {
                        qubit: q,
                        gate: Some(gate.id.clone()),
                    });
                }
            }
        }
        Ok(())
    }

    /// Build the gate dependency graph.
    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::build(&self.gates)
    }

    /// Add a gate, assigning it the next sequential id.
    pub fn push(&mut self, gate: Gate) -> GateId {
        let id = self.next_id();
        let gate = gate.with_id(id.clone());
        self.max_position = self.max_position.max(gate.position.saturating_add(1));
        self.gates.push(gate);
        id
    }

    fn next_id(&mut self) -> GateId {
        // Imported ids may already use the `g<n>` scheme.
        loop {
            let id = GateId::sequential(self.next_gate_id);
            self.next_gate_id += 1;
            if !self.gates.iter().any(|g| g.id == id) {
                return id;
            }
        }
    }

    /// Earliest column after the last gate touching any of `qubits`.
    fn next_free_position(&self, qubits: &[QubitId]) -> u32 {
        self.gates
            .iter()
            .filter(|g| qubits.iter().any(|&q| g.touches(q)))
            .map(|g| g.position.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// Append a gate at the next free column of the qubits it touches.
    pub fn append(&mut self, gate: Gate) -> IrResult<&mut Self> {
        for q in gate.touched_qubits() {
            if !self.qubits.iter().any(|d| d.id == q) {
                return Err(IrError::QubitNotFound {
                    qubit: q,
                    gate: None,
                });
            }
        }
        let position = self.next_free_position(&gate.touched_qubits());
        self.push(gate.at(position));
        Ok(self)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::X, qubit))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::Y, qubit))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::Z, qubit))
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::S, qubit))
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::T, qubit))
    }

    /// Apply RX rotation (degrees).
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::Rx { theta: Some(theta) }, qubit))
    }

    /// Apply RY rotation (degrees).
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::Ry { theta: Some(theta) }, qubit))
    }

    /// Apply RZ rotation (degrees).
    pub fn rz(&mut self, phi: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::Rz { phi: Some(phi) }, qubit))
    }

    /// Apply phase gate (degrees).
    pub fn p(&mut self, phi: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::P { phi: Some(phi) }, qubit))
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT.
    pub fn cnot(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::Cnot, control).with_targets([target]))
    }

    /// Apply CZ.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::Cz, control).with_targets([target]))
    }

    /// Apply SWAP.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::Swap, q1).with_targets([q2]))
    }

    /// Apply Toffoli.
    pub fn toffoli(
        &mut self,
        control1: QubitId,
        control2: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.append(
            Gate::new(GateKind::Toffoli, control1)
                .with_controls([control1, control2])
                .with_targets([target]),
        )
    }

    /// Measure a qubit.
    pub fn measure(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Gate::new(GateKind::Measure, qubit))
    }

    /// Measure every declared qubit.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        for q in self.qubit_ids() {
            self.measure(q)?;
        }
        Ok(self)
    }

    // =========================================================================
    // Common circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_qubits(2);
        circuit.h(QubitId(0))?.cnot(QubitId(0), QubitId(1))?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_qubits(n);
        if n > 0 {
            circuit.h(QubitId(0))?;
        }
        for i in 1..n {
            circuit.cnot(QubitId(0), QubitId(i))?;
        }
        Ok(circuit)
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of timeline columns a gate list occupies: `max(position) + 1`.
pub fn depth_of(gates: &[Gate]) -> u32 {
    gates.iter().map(|g| g.position.saturating_add(1)).max().unwrap_or(0)
}

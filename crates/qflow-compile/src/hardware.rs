//! Target hardware description.
//!
//! A [`HardwareModel`] defines which pairs of physical qubits can interact
//! with two-qubit gates, plus per-qubit and per-pair error rates used by
//! the noise-aware stages and fidelity estimates. Models are plain
//! configuration values: they are built by the named constructors or
//! deserialized by the caller, and never mutated by the pipeline.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use qflow_ir::{Gate, GateKind};

/// Physical connectivity and error rates of a target device.
///
/// `connectivity` is an undirected adjacency list; an edge listed in only
/// one direction still counts in both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareModel {
    /// Device name.
    #[serde(default)]
    pub name: String,
    /// Physical qubit → neighbouring physical qubits.
    #[serde(default)]
    pub connectivity: BTreeMap<u32, Vec<u32>>,
    /// Physical qubit → single-qubit gate error rate.
    #[serde(default)]
    pub single_qubit_error: BTreeMap<u32, f64>,
    /// `"i-j"` → two-qubit gate error rate.
    #[serde(default)]
    pub two_qubit_error: BTreeMap<String, f64>,
}

impl HardwareModel {
    /// Create an empty model with no qubits.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an undirected edge; duplicates in either direction are ignored.
    pub fn add_edge(&mut self, q1: u32, q2: u32) {
        if q1 == q2 || self.is_connected(q1, q2) {
            return;
        }
        self.connectivity.entry(q1).or_default().push(q2);
        self.connectivity.entry(q2).or_default().push(q1);
    }

    /// Builder form of [`HardwareModel::add_edge`].
    #[must_use]
    pub fn with_edge(mut self, q1: u32, q2: u32) -> Self {
        self.add_edge(q1, q2);
        self
    }

    /// Set a uniform single-qubit error on every physical qubit and a
    /// uniform two-qubit error on every edge.
    #[must_use]
    pub fn with_uniform_errors(mut self, single: f64, two: f64) -> Self {
        for q in self.physical_qubits() {
            self.single_qubit_error.insert(q, single);
        }
        for (a, b) in self.edges() {
            self.two_qubit_error.insert(pair_key(a, b), two);
        }
        self
    }

    /// Linear chain `0-1-2-…-(n-1)`.
    pub fn linear(n: u32) -> Self {
        let mut model = Self::new(format!("linear{n}"));
        for i in 0..n {
            model.connectivity.entry(i).or_default();
        }
        for i in 0..n.saturating_sub(1) {
            model.add_edge(i, i + 1);
        }
        model
    }

    /// Ring of `n` qubits.
    pub fn ring(n: u32) -> Self {
        let mut model = Self::linear(n);
        model.name = format!("ring{n}");
        if n > 2 {
            model.add_edge(n - 1, 0);
        }
        model
    }

    /// `rows × cols` nearest-neighbour grid, numbered row-major.
    pub fn grid(rows: u32, cols: u32) -> Self {
        let mut model = Self::new(format!("grid{rows}x{cols}"));
        for r in 0..rows {
            for c in 0..cols {
                let q = r * cols + c;
                model.connectivity.entry(q).or_default();
                if c + 1 < cols {
                    model.add_edge(q, q + 1);
                }
                if r + 1 < rows {
                    model.add_edge(q, q + cols);
                }
            }
        }
        model
    }

    /// Every pair of `n` qubits connected.
    pub fn fully_connected(n: u32) -> Self {
        let mut model = Self::new(format!("full{n}"));
        for i in 0..n {
            model.connectivity.entry(i).or_default();
            for j in (i + 1)..n {
                model.add_edge(i, j);
            }
        }
        model
    }

    /// Look up a named preset: `linear<N>`, `ring<N>`, `grid<R>x<C>`, `full<N>`.
    pub fn preset(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if let Some(n) = name.strip_prefix("linear") {
            return n.parse().ok().map(Self::linear);
        }
        if let Some(n) = name.strip_prefix("ring") {
            return n.parse().ok().map(Self::ring);
        }
        if let Some(n) = name.strip_prefix("full") {
            return n.parse().ok().map(Self::fully_connected);
        }
        if let Some(dims) = name.strip_prefix("grid") {
            let (r, c) = dims.split_once('x')?;
            return Some(Self::grid(r.parse().ok()?, c.parse().ok()?));
        }
        None
    }

    /// Whether the model describes any qubits at all.
    pub fn is_empty(&self) -> bool {
        self.connectivity.is_empty()
    }

    /// Whether `q1` and `q2` share an edge (either listing direction).
    pub fn is_connected(&self, q1: u32, q2: u32) -> bool {
        let listed = |a: u32, b: u32| self.connectivity.get(&a).is_some_and(|n| n.contains(&b));
        listed(q1, q2) || listed(q2, q1)
    }

    /// Neighbours of a physical qubit, ascending, including edges listed
    /// only from the other end.
    pub fn neighbors(&self, qubit: u32) -> Vec<u32> {
        let mut out: BTreeSet<u32> = self
            .connectivity
            .get(&qubit)
            .into_iter()
            .flatten()
            .copied()
            .collect();
        for (&q, adjacent) in &self.connectivity {
            if adjacent.contains(&qubit) {
                out.insert(q);
            }
        }
        out.remove(&qubit);
        out.into_iter().collect()
    }

    /// Every physical qubit named anywhere in the connectivity, ascending.
    pub fn physical_qubits(&self) -> Vec<u32> {
        let mut qubits: BTreeSet<u32> = self.connectivity.keys().copied().collect();
        qubits.extend(self.connectivity.values().flatten().copied());
        qubits.into_iter().collect()
    }

    /// Number of physical qubits.
    pub fn num_qubits(&self) -> usize {
        self.physical_qubits().len()
    }

    /// Undirected edges `(a, b)` with `a < b`, ascending.
    pub fn edges(&self) -> Vec<(u32, u32)> {
        let mut edges = BTreeSet::new();
        for (&a, adjacent) in &self.connectivity {
            for &b in adjacent {
                if a != b {
                    edges.insert((a.min(b), a.max(b)));
                }
            }
        }
        edges.into_iter().collect()
    }

    /// Two-qubit error for a pair, accepting either key orientation.
    pub fn pair_error(&self, q1: u32, q2: u32) -> Option<f64> {
        self.two_qubit_error
            .get(&pair_key(q1, q2))
            .or_else(|| self.two_qubit_error.get(&pair_key(q2, q1)))
            .copied()
    }

    /// Error rate the model assigns to one gate; missing entries count as 0.
    ///
    /// Multi-qubit gates use the error of each consecutive operand pair.
    pub fn gate_error(&self, gate: &Gate) -> f64 {
        if matches!(gate.kind, GateKind::Measure) {
            return 0.0;
        }
        let Some(operands) = gate.operands() else {
            return 0.0;
        };
        match operands.as_slice() {
            [q] => self.single_qubit_error.get(&q.0).copied().unwrap_or(0.0),
            many => {
                let success: f64 = many
                    .windows(2)
                    .map(|w| 1.0 - self.pair_error(w[0].0, w[1].0).unwrap_or(0.0))
                    .product();
                1.0 - success
            }
        }
    }

    /// Product of per-gate success probabilities.
    pub fn estimated_fidelity(&self, gates: &[Gate]) -> f64 {
        gates
            .iter()
            .map(|g| (1.0 - self.gate_error(g)).clamp(0.0, 1.0))
            .product()
    }
}

/// Key of the two-qubit error table.
pub fn pair_key(q1: u32, q2: u32) -> String {
    format!("{q1}-{q2}")
}

//! Gate dependency graph.
//!
//! Two gates depend on each other when they share a qubit in any role
//! (`qubit`, `targets` or `controls`). The earlier gate, ordered by
//! `(position, index in the gate list)`, must execute before the later one.
//! [`DependencyGraph::build`] gives every such pair an edge, so the graph
//! also carries the transitive edges between gates on the same wire.
//! [`DependencyGraph::build_wire_chains`] keeps only the edge from the
//! previous gate on each wire; both graphs have the same reachability.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateId};
use crate::qubit::QubitId;

/// Node index type for the dependency graph.
pub type NodeIndex = PetNodeIndex<u32>;

/// DFS colour used by [`DependencyGraph::topological_order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// "Must execute before" relation over the gates of a circuit.
///
/// Node `i` corresponds to `gates[i]` of the list the graph was built from,
/// so duplicate gate ids do not collapse nodes.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Edges point from a gate to the gates that depend on it.
    graph: DiGraph<GateId, (), u32>,
}

impl DependencyGraph {
    /// Create a graph with one node per gate and no edges.
    pub fn with_nodes(gates: &[Gate]) -> Self {
        let mut graph = DiGraph::with_capacity(gates.len(), 0);
        for gate in gates {
            graph.add_node(gate.id.clone());
        }
        Self { graph }
    }

    /// Build the dependency graph of a gate list.
    ///
    /// For every pair `(g1, g2)` with `g1` ordered before `g2` by
    /// `(position, list index)`, records `g2 depends-on g1` when their
    /// touched qubit sets intersect. Pure function of `gates`.
    pub fn build(gates: &[Gate]) -> Self {
        let mut dag = Self::with_nodes(gates);

        let mut order: Vec<usize> = (0..gates.len()).collect();
        order.sort_by_key(|&i| (gates[i].position, i));

        let touched: Vec<FxHashSet<QubitId>> = gates
            .iter()
            .map(|g| g.touched_qubits().into_iter().collect())
            .collect();

        for (k, &later) in order.iter().enumerate() {
            for &earlier in &order[..k] {
                if !touched[earlier].is_disjoint(&touched[later]) {
                    dag.graph.add_edge(
                        NodeIndex::new(earlier),
                        NodeIndex::new(later),
                        (),
                    );
                }
            }
        }

        dag
    }

    /// Build the reduced dependency graph of a gate list.
    ///
    /// Each gate depends only on the previous gate, in `(position, list
    /// index)` order, on each qubit it touches. Linear in the number of
    /// gates; admits exactly the topological orders of [`Self::build`].
    pub fn build_wire_chains(gates: &[Gate]) -> Self {
        let mut dag = Self::with_nodes(gates);

        let mut order: Vec<usize> = (0..gates.len()).collect();
        order.sort_by_key(|&i| (gates[i].position, i));

        let mut last_on_wire: FxHashMap<QubitId, usize> = FxHashMap::default();
        for later in order {
            let mut preds: Vec<usize> = Vec::new();
            for q in gates[later].touched_qubits() {
                if let Some(earlier) = last_on_wire.insert(q, later) {
                    if !preds.contains(&earlier) {
                        preds.push(earlier);
                    }
                }
            }
            for earlier in preds {
                dag.graph
                    .add_edge(NodeIndex::new(earlier), NodeIndex::new(later), ());
            }
        }

        dag
    }

    /// Record that gate `after` depends on gate `before` (by list index).
    ///
    /// Does not check for cycles; [`DependencyGraph::topological_order`] does.
    pub fn add_dependency(&mut self, before: usize, after: usize) -> IrResult<()> {
        let n = self.graph.node_count();
        if before >= n {
            return Err(IrError::UnknownGate(GateId::new(format!("#{before}"))));
        }
        if after >= n {
            return Err(IrError::UnknownGate(GateId::new(format!("#{after}"))));
        }
        self.graph
            .update_edge(NodeIndex::new(before), NodeIndex::new(after), ());
        Ok(())
    }

    /// Number of gates.
    pub fn num_gates(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges.
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Access the underlying graph.
    pub fn graph(&self) -> &DiGraph<GateId, (), u32> {
        &self.graph
    }

    /// Id of the gate at list index `index`.
    pub fn gate_id(&self, index: usize) -> Option<&GateId> {
        self.graph.node_weight(NodeIndex::new(index))
    }

    /// List indices of the gates that must run before gate `index`.
    pub fn predecessors(&self, index: usize) -> Vec<usize> {
        self.neighbors(index, Direction::Incoming)
    }

    /// List indices of the gates that must run after gate `index`.
    pub fn successors(&self, index: usize) -> Vec<usize> {
        self.neighbors(index, Direction::Outgoing)
    }

    fn neighbors(&self, index: usize, dir: Direction) -> Vec<usize> {
        if index >= self.graph.node_count() {
            return vec![];
        }
        let mut out: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(index), dir)
            .map(NodeIndex::index)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Adjacency map `gate id → ids of gates it must execute before`.
    ///
    /// Every gate appears as a key, including gates without successors.
    pub fn adjacency(&self) -> FxHashMap<GateId, FxHashSet<GateId>> {
        let mut map: FxHashMap<GateId, FxHashSet<GateId>> = FxHashMap::default();
        for node in self.graph.node_indices() {
            let entry = map.entry(self.graph[node].clone()).or_default();
            for succ in self.graph.neighbors_directed(node, Direction::Outgoing) {
                entry.insert(self.graph[succ].clone());
            }
        }
        map
    }

    /// Order the gates so every gate comes after its dependencies.
    ///
    /// Iterative depth-first search with white/gray/black marking; the
    /// explicit stack keeps large circuits off the call stack. Reaching a
    /// gray node means the graph has a cycle, reported as
    /// [`IrError::CycleDetected`]. Roots and successors are visited in
    /// ascending list index, so the result is deterministic.
    pub fn topological_order(&self) -> IrResult<Vec<usize>> {
        let n = self.graph.node_count();
        let successors: Vec<Vec<usize>> = (0..n).map(|i| self.successors(i)).collect();

        let mut marks = vec![Mark::White; n];
        let mut postorder = Vec::with_capacity(n);
        // (node, index of the next successor to visit)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..n {
            if marks[root] != Mark::White {
                continue;
            }
            marks[root] = Mark::Gray;
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let (node, next) = *frame;
                if let Some(&succ) = successors[node].get(next) {
                    frame.1 += 1;
                    match marks[succ] {
                        Mark::White => {
                            marks[succ] = Mark::Gray;
                            stack.push((succ, 0));
                        }
                        Mark::Gray => {
                            return Err(IrError::CycleDetected {
                                gate: self.graph[NodeIndex::new(succ)].clone(),
                            });
                        }
                        Mark::Black => {}
                    }
                } else {
                    marks[node] = Mark::Black;
                    postorder.push(node);
                    stack.pop();
                }
            }
        }

        postorder.reverse();
        Ok(postorder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateKind;

    fn h(q: u32, pos: u32) -> Gate {
        Gate::single(GateKind::H, QubitId(q), pos)
    }

    fn cnot(c: u32, t: u32, pos: u32) -> Gate {
        Gate::controlled(GateKind::Cnot, QubitId(c), QubitId(t), pos)
    }

    #[test]
    fn test_shared_qubit_creates_dependency() {
        let gates = vec![h(0, 0), cnot(0, 1, 1), h(1, 0)];
        let dag = DependencyGraph::build(&gates);

        assert_eq!(dag.predecessors(1), vec![0, 2]);
        assert_eq!(dag.successors(0), vec![1]);
        assert!(dag.predecessors(0).is_empty());
        assert_eq!(dag.num_edges(), 2);
    }

    #[test]
    fn test_controls_count_as_touched() {
        let gates = vec![
            h(2, 0),
            Gate::new(GateKind::Toffoli, QubitId(0))
                .with_controls([QubitId(0), QubitId(2)])
                .with_targets([QubitId(1)])
                .at(1),
        ];
        let dag = DependencyGraph::build(&gates);
        assert_eq!(dag.successors(0), vec![1]);
    }

    #[test]
    fn test_equal_positions_tie_break_by_list_order() {
        let gates = vec![h(0, 3), Gate::single(GateKind::X, QubitId(0), 3)];
        let dag = DependencyGraph::build(&gates);
        assert_eq!(dag.successors(0), vec![1]);
        assert!(dag.successors(1).is_empty());
    }

    #[test]
    fn test_wire_chains_keep_only_previous_gate() {
        let gates: Vec<_> = (0..50).map(|p| h(0, p)).collect();
        assert_eq!(DependencyGraph::build(&gates).num_edges(), 50 * 49 / 2);

        let chains = DependencyGraph::build_wire_chains(&gates);
        assert_eq!(chains.num_edges(), 49);
        assert_eq!(chains.predecessors(10), vec![9]);
        assert_eq!(chains.topological_order().unwrap(), (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_wire_chains_single_edge_for_shared_pair() {
        // Both qubits of the second CNOT were last touched by the first.
        let gates = vec![cnot(0, 1, 0), cnot(1, 0, 1), h(2, 0), cnot(2, 1, 2)];
        let chains = DependencyGraph::build_wire_chains(&gates);
        assert_eq!(chains.successors(0), vec![1]);
        assert_eq!(chains.predecessors(3), vec![1, 2]);
        assert_eq!(chains.num_edges(), 3);
    }

    #[test]
    fn test_adjacency_map() {
        let gates = vec![h(0, 0).with_id("a"), cnot(0, 1, 1).with_id("b"), h(1, 2).with_id("c")];
        let adjacency = DependencyGraph::build(&gates).adjacency();

        assert_eq!(adjacency.len(), 3);
        assert!(adjacency[&GateId::from("a")].contains(&GateId::from("b")));
        assert!(adjacency[&GateId::from("b")].contains(&GateId::from("c")));
        assert!(adjacency[&GateId::from("c")].is_empty());
    }

    #[test]
    fn test_topological_order_respects_dependencies() {
        // List order is the reverse of timeline order.
        let gates = vec![h(0, 2), cnot(0, 1, 1), h(1, 0)];
        let dag = DependencyGraph::build(&gates);
        let order = dag.topological_order().unwrap();

        let rank = |i: usize| order.iter().position(|&x| x == i).unwrap();
        assert!(rank(2) < rank(1));
        assert!(rank(1) < rank(0));
    }

    #[test]
    fn test_cycle_is_reported() {
        let gates = vec![h(0, 0).with_id("a"), h(0, 1).with_id("b")];
        let mut dag = DependencyGraph::build(&gates);
        dag.add_dependency(1, 0).unwrap();

        let err = dag.topological_order().unwrap_err();
        assert!(matches!(err, IrError::CycleDetected { .. }));
    }

    #[test]
    fn test_add_dependency_rejects_unknown_index() {
        let mut dag = DependencyGraph::build(&[h(0, 0)]);
        assert!(matches!(
            dag.add_dependency(0, 4),
            Err(IrError::UnknownGate(_))
        ));
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let gates: Vec<_> = (0..20_000).map(|p| h(0, p)).collect();
        let mut dag = DependencyGraph::with_nodes(&gates);
        for i in 1..gates.len() {
            dag.add_dependency(i - 1, i).unwrap();
        }
        let order = dag.topological_order().unwrap();
        assert_eq!(order.first(), Some(&0));
        assert_eq!(order.last(), Some(&19_999));
    }
}

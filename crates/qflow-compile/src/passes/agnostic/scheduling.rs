//! ASAP depth reduction.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use qflow_ir::{DependencyGraph, Gate, QubitId, depth_of};

use crate::error::CompileResult;
use crate::pass::Pass;
use crate::property::PropertySet;

/// Re-times every gate to the earliest column its dependencies allow.
///
/// Gates are visited in topological order of the dependency graph; each
/// lands at `max(last_free[q])` over the qubits it touches. With a
/// `max_depth`, a schedule still deeper than the bound is squeezed by
/// `floor(position * max_depth / depth)`, which can put dependent gates
/// in the same column.
pub struct DepthReduction {
    max_depth: Option<u32>,
}

impl DepthReduction {
    /// Create the pass with an optional depth bound.
    pub fn new(max_depth: Option<u32>) -> Self {
        Self { max_depth }
    }

    /// ASAP positions, indexed like `gates`.
    ///
    /// Fails with [`qflow_ir::IrError::CycleDetected`] when the dependency
    /// graph is cyclic.
    pub fn asap_positions(gates: &[Gate]) -> CompileResult<Vec<u32>> {
        let order = DependencyGraph::build_wire_chains(gates).topological_order()?;

        let mut last_free: FxHashMap<QubitId, u32> = FxHashMap::default();
        let mut positions = vec![0; gates.len()];
        for idx in order {
            let touched = gates[idx].touched_qubits();
            let slot = touched
                .iter()
                .map(|q| last_free.get(q).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            positions[idx] = slot;
            for q in touched {
                last_free.insert(q, slot + 1);
            }
        }
        Ok(positions)
    }

    /// Run the scheduler on a gate list.
    pub fn reschedule(&self, gates: &[Gate]) -> CompileResult<Vec<Gate>> {
        let input_depth = depth_of(gates);
        let positions = Self::asap_positions(gates)?;
        let mut out: Vec<Gate> = gates
            .iter()
            .zip(&positions)
            .map(|(gate, &pos)| gate.moved_to(pos))
            .collect();

        let depth = depth_of(&out);
        if depth > input_depth {
            // Only possible when the input stacked conflicting gates in one column.
            warn!(
                "ASAP schedule depth {depth} exceeds input depth {input_depth}; keeping input timing"
            );
            out = gates.to_vec();
        }

        if let Some(max_depth) = self.max_depth {
            let depth = depth_of(&out);
            if max_depth > 0 && depth > max_depth {
                debug!("Compressing depth {depth} to {max_depth}");
                for gate in &mut out {
                    let scaled = u64::from(gate.position) * u64::from(max_depth) / u64::from(depth);
                    gate.position = u32::try_from(scaled).unwrap_or(max_depth - 1);
                }
            }
        }

        Ok(out)
    }
}

impl Pass for DepthReduction {
    fn name(&self) -> &'static str {
        "DepthReduction"
    }

    fn run(&self, gates: &[Gate], _properties: &mut PropertySet) -> CompileResult<Vec<Gate>> {
        let out = self.reschedule(gates)?;
        debug!(
            "DepthReduction: depth {} -> {}",
            depth_of(gates),
            depth_of(&out)
        );
        Ok(out)
    }
}

//! Noise-aware CNOT reduction.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use tracing::debug;

use qflow_ir::{Gate, GateKind, QubitId};

use crate::error::CompileResult;
use crate::pass::Pass;
use crate::property::PropertySet;

/// CNOT count at or below which the reducer does nothing.
pub const CNOT_THRESHOLD: usize = 5;

/// Removes back-to-back CNOT pairs, the highest-error gates in the set.
///
/// CNOTs are grouped by `(control, target)` and ordered by
/// `(position, list index)`. Two neighbours in a group cancel when no other
/// gate touches either qubit between them. Circuits with at most
/// [`CNOT_THRESHOLD`] CNOTs are returned unchanged.
pub struct NoiseAwareCancellation;

impl NoiseAwareCancellation {
    fn cnot_operands(gate: &Gate) -> Option<(QubitId, QubitId)> {
        if !matches!(gate.kind, GateKind::Cnot) || !gate.is_valid() {
            return None;
        }
        match gate.operands()?.as_slice() {
            [c, t] => Some((*c, *t)),
            _ => None,
        }
    }

    /// Number of well-formed CNOTs.
    pub fn cnot_count(gates: &[Gate]) -> usize {
        gates
            .iter()
            .filter(|g| Self::cnot_operands(g).is_some())
            .count()
    }

    /// List indices of the gates to drop.
    fn cancelled(gates: &[Gate]) -> FxHashSet<usize> {
        let mut order: Vec<usize> = (0..gates.len()).collect();
        order.sort_by_key(|&i| (gates[i].position, i));

        let mut groups: BTreeMap<(QubitId, QubitId), Vec<usize>> = BTreeMap::new();
        for &i in &order {
            if let Some(pair) = Self::cnot_operands(&gates[i]) {
                groups.entry(pair).or_default().push(i);
            }
        }

        let mut rank = vec![0usize; gates.len()];
        for (r, &i) in order.iter().enumerate() {
            rank[i] = r;
        }

        let mut removed = FxHashSet::default();
        for ((control, target), group) in groups {
            let mut k = 0;
            while k + 1 < group.len() {
                let (a, b) = (group[k], group[k + 1]);
                let blocked = order[rank[a] + 1..rank[b]].iter().any(|&i| {
                    !removed.contains(&i) && (gates[i].touches(control) || gates[i].touches(target))
                });
                if blocked {
                    k += 1;
                } else {
                    removed.insert(a);
                    removed.insert(b);
                    k += 2;
                }
            }
        }
        removed
    }
}

impl Pass for NoiseAwareCancellation {
    fn name(&self) -> &'static str {
        "NoiseAwareCancellation"
    }

    fn run(&self, gates: &[Gate], properties: &mut PropertySet) -> CompileResult<Vec<Gate>> {
        if Self::cnot_count(gates) <= CNOT_THRESHOLD {
            return Ok(gates.to_vec());
        }

        let removed = Self::cancelled(gates);
        let out: Vec<Gate> = gates
            .iter()
            .enumerate()
            .filter(|(i, _)| !removed.contains(i))
            .map(|(_, g)| g.clone())
            .collect();

        match &properties.hardware {
            Some(hw) if !hw.is_empty() => debug!(
                "NoiseAwareCancellation: removed {} CNOTs, fidelity {:.4} -> {:.4}",
                removed.len(),
                hw.estimated_fidelity(gates),
                hw.estimated_fidelity(&out)
            ),
            _ => debug!("NoiseAwareCancellation: removed {} CNOTs", removed.len()),
        }
        Ok(out)
    }

    fn should_run(&self, gates: &[Gate], _properties: &PropertySet) -> bool {
        Self::cnot_count(gates) > CNOT_THRESHOLD
    }
}

//! Greedy hardware qubit mapping.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use qflow_ir::{Gate, QubitId};

use crate::error::{CompileError, CompileResult};
use crate::hardware::HardwareModel;
use crate::pass::Pass;
use crate::property::{Layout, PropertySet};

/// Places logical qubits on the hardware connectivity graph.
///
/// Interacting logical pairs are weighted by how many multi-qubit gates
/// use them and placed heaviest first:
/// - one endpoint placed: the other takes the lowest free neighbour of
///   its physical qubit;
/// - neither placed: both take the lowest free connected physical pair.
///
/// Qubits still unplaced afterwards take the lowest free physical qubits.
/// This is a bounded greedy heuristic; it does not insert SWAPs, so some
/// gates may still act on unconnected pairs.
///
/// When not every logical qubit can be placed, the pass fails with
/// [`CompileError::MappingIncomplete`] and the pass manager keeps the
/// unmapped gates.
pub struct QubitMapping {
    preserve_layout: bool,
}

impl QubitMapping {
    /// Create the pass.
    pub fn new(preserve_layout: bool) -> Self {
        Self { preserve_layout }
    }

    /// Every logical qubit the mapping must place: declared qubits plus
    /// any qubit a gate references.
    fn logical_qubits(gates: &[Gate], declared: &[QubitId]) -> Vec<QubitId> {
        let mut qubits: BTreeSet<QubitId> = declared.iter().copied().collect();
        for gate in gates {
            qubits.extend(gate.touched_qubits());
        }
        qubits.into_iter().collect()
    }

    /// Logical interaction pairs `(a, b)`, `a < b`, with their gate counts.
    pub fn interaction_weights(gates: &[Gate]) -> BTreeMap<(QubitId, QubitId), usize> {
        let mut weights = BTreeMap::new();
        for gate in gates {
            let Some(operands) = gate.operands() else {
                continue;
            };
            for (i, &a) in operands.iter().enumerate() {
                for &b in &operands[i + 1..] {
                    *weights.entry((a.min(b), a.max(b))).or_insert(0) += 1;
                }
            }
        }
        weights
    }

    /// Whether the identity layout already satisfies every interaction.
    pub fn identity_fits(
        gates: &[Gate],
        declared: &[QubitId],
        hardware: &HardwareModel,
    ) -> bool {
        let physical: BTreeSet<u32> = hardware.physical_qubits().into_iter().collect();
        Self::logical_qubits(gates, declared)
            .iter()
            .all(|q| physical.contains(&q.0))
            && Self::interaction_weights(gates)
                .keys()
                .all(|(a, b)| hardware.is_connected(a.0, b.0))
    }

    /// Compute a layout for the gates on the hardware.
    pub fn compute_layout(
        gates: &[Gate],
        declared: &[QubitId],
        hardware: &HardwareModel,
    ) -> CompileResult<Layout> {
        let logical = Self::logical_qubits(gates, declared);
        let physical = hardware.physical_qubits();
        let edges = hardware.edges();
        let mut layout = Layout::new();

        let mut pairs: Vec<((QubitId, QubitId), usize)> =
            Self::interaction_weights(gates).into_iter().collect();
        pairs.sort_by(|(pa, wa), (pb, wb)| wb.cmp(wa).then(pa.cmp(pb)));

        for ((a, b), weight) in pairs {
            match (layout.get_physical(a), layout.get_physical(b)) {
                (Some(_), Some(_)) => {}
                (Some(pa), None) => place_near(&mut layout, hardware, pa, b),
                (None, Some(pb)) => place_near(&mut layout, hardware, pb, a),
                (None, None) => {
                    if let Some(&(p1, p2)) = edges
                        .iter()
                        .find(|(p1, p2)| !layout.is_used(*p1) && !layout.is_used(*p2))
                    {
                        layout.add(a, p1);
                        layout.add(b, p2);
                    }
                }
            }
            debug!("pair ({a}, {b}) weight {weight}: {:?}", layout.get_physical(a));
        }

        let free: Vec<u32> = physical
            .iter()
            .copied()
            .filter(|&p| !layout.is_used(p))
            .collect();
        let mut free = free.into_iter();
        for &q in &logical {
            if layout.is_mapped(q) {
                continue;
            }
            match free.next() {
                Some(p) => layout.add(q, p),
                None => break,
            }
        }

        let unplaced: Vec<QubitId> = logical
            .iter()
            .copied()
            .filter(|&q| !layout.is_mapped(q))
            .collect();
        if !unplaced.is_empty() {
            return Err(CompileError::MappingIncomplete {
                hardware: hardware.name.clone(),
                required: logical.len(),
                available: physical.len(),
                unplaced,
            });
        }

        Ok(layout)
    }
}

/// Put `logical` on the lowest free neighbour of `anchor`, if any.
fn place_near(layout: &mut Layout, hardware: &HardwareModel, anchor: u32, logical: QubitId) {
    if let Some(p) = hardware
        .neighbors(anchor)
        .into_iter()
        .find(|&p| !layout.is_used(p))
    {
        layout.add(logical, p);
    }
}

impl Pass for QubitMapping {
    fn name(&self) -> &'static str {
        "QubitMapping"
    }

    fn run(&self, gates: &[Gate], properties: &mut PropertySet) -> CompileResult<Vec<Gate>> {
        let hardware = match &properties.hardware {
            Some(hw) if !hw.is_empty() => hw,
            Some(hw) => return Err(CompileError::MissingHardwareModel(hw.name.clone())),
            None => return Err(CompileError::MissingHardwareModel(String::new())),
        };

        if self.preserve_layout && Self::identity_fits(gates, &properties.qubits, hardware) {
            info!("Identity layout fits '{}'; gates left as-is", hardware.name);
            let layout = Layout::identity(Self::logical_qubits(gates, &properties.qubits));
            properties.layout = Some(layout);
            return Ok(gates.to_vec());
        }

        let layout = Self::compute_layout(gates, &properties.qubits, hardware)?;
        info!(
            "Mapped {} logical qubits onto '{}'",
            layout.len(),
            hardware.name
        );

        let mapped = gates
            .iter()
            .map(|gate| {
                gate.remapped(|q| layout.get_physical(q).map_or(q, QubitId))
            })
            .collect();
        properties.layout = Some(layout);
        Ok(mapped)
    }
}

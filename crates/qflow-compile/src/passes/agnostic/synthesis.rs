//! Peephole gate synthesis.
//!
//! Rewrites short runs of single-qubit gates on one wire:
//!
//! | Pattern | Result |
//! |---------|--------|
//! | `H·H`, `X·X`, `Y·Y`, `Z·Z` | removed |
//! | `RX(a)·RX(b)` (also RY, RZ) | `RX(a+b mod 360)`, removed when 0 |
//! | `H·X·H` | `Z` |
//! | `H·Z·H` | `X` |
//!
//! A wire's timeline holds every gate that touches the qubit in any role,
//! ordered by `(position, list index)`. Multi-qubit gates, measurements and
//! malformed gates sit on the timeline but never match, so a rule only
//! fires across gates with nothing else on the wire between them. This
//! keeps a rule from reaching across a CNOT that entangled the qubit.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use qflow_ir::{Gate, GateKind, QubitId, normalize_angle};

use crate::error::CompileResult;
use crate::pass::Pass;
use crate::property::PropertySet;

/// Counts of rules applied by one [`GateSynthesis`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisStats {
    /// Rewrite passes executed.
    pub passes: u8,
    /// Self-inverse pairs removed.
    pub cancellations: usize,
    /// Rotation pairs merged (including merges that vanished).
    pub merges: usize,
    /// `H·X·H` / `H·Z·H` windows collapsed.
    pub identities: usize,
}

impl SynthesisStats {
    fn fired(&self) -> usize {
        self.cancellations + self.merges + self.identities
    }
}

/// What a matched window turns into.
enum Rewrite {
    /// Drop every gate in the window.
    Remove,
    /// Replace the first gate's kind, drop the rest.
    Replace(GateKind),
}

/// Gate rewrite engine.
///
/// Runs up to `level` passes and stops early once a pass changes nothing.
/// Level 0 leaves the gates untouched.
pub struct GateSynthesis {
    level: u8,
}

impl GateSynthesis {
    /// Create the pass with a synthesis level.
    pub fn new(level: u8) -> Self {
        Self { level }
    }

    /// Run the engine, returning the rewritten gates and rule counts.
    pub fn synthesize(&self, gates: &[Gate]) -> (Vec<Gate>, SynthesisStats) {
        let mut current = gates.to_vec();
        let mut stats = SynthesisStats::default();

        for _ in 0..self.level {
            let before = stats.fired();
            current = rewrite_once(&current, &mut stats);
            stats.passes += 1;
            if stats.fired() == before {
                break;
            }
        }

        (current, stats)
    }
}

impl Pass for GateSynthesis {
    fn name(&self) -> &'static str {
        "GateSynthesis"
    }

    fn run(&self, gates: &[Gate], properties: &mut PropertySet) -> CompileResult<Vec<Gate>> {
        let (out, stats) = self.synthesize(gates);
        debug!(
            "GateSynthesis: {} passes, {} cancelled, {} merged, {} identities",
            stats.passes, stats.cancellations, stats.merges, stats.identities
        );
        properties.insert(stats);
        Ok(out)
    }

    fn should_run(&self, _gates: &[Gate], _properties: &PropertySet) -> bool {
        self.level > 0
    }
}

/// A gate the rules may consume: a well-formed single-qubit unitary.
fn matchable(gate: &Gate) -> bool {
    gate.kind.num_qubits() == Some(1)
        && !matches!(gate.kind, GateKind::Measure)
        && gate.targets.is_empty()
        && gate.controls.is_empty()
        && gate.is_valid()
}

fn match_pair(a: &GateKind, b: &GateKind) -> Option<Rewrite> {
    if a.is_self_inverse() && a == b {
        return Some(Rewrite::Remove);
    }
    if a.is_rotation() && a.same_type(b) {
        let sum = normalize_angle(a.angle()? + b.angle()?);
        return Some(if sum == 0.0 {
            Rewrite::Remove
        } else {
            Rewrite::Replace(a.with_angle(sum)?)
        });
    }
    None
}

fn match_triple(a: &GateKind, b: &GateKind, c: &GateKind) -> Option<Rewrite> {
    match (a, b, c) {
        (GateKind::H, GateKind::X, GateKind::H) => Some(Rewrite::Replace(GateKind::Z)),
        (GateKind::H, GateKind::Z, GateKind::H) => Some(Rewrite::Replace(GateKind::X)),
        _ => None,
    }
}

/// One left-to-right scan over every wire.
fn rewrite_once(gates: &[Gate], stats: &mut SynthesisStats) -> Vec<Gate> {
    let mut timelines: FxHashMap<QubitId, Vec<usize>> = FxHashMap::default();
    for (i, gate) in gates.iter().enumerate() {
        for q in gate.touched_qubits() {
            timelines.entry(q).or_default().push(i);
        }
    }
    let mut wires: Vec<QubitId> = timelines.keys().copied().collect();
    wires.sort_unstable();

    let mut removed: FxHashSet<usize> = FxHashSet::default();
    let mut replaced: FxHashMap<usize, GateKind> = FxHashMap::default();

    for q in wires {
        let Some(timeline) = timelines.get_mut(&q) else {
            continue;
        };
        timeline.sort_by_key(|&i| (gates[i].position, i));

        let mut i = 0;
        while i < timeline.len() {
            let window: Vec<usize> = timeline[i..].iter().take(3).copied().collect();
            let ok = |k: usize| window.get(k).is_some_and(|&g| matchable(&gates[g]));

            if ok(0) && ok(1) {
                let (a, b) = (&gates[window[0]].kind, &gates[window[1]].kind);
                if let Some(rewrite) = match_pair(a, b) {
                    if a.is_self_inverse() {
                        stats.cancellations += 1;
                    } else {
                        stats.merges += 1;
                    }
                    apply(rewrite, &window[..2], &mut removed, &mut replaced);
                    i += 2;
                    continue;
                }
                if ok(2) {
                    let c = &gates[window[2]].kind;
                    if let Some(rewrite) = match_triple(a, b, c) {
                        stats.identities += 1;
                        apply(rewrite, &window, &mut removed, &mut replaced);
                        i += 3;
                        continue;
                    }
                }
            }
            i += 1;
        }
    }

    gates
        .iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .map(|(i, gate)| match replaced.remove(&i) {
            Some(kind) => Gate { kind, ..gate.clone() },
            None => gate.clone(),
        })
        .collect()
}

fn apply(
    rewrite: Rewrite,
    window: &[usize],
    removed: &mut FxHashSet<usize>,
    replaced: &mut FxHashMap<usize, GateKind>,
) {
    match rewrite {
        Rewrite::Remove => removed.extend(window.iter().copied()),
        Rewrite::Replace(kind) => {
            // The surviving gate keeps the leftmost gate's id and position.
            replaced.insert(window[0], kind);
            removed.extend(window[1..].iter().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(kind: GateKind, q: u32, pos: u32) -> Gate {
        Gate::single(kind, QubitId(q), pos)
    }

    fn rx(theta: f64, pos: u32) -> Gate {
        g(GateKind::Rx { theta: Some(theta) }, 0, pos)
    }

    fn run(level: u8, gates: &[Gate]) -> Vec<Gate> {
        GateSynthesis::new(level).synthesize(gates).0
    }

    #[test]
    fn test_hadamard_pair_cancels() {
        let gates = vec![g(GateKind::H, 0, 0), g(GateKind::H, 0, 1)];
        assert!(run(1, &gates).is_empty());
    }

    #[test]
    fn test_rotation_merge() {
        let gates = vec![rx(30.0, 0).with_id("a"), rx(60.0, 1).with_id("b")];
        let out = run(1, &gates);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, GateKind::Rx { theta: Some(90.0) });
        assert_eq!(out[0].id.as_str(), "a");
        assert_eq!(out[0].position, 0);
    }

    #[test]
    fn test_rotation_merge_to_zero_drops_gate() {
        let gates = vec![
            g(GateKind::Rz { phi: Some(200.0) }, 0, 0),
            g(GateKind::Rz { phi: Some(160.0) }, 0, 1),
        ];
        assert!(run(1, &gates).is_empty());
    }

    #[test]
    fn test_rotation_merge_wraps() {
        let gates = vec![
            g(GateKind::Ry { theta: Some(300.0) }, 0, 0),
            g(GateKind::Ry { theta: Some(90.0) }, 0, 1),
        ];
        assert_eq!(run(1, &gates)[0].kind, GateKind::Ry { theta: Some(30.0) });
    }

    #[test]
    fn test_different_rotation_axes_do_not_merge() {
        let gates = vec![rx(30.0, 0), g(GateKind::Ry { theta: Some(30.0) }, 0, 1)];
        assert_eq!(run(3, &gates), gates);
    }

    #[test]
    fn test_hxh_becomes_z() {
        let gates = vec![
            g(GateKind::H, 0, 0).with_id("h1"),
            g(GateKind::X, 0, 1),
            g(GateKind::H, 0, 2),
        ];
        let out = run(1, &gates);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, GateKind::Z);
        assert_eq!(out[0].id.as_str(), "h1");
    }

    #[test]
    fn test_hzh_becomes_x() {
        let gates = vec![g(GateKind::H, 1, 0), g(GateKind::Z, 1, 1), g(GateKind::H, 1, 2)];
        assert_eq!(run(1, &gates)[0].kind, GateKind::X);
    }

    #[test]
    fn test_no_overlapping_matches_in_one_pass() {
        // X X X: first pair cancels, third survives.
        let gates = vec![g(GateKind::X, 0, 0), g(GateKind::X, 0, 1), g(GateKind::X, 0, 2)];
        let out = run(3, &gates);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].position, 2);
    }

    #[test]
    fn test_level_bounds_iterations() {
        // X H H X needs two passes to vanish.
        let gates = vec![
            g(GateKind::X, 0, 0),
            g(GateKind::H, 0, 1),
            g(GateKind::H, 0, 2),
            g(GateKind::X, 0, 3),
        ];
        assert_eq!(run(1, &gates).len(), 2);
        assert!(run(2, &gates).is_empty());

        let (_, stats) = GateSynthesis::new(3).synthesize(&gates);
        assert_eq!(stats.passes, 3);
        assert_eq!(stats.cancellations, 2);
    }

    #[test]
    fn test_level_zero_is_identity() {
        let gates = vec![g(GateKind::H, 0, 0), g(GateKind::H, 0, 1)];
        assert_eq!(run(0, &gates), gates);
    }

    #[test]
    fn test_cnot_blocks_cancellation() {
        let gates = vec![
            g(GateKind::H, 1, 0),
            Gate::controlled(GateKind::Cnot, QubitId(0), QubitId(1), 1),
            g(GateKind::H, 1, 2),
        ];
        assert_eq!(run(3, &gates), gates);
    }

    #[test]
    fn test_gate_on_other_qubit_does_not_block() {
        let gates = vec![g(GateKind::X, 0, 0), g(GateKind::Y, 1, 1), g(GateKind::X, 0, 2)];
        let out = run(1, &gates);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, GateKind::Y);
    }

    #[test]
    fn test_malformed_rotation_is_skipped() {
        let gates = vec![g(GateKind::Rx { theta: None }, 0, 0), rx(60.0, 1)];
        assert_eq!(run(3, &gates), gates);
    }

    #[test]
    fn test_input_is_not_modified() {
        let gates = vec![g(GateKind::Z, 0, 0), g(GateKind::Z, 0, 1)];
        let snapshot = gates.clone();
        let _ = run(1, &gates);
        assert_eq!(gates, snapshot);
    }

    #[test]
    fn test_order_follows_position_not_list() {
        let gates = vec![g(GateKind::H, 0, 2), g(GateKind::X, 0, 1), g(GateKind::H, 0, 0)];
        // Timeline is H(2) X(1) H(0) -> H X H at positions 0,1,2.
        let out = run(1, &gates);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, GateKind::Z);
        assert_eq!(out[0].position, 0);
    }
}

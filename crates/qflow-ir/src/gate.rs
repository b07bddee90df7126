//! Quantum gate types and their editor wire format.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::qubit::QubitId;

/// Degrees in a full turn. Gate angles are expressed in degrees.
pub const FULL_TURN: f64 = 360.0;

/// Tolerance for angle comparisons, in degrees.
pub const ANGLE_EPSILON: f64 = 1e-9;

/// Reduce an angle into `[0, 360)`, snapping values within
/// [`ANGLE_EPSILON`] of a full turn to zero.
pub fn normalize_angle(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(FULL_TURN);
    if wrapped < ANGLE_EPSILON || FULL_TURN - wrapped < ANGLE_EPSILON {
        0.0
    } else {
        wrapped
    }
}

/// Identifier of a gate.
///
/// Ids are deterministic: assigned from a per-circuit counter, derived from
/// gate content when an import omits them, or inherited from the leftmost
/// gate a rewrite replaced.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GateId(String);

impl GateId {
    /// Create a gate id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Content-derived id: `<type>@<qubit>:<position>`.
    pub fn derived(type_name: &str, qubit: QubitId, position: u32) -> Self {
        Self(format!("{type_name}@{}:{position}", qubit.0))
    }

    /// Id for the `n`-th gate created by a circuit builder.
    pub fn sequential(n: u64) -> Self {
        Self(format!("g{n}"))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GateId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for GateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Gate kinds with typed parameters.
///
/// Angles are in degrees. `None` records a gate whose angle entry was
/// missing from the imported parameter map; such gates are malformed and
/// every stage treats them as inert.
#[derive(Debug, Clone, PartialEq)]
pub enum GateKind {
    // Single-qubit Clifford+T gates
    /// Hadamard gate.
    H,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// S gate (sqrt(Z)).
    S,
    /// T gate (fourth root of Z).
    T,

    // Single-qubit rotations
    /// Rotation around X.
    Rx {
        /// Rotation angle.
        theta: Option<f64>,
    },
    /// Rotation around Y.
    Ry {
        /// Rotation angle.
        theta: Option<f64>,
    },
    /// Rotation around Z.
    Rz {
        /// Rotation angle.
        phi: Option<f64>,
    },
    /// Phase gate.
    P {
        /// Phase angle.
        phi: Option<f64>,
    },

    // Multi-qubit gates
    /// Controlled-NOT.
    Cnot,
    /// Controlled-Z.
    Cz,
    /// SWAP.
    Swap,
    /// Toffoli (CCX).
    Toffoli,

    /// Measurement in the computational basis.
    Measure,

    /// A gate type this engine has no semantics for, kept for round-trips.
    Custom {
        /// The type string as received.
        name: String,
        /// Numeric parameters as received.
        params: BTreeMap<String, f64>,
    },
}

impl GateKind {
    /// The wire type string of this gate.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            GateKind::H => "h",
            GateKind::X => "x",
            GateKind::Y => "y",
            GateKind::Z => "z",
            GateKind::S => "s",
            GateKind::T => "t",
            GateKind::Rx { .. } => "rx",
            GateKind::Ry { .. } => "ry",
            GateKind::Rz { .. } => "rz",
            GateKind::P { .. } => "p",
            GateKind::Cnot => "cnot",
            GateKind::Cz => "cz",
            GateKind::Swap => "swap",
            GateKind::Toffoli => "toffoli",
            GateKind::Measure => "measure",
            GateKind::Custom { name, .. } => name,
        }
    }

    /// Number of qubits the gate acts on, `None` for custom gates.
    #[inline]
    pub fn num_qubits(&self) -> Option<usize> {
        match self {
            GateKind::H
            | GateKind::X
            | GateKind::Y
            | GateKind::Z
            | GateKind::S
            | GateKind::T
            | GateKind::Rx { .. }
            | GateKind::Ry { .. }
            | GateKind::Rz { .. }
            | GateKind::P { .. }
            | GateKind::Measure => Some(1),
            GateKind::Cnot | GateKind::Cz | GateKind::Swap => Some(2),
            GateKind::Toffoli => Some(3),
            GateKind::Custom { .. } => None,
        }
    }

    /// Whether the gate is its own inverse (H, X, Y, Z).
    pub fn is_self_inverse(&self) -> bool {
        matches!(self, GateKind::H | GateKind::X | GateKind::Y | GateKind::Z)
    }

    /// Whether the gate is an axis rotation (RX, RY, RZ).
    pub fn is_rotation(&self) -> bool {
        matches!(
            self,
            GateKind::Rx { .. } | GateKind::Ry { .. } | GateKind::Rz { .. }
        )
    }

    /// The angle of a rotation or phase gate, if present.
    pub fn angle(&self) -> Option<f64> {
        match self {
            GateKind::Rx { theta } | GateKind::Ry { theta } => *theta,
            GateKind::Rz { phi } | GateKind::P { phi } => *phi,
            _ => None,
        }
    }

    /// Same rotation/phase kind carrying a different angle.
    pub fn with_angle(&self, angle: f64) -> Option<GateKind> {
        match self {
            GateKind::Rx { .. } => Some(GateKind::Rx { theta: Some(angle) }),
            GateKind::Ry { .. } => Some(GateKind::Ry { theta: Some(angle) }),
            GateKind::Rz { .. } => Some(GateKind::Rz { phi: Some(angle) }),
            GateKind::P { .. } => Some(GateKind::P { phi: Some(angle) }),
            _ => None,
        }
    }

    /// Whether this kind and `other` are the same gate type, ignoring angles.
    pub fn same_type(&self, other: &GateKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
            && self.name() == other.name()
    }

    /// Canonical wire parameters (`rx`/`ry` → `theta`, `rz`/`p` → `phi`).
    pub fn params(&self) -> BTreeMap<String, f64> {
        let mut params = BTreeMap::new();
        match self {
            GateKind::Rx { theta: Some(t) } | GateKind::Ry { theta: Some(t) } => {
                params.insert("theta".to_string(), *t);
            }
            GateKind::Rz { phi: Some(p) } | GateKind::P { phi: Some(p) } => {
                params.insert("phi".to_string(), *p);
            }
            GateKind::Custom { params: custom, .. } => params.clone_from(custom),
            _ => {}
        }
        params
    }

    /// Decode a wire type string and parameter map.
    ///
    /// Accepts the `cx`/`ccx` type aliases and the `angle`/`lambda`
    /// parameter aliases. Unknown types become [`GateKind::Custom`].
    pub fn from_wire(type_name: &str, params: &BTreeMap<String, f64>) -> GateKind {
        let lookup = |names: &[&str]| names.iter().find_map(|n| params.get(*n).copied());
        match type_name.to_ascii_lowercase().as_str() {
            "h" => GateKind::H,
            "x" => GateKind::X,
            "y" => GateKind::Y,
            "z" => GateKind::Z,
            "s" => GateKind::S,
            "t" => GateKind::T,
            "rx" => GateKind::Rx {
                theta: lookup(&["theta", "angle"]),
            },
            "ry" => GateKind::Ry {
                theta: lookup(&["theta", "angle"]),
            },
            "rz" => GateKind::Rz {
                phi: lookup(&["phi", "lambda", "angle"]),
            },
            "p" => GateKind::P {
                phi: lookup(&["phi", "lambda", "angle"]),
            },
            "cnot" | "cx" => GateKind::Cnot,
            "cz" => GateKind::Cz,
            "swap" => GateKind::Swap,
            "toffoli" | "ccx" => GateKind::Toffoli,
            "measure" => GateKind::Measure,
            _ => GateKind::Custom {
                name: type_name.to_string(),
                params: params.clone(),
            },
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.angle() {
            Some(angle) => write!(f, "{}({angle})", self.name()),
            None => f.write_str(self.name()),
        }
    }
}

/// A gate placed on the circuit timeline.
///
/// `qubit` is the primary operand; `targets` and `controls` carry the
/// remaining operands of multi-qubit gates (see [`Gate::operands`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireGate", into = "WireGate")]
pub struct Gate {
    /// Identifier, unique within a circuit.
    pub id: GateId,
    /// The gate kind with its typed parameters.
    pub kind: GateKind,
    /// Primary qubit.
    pub qubit: QubitId,
    /// Target qubits of multi-qubit gates.
    pub targets: Vec<QubitId>,
    /// Control qubits of multi-qubit gates.
    pub controls: Vec<QubitId>,
    /// Timeline column.
    pub position: u32,
}

impl Gate {
    /// Create a gate at position 0 with a content-derived id.
    pub fn new(kind: GateKind, qubit: QubitId) -> Self {
        let id = GateId::derived(kind.name(), qubit, 0);
        Self {
            id,
            kind,
            qubit,
            targets: vec![],
            controls: vec![],
            position: 0,
        }
    }

    /// Create a single-qubit gate at a position.
    pub fn single(kind: GateKind, qubit: QubitId, position: u32) -> Self {
        Self::new(kind, qubit).at(position)
    }

    /// Create a controlled two-qubit gate (`qubit` = control, `targets` = [target]).
    pub fn controlled(kind: GateKind, control: QubitId, target: QubitId, position: u32) -> Self {
        Self::new(kind, control).with_targets([target]).at(position)
    }

    /// Set the target qubits.
    #[must_use]
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = QubitId>) -> Self {
        self.targets = targets.into_iter().collect();
        self
    }

    /// Set the control qubits.
    #[must_use]
    pub fn with_controls(mut self, controls: impl IntoIterator<Item = QubitId>) -> Self {
        self.controls = controls.into_iter().collect();
        self
    }

    /// Move the gate to a position, re-deriving its id.
    ///
    /// Call [`Gate::with_id`] afterwards to keep an explicit id.
    #[must_use]
    pub fn at(mut self, position: u32) -> Self {
        self.position = position;
        self.id = GateId::derived(self.kind.name(), self.qubit, position);
        self
    }

    /// Set an explicit id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<GateId>) -> Self {
        self.id = id.into();
        self
    }

    /// A copy of this gate at another position, keeping its id.
    #[must_use]
    pub fn moved_to(&self, position: u32) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    /// A copy of this gate with every qubit reference rewritten through `map`.
    #[must_use]
    pub fn remapped(&self, map: impl Fn(QubitId) -> QubitId) -> Self {
        Self {
            qubit: map(self.qubit),
            targets: self.targets.iter().map(|&q| map(q)).collect(),
            controls: self.controls.iter().map(|&q| map(q)).collect(),
            ..self.clone()
        }
    }

    /// The wire type string.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Every qubit the gate references: `qubit`, then `targets`, then
    /// `controls`, without duplicates.
    pub fn touched_qubits(&self) -> Vec<QubitId> {
        let mut qubits = Vec::with_capacity(1 + self.targets.len() + self.controls.len());
        for q in std::iter::once(self.qubit)
            .chain(self.targets.iter().copied())
            .chain(self.controls.iter().copied())
        {
            if !qubits.contains(&q) {
                qubits.push(q);
            }
        }
        qubits
    }

    /// Whether the gate references `qubit` in any role.
    pub fn touches(&self, qubit: QubitId) -> bool {
        self.qubit == qubit || self.targets.contains(&qubit) || self.controls.contains(&qubit)
    }

    /// Resolve the ordered operands the gate acts on.
    ///
    /// Controls come first, then the target:
    /// - single-qubit gates and `measure`: `[qubit]`
    /// - `cnot`/`cz`: control is `controls[0]` if present, else `qubit`;
    ///   target is `targets[0]`, or `qubit` when the control came from `controls`
    /// - `swap`: `qubit` and `targets[0]` (or `controls[0]`)
    /// - `toffoli`: `controls[0..2]` (or `qubit, controls[0]`), then `targets[0]`
    ///
    /// Returns `None` for custom gates, missing operands, or repeated qubits.
    pub fn operands(&self) -> Option<Vec<QubitId>> {
        let operands = match &self.kind {
            GateKind::Cnot | GateKind::Cz => {
                match (self.controls.first(), self.targets.first()) {
                    (Some(&c), Some(&t)) => vec![c, t],
                    (Some(&c), None) => vec![c, self.qubit],
                    (None, Some(&t)) => vec![self.qubit, t],
                    (None, None) => return None,
                }
            }
            GateKind::Swap => {
                let other = self.targets.first().or(self.controls.first())?;
                vec![self.qubit, *other]
            }
            GateKind::Toffoli => {
                let (c0, c1) = match self.controls.as_slice() {
                    [c0, c1, ..] => (*c0, *c1),
                    [c0] => (self.qubit, *c0),
                    [] => return None,
                };
                let target = match self.targets.first() {
                    Some(&t) => t,
                    None if self.controls.len() >= 2 => self.qubit,
                    None => return None,
                };
                vec![c0, c1, target]
            }
            GateKind::Custom { .. } => return None,
            _ => vec![self.qubit],
        };

        for (i, q) in operands.iter().enumerate() {
            if operands[..i].contains(q) {
                return None;
            }
        }
        Some(operands)
    }

    /// Check the structural invariants of the gate.
    ///
    /// `qubit ∉ targets`, `targets ∩ controls = ∅`, operands resolvable,
    /// angle present for rotation and phase gates.
    pub fn validate(&self) -> IrResult<()> {
        let invalid = |reason: String| IrError::InvalidGate {
            gate: Some(self.id.clone()),
            reason,
        };

        if self.targets.contains(&self.qubit) {
            return Err(invalid(format!("qubit {} also listed as target", self.qubit)));
        }
        if let Some(q) = self.targets.iter().find(|q| self.controls.contains(q)) {
            return Err(invalid(format!("qubit {q} is both target and control")));
        }
        if matches!(
            self.kind,
            GateKind::Rx { .. } | GateKind::Ry { .. } | GateKind::Rz { .. } | GateKind::P { .. }
        ) && self.kind.angle().is_none()
        {
            return Err(invalid(format!("'{}' is missing its angle", self.name())));
        }
        if !matches!(self.kind, GateKind::Custom { .. }) && self.operands().is_none() {
            return Err(invalid(format!(
                "'{}' has missing or repeated operands",
                self.name()
            )));
        }
        Ok(())
    }

    /// Whether [`Gate::validate`] passes.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.qubit)?;
        for t in &self.targets {
            write!(f, " ->{t}")?;
        }
        for c in &self.controls {
            write!(f, " @{c}")?;
        }
        write!(f, " [{}]", self.position)
    }
}

/// The gate record exchanged with the editor, importers and emitters.
///
/// Field names and type strings are a stable contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireGate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<GateId>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    qubit: Option<QubitId>,
    #[serde(default)]
    targets: Vec<QubitId>,
    #[serde(default)]
    controls: Vec<QubitId>,
    #[serde(default)]
    params: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    position: u32,
}

impl TryFrom<WireGate> for Gate {
    type Error = IrError;

    fn try_from(wire: WireGate) -> IrResult<Self> {
        // Numbers and numeric strings survive; anything else is dropped and
        // leaves the gate malformed rather than failing the import.
        let params: BTreeMap<String, f64> = wire
            .params
            .iter()
            .filter_map(|(k, v)| {
                let value = match v {
                    serde_json::Value::Number(n) => n.as_f64(),
                    serde_json::Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                };
                value.map(|x| (k.clone(), x))
            })
            .collect();

        let kind = GateKind::from_wire(&wire.kind, &params);
        let qubit = wire
            .qubit
            .or_else(|| wire.controls.first().copied())
            .or_else(|| wire.targets.first().copied())
            .ok_or_else(|| IrError::InvalidGate {
                gate: wire.id.clone(),
                reason: format!("'{}' references no qubit", wire.kind),
            })?;
        let id = wire
            .id
            .unwrap_or_else(|| GateId::derived(kind.name(), qubit, wire.position));

        Ok(Gate {
            id,
            kind,
            qubit,
            targets: wire.targets,
            controls: wire.controls,
            position: wire.position,
        })
    }
}

impl From<Gate> for WireGate {
    fn from(gate: Gate) -> Self {
        let params = gate
            .kind
            .params()
            .into_iter()
            .filter_map(|(k, v)| serde_json::Number::from_f64(v).map(|n| (k, n.into())))
            .collect();
        WireGate {
            id: Some(gate.id),
            kind: gate.kind.name().to_string(),
            qubit: Some(gate.qubit),
            targets: gate.targets,
            controls: gate.controls,
            params,
            position: gate.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_kind_properties() {
        assert_eq!(GateKind::H.num_qubits(), Some(1));
        assert_eq!(GateKind::Cnot.num_qubits(), Some(2));
        assert_eq!(GateKind::Toffoli.num_qubits(), Some(3));
        assert!(GateKind::X.is_self_inverse());
        assert!(!GateKind::S.is_self_inverse());
        assert!(GateKind::Rz { phi: Some(1.0) }.is_rotation());
        assert!(!GateKind::P { phi: Some(1.0) }.is_rotation());
    }

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(90.0), 90.0);
        assert_eq!(normalize_angle(360.0), 0.0);
        assert_eq!(normalize_angle(-90.0), 270.0);
        assert_eq!(normalize_angle(720.0 - 1e-12), 0.0);
    }

    #[test]
    fn test_decode_with_defaults() {
        let gate: Gate = serde_json::from_str(r#"{"type": "h", "qubit": 0}"#).unwrap();
        assert_eq!(gate.kind, GateKind::H);
        assert!(gate.targets.is_empty());
        assert!(gate.controls.is_empty());
        assert_eq!(gate.position, 0);
        assert_eq!(gate.id.as_str(), "h@0:0");
    }

    #[test]
    fn test_decode_aliases() {
        let gate: Gate = serde_json::from_str(
            r#"{"id": "a", "type": "cx", "qubit": 0, "targets": [1], "position": 2}"#,
        )
        .unwrap();
        assert_eq!(gate.kind, GateKind::Cnot);
        assert_eq!(gate.operands(), Some(vec![QubitId(0), QubitId(1)]));

        let gate: Gate =
            serde_json::from_str(r#"{"type": "rz", "qubit": 1, "params": {"lambda": 45}}"#)
                .unwrap();
        assert_eq!(gate.kind, GateKind::Rz { phi: Some(45.0) });
    }

    #[test]
    fn test_missing_param_is_malformed_not_an_error() {
        let gate: Gate =
            serde_json::from_str(r#"{"type": "rx", "qubit": 0, "params": {"phi": "oops"}}"#)
                .unwrap();
        assert_eq!(gate.kind, GateKind::Rx { theta: None });
        assert!(matches!(gate.validate(), Err(IrError::InvalidGate { .. })));
    }

    #[test]
    fn test_encode_canonical_params() {
        let gate = Gate::single(GateKind::Rz { phi: Some(30.0) }, QubitId(2), 4).with_id("g7");
        let value = serde_json::to_value(&gate).unwrap();
        assert_eq!(value["id"], "g7");
        assert_eq!(value["type"], "rz");
        assert_eq!(value["qubit"], 2);
        assert_eq!(value["params"]["phi"], 30.0);
        assert_eq!(value["position"], 4);
        assert_eq!(value["targets"], serde_json::json!([]));
    }

    #[test]
    fn test_unknown_type_round_trips() {
        let json = r#"{"id": "u", "type": "sqrt_iswap", "qubit": 0, "params": {"k": 2}}"#;
        let gate: Gate = serde_json::from_str(json).unwrap();
        assert!(matches!(gate.kind, GateKind::Custom { .. }));
        assert!(gate.operands().is_none());
        let back = serde_json::to_value(&gate).unwrap();
        assert_eq!(back["type"], "sqrt_iswap");
        assert_eq!(back["params"]["k"], 2.0);
    }

    #[test]
    fn test_operands_resolution() {
        let cnot = Gate::new(GateKind::Cnot, QubitId(1))
            .with_controls([QubitId(0)])
            .at(0);
        assert_eq!(cnot.operands(), Some(vec![QubitId(0), QubitId(1)]));

        let toffoli = Gate::new(GateKind::Toffoli, QubitId(0))
            .with_controls([QubitId(0), QubitId(1)])
            .with_targets([QubitId(2)]);
        assert_eq!(
            toffoli.operands(),
            Some(vec![QubitId(0), QubitId(1), QubitId(2)])
        );

        let dangling = Gate::new(GateKind::Cnot, QubitId(0));
        assert!(dangling.operands().is_none());
        assert!(dangling.validate().is_err());
    }

    #[test]
    fn test_validate_invariants() {
        let self_target = Gate::new(GateKind::Cnot, QubitId(0)).with_targets([QubitId(0)]);
        assert!(self_target.validate().is_err());

        let overlap = Gate::new(GateKind::Toffoli, QubitId(3))
            .with_targets([QubitId(2)])
            .with_controls([QubitId(1), QubitId(2)]);
        assert!(overlap.validate().is_err());

        let ok = Gate::controlled(GateKind::Cz, QubitId(0), QubitId(1), 3);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_touched_qubits_dedup() {
        let gate = Gate::new(GateKind::Toffoli, QubitId(0))
            .with_controls([QubitId(0), QubitId(1)])
            .with_targets([QubitId(2)]);
        assert_eq!(
            gate.touched_qubits(),
            vec![QubitId(0), QubitId(2), QubitId(1)]
        );
    }
}

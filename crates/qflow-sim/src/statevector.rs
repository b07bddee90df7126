//! Statevector simulation engine.
//!
//! Amplitudes are indexed big-endian: wire 0 is the most significant bit of
//! the basis-state index, so index `0b10` on two wires reads as bitstring
//! `"10"` (wire 0 in state 1). Gate angles arrive in degrees.

use num_complex::Complex64;

use qflow_ir::GateKind;

/// Big-endian bitstring of `index` over `width` wires; empty for zero wires.
pub fn bitstring(index: usize, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    format!("{index:0width$b}")
}

/// A quantum state over `num_qubits` wires.
#[derive(Debug, Clone)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of wires.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    ///
    /// Callers bound `num_qubits` beforehand; see
    /// [`SimulatorConfig::max_qubits`](crate::SimulatorConfig::max_qubits).
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Get the number of wires.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Consume the state, returning its amplitudes.
    pub fn into_amplitudes(self) -> Vec<Complex64> {
        self.amplitudes
    }

    /// `|amplitude|²` for every basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Sum of all probabilities.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    /// Bitstring of a basis-state index, wire 0 first.
    pub fn bitstring(&self, index: usize) -> String {
        bitstring(index, self.num_qubits)
    }

    #[inline]
    fn mask(&self, wire: usize) -> usize {
        1 << (self.num_qubits - 1 - wire)
    }

    /// Apply a gate kind to resolved wires (controls first, then target).
    ///
    /// Returns `false` when the kind has no amplitude rule, the angle is
    /// missing, or the wire count does not match; the state is then left
    /// unchanged.
    pub fn apply(&mut self, kind: &GateKind, wires: &[usize]) -> bool {
        if wires.iter().any(|&w| w >= self.num_qubits) {
            return false;
        }
        match (kind, wires) {
            (GateKind::H, &[q]) => self.apply_h(q),
            (GateKind::X, &[q]) => self.apply_x(q),
            (GateKind::Y, &[q]) => self.apply_y(q),
            (GateKind::Z, &[q]) => self.apply_phase(q, 180.0),
            (GateKind::S, &[q]) => self.apply_phase(q, 90.0),
            (GateKind::T, &[q]) => self.apply_phase(q, 45.0),
            (GateKind::Rx { theta: Some(t) }, &[q]) => self.apply_rx(q, *t),
            (GateKind::Ry { theta: Some(t) }, &[q]) => self.apply_ry(q, *t),
            (GateKind::Rz { phi: Some(p) }, &[q]) => self.apply_rz(q, *p),
            (GateKind::P { phi: Some(p) }, &[q]) => self.apply_phase(q, *p),
            (GateKind::Measure, &[_]) => {}
            (GateKind::Cnot, &[c, t]) => self.apply_cx(c, t),
            (GateKind::Cz, &[c, t]) => self.apply_cz(c, t),
            (GateKind::Swap, &[a, b]) => self.apply_swap(a, b),
            (GateKind::Toffoli, &[c1, c2, t]) => self.apply_ccx(c1, c2, t),
            _ => return false,
        }
        true
    }

    // =========================================================================
    // Single-qubit gate implementations
    // =========================================================================

    fn apply_x(&mut self, qubit: usize) {
        let mask = self.mask(qubit);
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                self.amplitudes.swap(i, i | mask);
            }
        }
    }

    fn apply_y(&mut self, qubit: usize) {
        let mask = self.mask(qubit);
        let i_val = Complex64::new(0.0, 1.0);
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -i_val * self.amplitudes[j];
                self.amplitudes[j] = i_val * tmp;
            }
        }
    }

    fn apply_h(&mut self, qubit: usize) {
        let mask = self.mask(qubit);
        let sqrt2_inv = std::f64::consts::FRAC_1_SQRT_2;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = sqrt2_inv * (a + b);
                self.amplitudes[j] = sqrt2_inv * (a - b);
            }
        }
    }

    /// `diag(1, e^{iφ})`, φ in degrees.
    fn apply_phase(&mut self, qubit: usize, degrees: f64) {
        let mask = self.mask(qubit);
        let phase = Complex64::from_polar(1.0, degrees.to_radians());
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask != 0 {
                *amp *= phase;
            }
        }
    }

    fn apply_rx(&mut self, qubit: usize, degrees: f64) {
        let mask = self.mask(qubit);
        let half = degrees.to_radians() / 2.0;
        let c = half.cos();
        let neg_i_s = Complex64::new(0.0, -half.sin());
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + neg_i_s * b;
                self.amplitudes[j] = neg_i_s * a + c * b;
            }
        }
    }

    fn apply_ry(&mut self, qubit: usize, degrees: f64) {
        let mask = self.mask(qubit);
        let half = degrees.to_radians() / 2.0;
        let (s, c) = half.sin_cos();
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    fn apply_rz(&mut self, qubit: usize, degrees: f64) {
        let mask = self.mask(qubit);
        let half = degrees.to_radians() / 2.0;
        let phase_0 = Complex64::from_polar(1.0, -half);
        let phase_1 = Complex64::from_polar(1.0, half);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            *amp *= if i & mask == 0 { phase_0 } else { phase_1 };
        }
    }

    // =========================================================================
    // Multi-qubit gate implementations
    // =========================================================================

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = self.mask(control);
        let tgt_mask = self.mask(target);
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_cz(&mut self, control: usize, target: usize) {
        let both = self.mask(control) | self.mask(target);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & both == both {
                *amp = -*amp;
            }
        }
    }

    fn apply_swap(&mut self, q1: usize, q2: usize) {
        let mask1 = self.mask(q1);
        let mask2 = self.mask(q2);
        for i in 0..self.amplitudes.len() {
            if (i & mask1 != 0) && (i & mask2 == 0) {
                let j = (i & !mask1) | mask2;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_ccx(&mut self, c1: usize, c2: usize, target: usize) {
        let controls = self.mask(c1) | self.mask(c2);
        let tgt_mask = self.mask(target);
        for i in 0..self.amplitudes.len() {
            if (i & controls == controls) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }
}

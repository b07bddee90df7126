//! Pass trait for optimization stages.

use qflow_ir::Gate;

use crate::error::CompileResult;
use crate::property::PropertySet;

/// One stage of the optimization pipeline.
///
/// A pass reads a gate list and returns a new one; the input is never
/// modified. Passes may read and write the [`PropertySet`].
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Run the pass.
    fn run(&self, gates: &[Gate], properties: &mut PropertySet) -> CompileResult<Vec<Gate>>;

    /// Check if this pass should run based on current state.
    fn should_run(&self, _gates: &[Gate], _properties: &PropertySet) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Reverse;

    impl Pass for Reverse {
        fn name(&self) -> &'static str {
            "reverse"
        }

        fn run(&self, gates: &[Gate], _properties: &mut PropertySet) -> CompileResult<Vec<Gate>> {
            Ok(gates.iter().rev().cloned().collect())
        }
    }

    #[test]
    fn test_pass_returns_new_list() {
        use qflow_ir::{GateKind, QubitId};

        let gates = vec![
            Gate::single(GateKind::H, QubitId(0), 0),
            Gate::single(GateKind::X, QubitId(0), 1),
        ];
        let out = Reverse.run(&gates, &mut PropertySet::new()).unwrap();
        assert_eq!(out[0], gates[1]);
        assert_eq!(gates[0].kind, GateKind::H);
        assert!(Reverse.should_run(&gates, &PropertySet::new()));
    }
}

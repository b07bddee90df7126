//! qflow Optimization Pipeline
//!
//! This crate turns a circuit's gate list into a cheaper equivalent one.
//! It follows a pass-based architecture: each stage is a [`Pass`] that
//! takes a gate list and returns a new one, and a [`PassManager`] runs the
//! enabled stages in a fixed order while a [`PropertySet`] carries shared
//! state between them.
//!
//! # Architecture
//!
//! ```text
//! Input gates
//!       |
//!       v
//! +-------------+
//! | PassManager | <-- PropertySet (qubits, hardware model, layout, reports)
//! +-------------+
//!       |
//!       +-- GateSynthesis          (synthesisLevel > 0)
//!       +-- NoiseAwareCancellation (noiseAware)
//!       +-- QubitMapping           (qubitMapping)
//!       +-- DepthReduction         (depthReduction)
//!       |
//!       v
//! Output gates
//! ```
//!
//! A stage that fails with a recoverable error is skipped and its input is
//! passed on unchanged. A dependency cycle aborts the whole run.
//!
//! # Example
//!
//! ```rust
//! use qflow_compile::{OptimizationOptions, optimize};
//! use qflow_ir::{Circuit, GateKind, QubitId};
//!
//! let mut circuit = Circuit::with_qubits(1);
//! circuit.rx(30.0, QubitId(0)).unwrap();
//! circuit.rx(60.0, QubitId(0)).unwrap();
//!
//! let options = OptimizationOptions::none().with_synthesis_level(1);
//! let result = optimize(&circuit, &options).unwrap();
//!
//! assert_eq!(result.gates.len(), 1);
//! assert_eq!(result.gates[0].kind, GateKind::Rx { theta: Some(90.0) });
//! ```
//!
//! # Hardware Targets
//!
//! ```rust
//! use qflow_compile::{HardwareModel, OptimizationOptions, optimize};
//! use qflow_ir::Circuit;
//!
//! let circuit = Circuit::ghz(3).unwrap();
//! let options = OptimizationOptions::none()
//!     .with_mapping(HardwareModel::linear(5), false)
//!     .with_depth_reduction(None);
//!
//! let result = optimize(&circuit, &options).unwrap();
//! assert_eq!(result.gates.len(), circuit.gates().len());
//! assert!(result.layout.is_some());
//! ```

pub mod error;
pub mod hardware;
pub mod manager;
pub mod options;
pub mod pass;
pub mod passes;
pub mod property;

pub use error::{CompileError, CompileResult};
pub use hardware::{HardwareModel, pair_key};
pub use manager::{OptimizationResult, PassManager, PassManagerBuilder, analyze, optimize};
pub use options::{MAX_SYNTHESIS_LEVEL, OptimizationOptions};
pub use pass::Pass;
pub use property::{Layout, PassReport, PropertySet};

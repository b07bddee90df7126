//! qflow Circuit Model
//!
//! This crate provides the plain data types every other qflow crate
//! consumes: qubits, gates placed on a timeline, circuits, and the gate
//! dependency graph derived from shared qubit usage.
//!
//! # Overview
//!
//! A [`Circuit`] is a list of declared [`Qubit`]s and a list of [`Gate`]s.
//! Each gate has a typed [`GateKind`], a primary `qubit`, optional
//! `targets`/`controls`, and a timeline `position`. The JSON form of these
//! types is the contract shared with the editor, importers and text
//! emitters, so field names and type strings never change.
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qflow_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_qubits(2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cnot(QubitId(0), QubitId(1)).unwrap();
//!
//! assert_eq!(circuit.depth(), 2);
//! assert_eq!(circuit.gates()[1].position, 1);
//! ```
//!
//! # Example: Dependency Graph
//!
//! ```rust
//! use qflow_ir::{Circuit, QubitId};
//!
//! let circuit = Circuit::bell().unwrap();
//! let dag = circuit.dependency_graph();
//! assert_eq!(dag.successors(0), vec![1]);
//! assert_eq!(dag.topological_order().unwrap(), vec![0, 1]);
//! ```
//!
//! # Supported Gates
//!
//! | Type | Qubits | Parameters |
//! |------|--------|------------|
//! | `h`, `x`, `y`, `z`, `s`, `t` | 1 | – |
//! | `rx`, `ry` | 1 | `theta` (degrees) |
//! | `rz`, `p` | 1 | `phi` (degrees) |
//! | `cnot`, `cz`, `swap` | 2 | – |
//! | `toffoli` | 3 | – |
//! | `measure` | 1 | – |

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod metrics;
pub mod qubit;

pub use circuit::{Circuit, depth_of};
pub use dag::{DependencyGraph, NodeIndex};
pub use error::{IrError, IrResult};
pub use gate::{ANGLE_EPSILON, FULL_TURN, Gate, GateId, GateKind, normalize_angle};
pub use metrics::CircuitMetrics;
pub use qubit::{Qubit, QubitId};

//! `PropertySet` and related types for pass communication.
//!
//! Passes share data through a [`PropertySet`]: the declared qubits of the
//! circuit being optimized, the target [`HardwareModel`], the [`Layout`]
//! the mapper settles on, and one [`PassReport`] per executed pass.
//!
//! # Example
//!
//! ```
//! use qflow_compile::{HardwareModel, PropertySet};
//! use qflow_ir::QubitId;
//!
//! let props = PropertySet::new()
//!     .with_qubits([QubitId(0), QubitId(1)])
//!     .with_hardware(HardwareModel::linear(5));
//!
//! assert_eq!(props.qubits.len(), 2);
//! assert!(props.layout.is_none());
//! ```

use std::any::{Any, TypeId};
use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use qflow_ir::QubitId;

use crate::hardware::HardwareModel;

/// A mapping from logical qubits to physical qubits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    logical_to_physical: BTreeMap<QubitId, u32>,
    physical_to_logical: BTreeMap<u32, QubitId>,
}

impl Layout {
    /// Create a new empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity layout over the given logical qubits.
    pub fn identity(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        let mut layout = Self::new();
        for q in qubits {
            layout.add(q, q.0);
        }
        layout
    }

    /// Add a mapping from logical to physical qubit.
    ///
    /// Any earlier mapping of either side is dropped so both directions stay
    /// consistent.
    pub fn add(&mut self, logical: QubitId, physical: u32) {
        if let Some(old_logical) = self.physical_to_logical.insert(physical, logical) {
            if old_logical != logical {
                self.logical_to_physical.remove(&old_logical);
            }
        }
        if let Some(old_physical) = self.logical_to_physical.insert(logical, physical) {
            if old_physical != physical {
                self.physical_to_logical.remove(&old_physical);
            }
        }
    }

    /// Get the physical qubit for a logical qubit.
    pub fn get_physical(&self, logical: QubitId) -> Option<u32> {
        self.logical_to_physical.get(&logical).copied()
    }

    /// Get the logical qubit for a physical qubit.
    pub fn get_logical(&self, physical: u32) -> Option<QubitId> {
        self.physical_to_logical.get(&physical).copied()
    }

    /// Whether a logical qubit has been placed.
    pub fn is_mapped(&self, logical: QubitId) -> bool {
        self.logical_to_physical.contains_key(&logical)
    }

    /// Whether a physical qubit is taken.
    pub fn is_used(&self, physical: u32) -> bool {
        self.physical_to_logical.contains_key(&physical)
    }

    /// Number of mapped qubits.
    pub fn len(&self) -> usize {
        self.logical_to_physical.len()
    }

    /// Check if the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.logical_to_physical.is_empty()
    }

    /// Iterate over (logical, physical) pairs in logical order.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, u32)> + '_ {
        self.logical_to_physical.iter().map(|(&l, &p)| (l, p))
    }
}

/// What one pass did to the gate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    /// Pass name.
    pub pass: String,
    /// Gates before the pass.
    pub gates_before: usize,
    /// Gates after the pass.
    pub gates_after: usize,
    /// Depth before the pass.
    pub depth_before: u32,
    /// Depth after the pass.
    pub depth_after: u32,
    /// Set when the pass failed and its input was kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

/// Shared state passed through the optimization passes.
#[derive(Debug, Default)]
pub struct PropertySet {
    /// Declared logical qubits of the circuit being optimized.
    pub qubits: Vec<QubitId>,

    /// Target hardware, read by the mapper and the noise reducer.
    pub hardware: Option<HardwareModel>,

    /// Logical → physical layout chosen by the mapper.
    pub layout: Option<Layout>,

    /// One entry per pass the manager ran or skipped after a failure.
    pub reports: Vec<PassReport>,

    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the declared qubits.
    #[must_use]
    pub fn with_qubits(mut self, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        self.qubits = qubits.into_iter().collect();
        self
    }

    /// Set the target hardware.
    #[must_use]
    pub fn with_hardware(mut self, hardware: HardwareModel) -> Self {
        self.hardware = Some(hardware);
        self
    }

    /// Set the layout.
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}

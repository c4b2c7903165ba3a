//! Query descriptors and the RW/RO borrow-conflict check.
//!
//! A [`QueryDescriptor`] declares which component types a borrow reads and
//! writes. The repository (`fdp_ecs`) uses `conflicts_with` to reject a
//! second RW (or RW+RO) borrow against the same type while one is already
//! outstanding, per §4.1's exclusivity rule. The fluent `With`/`Without`/
//! `WithManaged` filters and the actual lazy query iterator live in
//! `fdp_ecs`, which owns the component stores these filters run over.

use serde::{Deserialize, Serialize};

use crate::component::ComponentTypeId;

/// Describes one borrow's data access, used to detect RW/RO conflicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Component types read immutably.
    pub reads: Vec<ComponentTypeId>,
    /// Component types written (mutable access).
    pub writes: Vec<ComponentTypeId>,
    /// Component types that are optional — present or absent, either is
    /// fine.
    pub optionals: Vec<ComponentTypeId>,
    /// Filters applied to the query (`With<T>`, `Without<T>`, `WithManaged<T>`).
    pub filters: Vec<QueryFilter>,
}

impl QueryDescriptor {
    /// Create a new empty query descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reads: Vec::new(),
            writes: Vec::new(),
            optionals: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Add a read-only component requirement.
    #[must_use]
    pub fn read(mut self, type_id: ComponentTypeId) -> Self {
        self.reads.push(type_id);
        self
    }

    /// Add a mutable component requirement.
    #[must_use]
    pub fn write(mut self, type_id: ComponentTypeId) -> Self {
        self.writes.push(type_id);
        self
    }

    /// Add an optional component.
    #[must_use]
    pub fn optional(mut self, type_id: ComponentTypeId) -> Self {
        self.optionals.push(type_id);
        self
    }

    /// Add a query filter.
    #[must_use]
    pub fn filter(mut self, f: QueryFilter) -> Self {
        self.filters.push(f);
        self
    }

    /// Returns all component types that this query accesses (reads + writes + optionals).
    #[must_use]
    pub fn all_accessed_types(&self) -> Vec<ComponentTypeId> {
        let mut types = Vec::new();
        types.extend_from_slice(&self.reads);
        types.extend_from_slice(&self.writes);
        types.extend_from_slice(&self.optionals);
        types
    }

    /// Returns the set of required component types (reads + writes, excluding optionals).
    #[must_use]
    pub fn required_types(&self) -> Vec<ComponentTypeId> {
        let mut types = Vec::new();
        types.extend_from_slice(&self.reads);
        types.extend_from_slice(&self.writes);
        types
    }

    /// Checks whether this borrow conflicts with another outstanding one.
    ///
    /// Two borrows conflict when one writes a component type that the other
    /// reads or writes — the condition `GetComponentRW` enforcement (§4.1)
    /// rejects before granting a second exclusive or shared+exclusive
    /// borrow of the same (entity, type):
    ///
    /// ```text
    /// A.writes ∩ (B.reads ∪ B.writes) ≠ ∅  OR
    /// B.writes ∩ (A.reads ∪ A.writes) ≠ ∅
    /// ```
    #[must_use]
    pub fn conflicts_with(&self, other: &QueryDescriptor) -> bool {
        // Check if any of our writes overlap with their reads or writes.
        for w in &self.writes {
            if other.reads.contains(w) || other.writes.contains(w) {
                return true;
            }
        }
        // Check if any of their writes overlap with our reads or writes.
        for w in &other.writes {
            if self.reads.contains(w) || self.writes.contains(w) {
                return true;
            }
        }
        false
    }
}

impl Default for QueryDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// A filter that narrows the set of entities matched by a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueryFilter {
    /// Only match entities that have this value component.
    With(ComponentTypeId),
    /// Only match entities that do NOT have this component.
    Without(ComponentTypeId),
    /// Only match entities that have this managed component.
    WithManaged(ComponentTypeId),
}

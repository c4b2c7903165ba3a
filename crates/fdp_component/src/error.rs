//! Shared error taxonomy and diagnostics.
//!
//! Every crate in the workspace defines its own `thiserror`-derived error
//! enum at its boundary, but each variant maps onto one of the five kinds
//! below so the host can classify any error from any subsystem without
//! downcasting. [`Diagnostic`] is the structured payload logged (via
//! `tracing`) or collected by tests for the user-visible, per-event message
//! the kernel promises on misuse, conflicts, and skipped operations.

use crate::component::ComponentTypeId;
use crate::entity::Entity;

/// The five error kinds named by the kernel's error handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// API contract violation: concurrent RW, mutation during iteration,
    /// re-entrant publish. Fatal to the current tick; the world stays valid.
    Misuse,
    /// Entity destroyed, component absent, netId unresolved. Recoverable;
    /// callers see `false`/`None`.
    NotFound,
    /// Registration mismatch or version skew. Recoverable; the operation is
    /// rejected.
    Conflict,
    /// Serialization failure: the payload was too small for its declared
    /// size, or its declared type id didn't match.
    SchemaMismatch,
    /// Internal bug: generation desync, orphan component. Fatal; the world
    /// is poisoned.
    Invariant,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Misuse => "misuse",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::SchemaMismatch => "schema_mismatch",
            ErrorKind::Invariant => "invariant",
        };
        f.write_str(s)
    }
}

/// A single diagnostic event: what kind of problem, a human-readable
/// message, and the entity/component type it concerns, if any.
///
/// Diagnostics are the structured form of the single-line stderr message the
/// kernel promises per misuse/conflict/skip event. Callers may log a
/// diagnostic via `tracing` or collect it for assertions in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
    pub entity: Option<Entity>,
    pub component: Option<ComponentTypeId>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            entity: None,
            component: None,
        }
    }

    #[must_use]
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: ComponentTypeId) -> Self {
        self.component = Some(component);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(e) = self.entity {
            write!(f, " entity={e}")?;
        }
        if let Some(c) = self.component {
            write!(f, " type={}", c.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display_includes_kind_and_message() {
        let d = Diagnostic::new(ErrorKind::Misuse, "concurrent RW borrow");
        assert_eq!(format!("{d}"), "[misuse] concurrent RW borrow");
    }

    #[test]
    fn test_diagnostic_with_context() {
        let d = Diagnostic::new(ErrorKind::Conflict, "netId mismatch")
            .with_entity(Entity::from_parts(1, 1))
            .with_component(ComponentTypeId(3));
        let s = format!("{d}");
        assert!(s.contains("entity=Entity(1#1)"));
        assert!(s.contains("type=3"));
    }
}

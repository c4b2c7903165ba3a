//! Fluent query builder over the repository.
//!
//! `Query::new().with::<Position>().without::<Dead>().build(repo)` returns a
//! restartable, deterministic sequence of entities: ascending index within
//! the smallest matching component store, the "driver" type (§4.1).

use fdp_component::{Component, ComponentTypeId, Entity};

use crate::repository::Repository;

enum Clause {
    With(ComponentTypeId),
    Without(ComponentTypeId),
    WithManaged(ComponentTypeId),
}

/// A declarative, reusable query. Build it once, `build` it against a
/// repository as many times as needed — each call re-evaluates against the
/// current state.
#[derive(Default)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self { clauses: Vec::new() }
    }

    #[must_use]
    pub fn with<T: Component>(mut self, repo: &Repository) -> Self {
        if let Some(id) = repo.type_id_of::<T>() {
            self.clauses.push(Clause::With(id));
        }
        self
    }

    #[must_use]
    pub fn without<T: Component>(mut self, repo: &Repository) -> Self {
        if let Some(id) = repo.type_id_of::<T>() {
            self.clauses.push(Clause::Without(id));
        }
        self
    }

    #[must_use]
    pub fn with_managed<T: Component>(mut self, repo: &Repository) -> Self {
        if let Some(id) = repo.type_id_of::<T>() {
            self.clauses.push(Clause::WithManaged(id));
        }
        self
    }

    /// Evaluate the query, returning entities in ascending-index order
    /// within the driver store (the smallest `With`/`WithManaged` store).
    /// An empty result if the query has no positive (`With`) clause at all
    /// — there is nothing to drive iteration from.
    #[must_use]
    pub fn build(&self, repo: &Repository) -> Vec<Entity> {
        let driver = self
            .clauses
            .iter()
            .filter_map(|c| match c {
                Clause::With(id) | Clause::WithManaged(id) => Some(*id),
                Clause::Without(_) => None,
            })
            .min_by_key(|&id| repo.store_len(id));

        let Some(driver) = driver else {
            return Vec::new();
        };

        repo.store_entities_sorted(driver)
            .into_iter()
            .filter(|&e| self.matches(repo, e))
            .collect()
    }

    fn matches(&self, repo: &Repository, entity: Entity) -> bool {
        self.clauses.iter().all(|c| match c {
            Clause::With(id) | Clause::WithManaged(id) => repo.store_contains(*id, entity),
            Clause::Without(id) => !repo.store_contains(*id, entity),
        })
    }
}

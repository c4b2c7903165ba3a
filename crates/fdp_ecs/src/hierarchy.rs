//! Dirty-tracked, topologically sorted parent/child ordering.
//!
//! [`HierarchyOrdering`] is a singleton component exposing a
//! children-before-parent traversal over every entity carrying a
//! [`HierarchyNode`]. It recomputes lazily on [`HierarchyOrdering::sorted`]
//! when marked dirty, via a post-order walk from each root; a cycle is
//! detected with a visited set and the offending subtree is skipped with a
//! diagnostic rather than looping forever.

use serde::{Deserialize, Serialize};

use fdp_component::{Component, Diagnostic, Entity, ErrorKind};

/// A node in the hierarchy: parent link plus the standard first-child /
/// next-sibling encoding of a children list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HierarchyNode {
    pub parent: Entity,
    pub first_child: Entity,
    pub next_sibling: Entity,
}

impl Component for HierarchyNode {
    fn type_name() -> &'static str {
        "HierarchyNode"
    }
}

impl HierarchyNode {
    #[must_use]
    pub fn root() -> Self {
        Self {
            parent: Entity::NULL,
            first_child: Entity::NULL,
            next_sibling: Entity::NULL,
        }
    }
}

/// The sorted traversal list plus the dirty flag gating recomputation.
#[derive(Debug, Default)]
pub struct HierarchyOrdering {
    sorted: Vec<Entity>,
    dirty: bool,
    diagnostics: Vec<Diagnostic>,
}

impl HierarchyOrdering {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sorted: Vec::new(),
            dirty: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Recompute (if dirty) and return the children-before-parent order.
    /// `nodes` maps an entity to its `HierarchyNode`, supplied by the
    /// caller (the repository owns the actual component storage).
    pub fn sorted(
        &mut self,
        roots: &[Entity],
        nodes: &dyn Fn(Entity) -> Option<HierarchyNode>,
    ) -> &[Entity] {
        if self.dirty {
            self.recompute(roots, nodes);
            self.dirty = false;
        }
        &self.sorted
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn recompute(&mut self, roots: &[Entity], nodes: &dyn Fn(Entity) -> Option<HierarchyNode>) {
        self.sorted.clear();
        self.diagnostics.clear();
        let mut visited = std::collections::HashSet::new();

        let mut ordered_roots = roots.to_vec();
        ordered_roots.sort_by_key(|e| e.index());

        for &root in &ordered_roots {
            let mut path = std::collections::HashSet::new();
            self.post_order(root, nodes, &mut visited, &mut path);
        }
    }

    /// Post-order (children, then this node) walk. `path` is the ancestry
    /// chain of the current recursion; a revisit within `path` is a cycle —
    /// the subtree is skipped with a diagnostic and recursion unwinds
    /// without emitting the cyclic node or its descendants.
    fn post_order(
        &mut self,
        entity: Entity,
        nodes: &dyn Fn(Entity) -> Option<HierarchyNode>,
        visited: &mut std::collections::HashSet<Entity>,
        path: &mut std::collections::HashSet<Entity>,
    ) {
        if entity.is_null() || visited.contains(&entity) {
            return;
        }
        if path.contains(&entity) {
            self.diagnostics.push(
                Diagnostic::new(ErrorKind::Invariant, "hierarchy cycle detected; subtree skipped")
                    .with_entity(entity),
            );
            return;
        }
        path.insert(entity);

        let mut child = nodes(entity).map_or(Entity::NULL, |n| n.first_child);
        while !child.is_null() {
            self.post_order(child, nodes, visited, path);
            child = nodes(child).map_or(Entity::NULL, |n| n.next_sibling);
        }

        path.remove(&entity);
        visited.insert(entity);
        self.sorted.push(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn e(i: u32) -> Entity {
        Entity::from_parts(i, 1)
    }

    #[test]
    fn test_linear_chain_children_before_parent() {
        // R -> C1 -> G
        let r = e(1);
        let c1 = e(2);
        let g = e(3);
        let mut map = HashMap::new();
        map.insert(
            r,
            HierarchyNode {
                parent: Entity::NULL,
                first_child: c1,
                next_sibling: Entity::NULL,
            },
        );
        map.insert(
            c1,
            HierarchyNode {
                parent: r,
                first_child: g,
                next_sibling: Entity::NULL,
            },
        );
        map.insert(g, HierarchyNode {
            parent: c1,
            first_child: Entity::NULL,
            next_sibling: Entity::NULL,
        });

        let mut ordering = HierarchyOrdering::new();
        let sorted = ordering.sorted(&[r], &|ent| map.get(&ent).copied()).to_vec();
        assert_eq!(sorted, vec![g, c1, r]);
    }

    #[test]
    fn test_siblings_in_chain_order_then_root() {
        let r = e(1);
        let c1 = e(2);
        let c2 = e(3);
        let g = e(4);
        let mut map = HashMap::new();
        map.insert(r, HierarchyNode { parent: Entity::NULL, first_child: c1, next_sibling: Entity::NULL });
        map.insert(c1, HierarchyNode { parent: r, first_child: g, next_sibling: c2 });
        map.insert(c2, HierarchyNode { parent: r, first_child: Entity::NULL, next_sibling: Entity::NULL });
        map.insert(g, HierarchyNode { parent: c1, first_child: Entity::NULL, next_sibling: Entity::NULL });

        let mut ordering = HierarchyOrdering::new();
        let sorted = ordering.sorted(&[r], &|ent| map.get(&ent).copied()).to_vec();
        assert_eq!(sorted, vec![g, c1, c2, r]);
    }

    #[test]
    fn test_cycle_is_skipped_with_diagnostic_rest_still_sorted() {
        // A -> B -> A (cycle), plus an unrelated root U.
        let a = e(1);
        let b = e(2);
        let u = e(3);
        let mut map = HashMap::new();
        map.insert(a, HierarchyNode { parent: b, first_child: b, next_sibling: Entity::NULL });
        map.insert(b, HierarchyNode { parent: a, first_child: a, next_sibling: Entity::NULL });
        map.insert(u, HierarchyNode::root());

        let mut ordering = HierarchyOrdering::new();
        let sorted = ordering.sorted(&[a, u], &|ent| map.get(&ent).copied()).to_vec();
        assert!(sorted.contains(&u));
        assert!(!ordering.diagnostics().is_empty());
    }

    #[test]
    fn test_multiple_roots_ordered_by_index() {
        let r1 = e(5);
        let r2 = e(2);
        let mut map = HashMap::new();
        map.insert(r1, HierarchyNode::root());
        map.insert(r2, HierarchyNode::root());

        let mut ordering = HierarchyOrdering::new();
        let sorted = ordering.sorted(&[r1, r2], &|ent| map.get(&ent).copied()).to_vec();
        assert_eq!(sorted, vec![r2, r1]);
    }

    #[test]
    fn test_not_dirty_reuses_cached_result() {
        let r = e(1);
        let mut map = HashMap::new();
        map.insert(r, HierarchyNode::root());
        let mut ordering = HierarchyOrdering::new();
        ordering.sorted(&[r], &|ent| map.get(&ent).copied());
        map.clear(); // stale source data; cached result must not change
        let sorted = ordering.sorted(&[r], &|ent| map.get(&ent).copied()).to_vec();
        assert_eq!(sorted, vec![r]);
    }
}

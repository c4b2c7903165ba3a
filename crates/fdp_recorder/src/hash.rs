//! Deterministic post-playback state hash (§4.10, invariant 4).
//!
//! Combined with XOR, so the combiner is commutative by construction — the
//! order components are folded in never changes the result. Entities are
//! still walked in index order first, since that is the order every other
//! deterministic iteration in this crate uses and it keeps a debugger
//! stepping through a hash mismatch sane.

use fdp_component::{ComponentKind, ComponentTypeId};
use fdp_ecs::Repository;

/// A 64-bit FNV-1a hash over one `(entity index, type id, version, bytes)`
/// triple.
fn hash_triple(entity_index: u32, type_id: ComponentTypeId, version: u64, bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut h = OFFSET;
    let mut feed = |chunk: &[u8]| {
        for &b in chunk {
            h ^= u64::from(b);
            h = h.wrapping_mul(PRIME);
        }
    };
    feed(&entity_index.to_le_bytes());
    feed(&type_id.0.to_le_bytes());
    feed(&version.to_le_bytes());
    feed(bytes);
    h
}

/// Hash every live component in `repo`: a commutative XOR-fold over
/// `(entity, type id, componentVersion, bytes)` triples, so the result
/// depends only on state, not on store iteration order.
///
/// Only `Value`-kind (fixed-layout, `Copy`) components are hashed from
/// their raw in-memory bytes — a `Managed` component's in-memory
/// representation can hold heap pointers, which differ across otherwise
/// identical runs and would make replay hashes never match. Hashing a
/// `Managed` component's *content* needs its provider's encoded bytes
/// (`fdp_serde`), which this crate deliberately does not depend on; S1–S6
/// only exercise `Value` components, so this is a documented limitation,
/// not a silent gap in the tested scenarios.
#[must_use]
pub fn hash_repository(repo: &Repository) -> u64 {
    let mut acc: u64 = 0;
    for type_id in repo.registered_type_ids() {
        if repo.component_kind(type_id) != Some(ComponentKind::Value) {
            continue;
        }
        for entity in repo.entities_for_type(type_id) {
            let Some(version) = repo.component_version_raw(entity, type_id) else {
                continue;
            };
            let Some(bytes) = repo.raw_bytes(entity, type_id) else {
                continue;
            };
            acc ^= hash_triple(entity.index(), type_id, version, bytes);
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdp_component::Component;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[test]
    fn test_hash_is_order_independent() {
        let mut repo_a = Repository::new();
        repo_a.register_component::<Position>();
        let a1 = repo_a.create_entity();
        let a2 = repo_a.create_entity();
        repo_a.add_component(a1, Position { x: 1.0, y: 0.0 }).unwrap();
        repo_a.add_component(a2, Position { x: 2.0, y: 0.0 }).unwrap();

        let mut repo_b = Repository::new();
        repo_b.register_component::<Position>();
        let b1 = repo_b.create_entity();
        let b2 = repo_b.create_entity();
        // Insert in the opposite order.
        repo_b.add_component(b2, Position { x: 2.0, y: 0.0 }).unwrap();
        repo_b.add_component(b1, Position { x: 1.0, y: 0.0 }).unwrap();

        assert_eq!(hash_repository(&repo_a), hash_repository(&repo_b));
    }

    #[test]
    fn test_hash_changes_on_value_change() {
        let mut repo = Repository::new();
        repo.register_component::<Position>();
        let e = repo.create_entity();
        repo.add_component(e, Position { x: 1.0, y: 0.0 }).unwrap();
        let before = hash_repository(&repo);
        repo.set_component(e, Position { x: 2.0, y: 0.0 }).unwrap();
        let after = hash_repository(&repo);
        assert_ne!(before, after);
    }

    #[test]
    fn test_empty_repository_hashes_to_zero() {
        let repo = Repository::new();
        assert_eq!(hash_repository(&repo), 0);
    }
}

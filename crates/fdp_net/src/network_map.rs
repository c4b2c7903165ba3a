//! The network identity bijection (§4.8): netId ↔ local entity.

use std::collections::{BTreeMap, HashMap};

use fdp_component::Entity;
use serde::{Deserialize, Serialize};

use crate::error::NetError;

/// A signed, globally-unique network identity for a replicated entity. `0`
/// is the reserved sentinel for "unresolved" and is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetId(pub i64);

impl NetId {
    pub const NONE: NetId = NetId(0);

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// The node that currently owns authoritative state for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub i32);

/// Bidirectional netId ↔ entity bijection.
///
/// `BTreeMap` keyed by [`NetId`] gives the netId-ascending iteration order
/// §4.8 requires for free; the reverse direction is an ordinary hash map
/// since no ordering guarantee is promised on it.
#[derive(Debug, Default)]
pub struct NetworkEntityMap {
    forward: BTreeMap<NetId, Entity>,
    reverse: HashMap<Entity, NetId>,
}

impl NetworkEntityMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert both directions. Idempotent when the exact `(net_id, entity)`
    /// pair is already present; fails [`NetError::Conflict`] if either side
    /// is already bound to something else. `NetId::NONE` and `Entity::NULL`
    /// are never stored.
    pub fn register(&mut self, net_id: NetId, entity: Entity) -> Result<(), NetError> {
        if net_id.is_none() || entity.is_null() {
            return Err(NetError::Conflict(
                "cannot register the null entity or netId 0".into(),
            ));
        }
        if let Some(&existing) = self.forward.get(&net_id) {
            if existing == entity {
                return Ok(());
            }
            return Err(NetError::Conflict(format!(
                "netId {} already bound to a different entity",
                net_id.0
            )));
        }
        if let Some(&existing) = self.reverse.get(&entity) {
            if existing == net_id {
                return Ok(());
            }
            return Err(NetError::Conflict(format!(
                "entity {entity} already bound to a different netId"
            )));
        }
        self.forward.insert(net_id, entity);
        self.reverse.insert(entity, net_id);
        Ok(())
    }

    /// Remove both directions for `net_id`. A no-op if nothing was bound.
    pub fn unregister(&mut self, net_id: NetId) {
        if let Some(entity) = self.forward.remove(&net_id) {
            self.reverse.remove(&entity);
        }
    }

    #[must_use]
    pub fn try_resolve(&self, net_id: NetId) -> Option<Entity> {
        self.forward.get(&net_id).copied()
    }

    #[must_use]
    pub fn try_reverse_resolve(&self, entity: Entity) -> Option<NetId> {
        self.reverse.get(&entity).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Iterate `(netId, entity)` pairs in netId-ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (NetId, Entity)> + '_ {
        self.forward.iter().map(|(&n, &e)| (n, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_resolve_both_directions() {
        let mut map = NetworkEntityMap::new();
        let e = Entity::from_parts(1, 1);
        map.register(NetId(100), e).unwrap();
        assert_eq!(map.try_resolve(NetId(100)), Some(e));
        assert_eq!(map.try_reverse_resolve(e), Some(NetId(100)));
    }

    #[test]
    fn test_register_identical_pair_twice_is_noop() {
        let mut map = NetworkEntityMap::new();
        let e = Entity::from_parts(1, 1);
        map.register(NetId(100), e).unwrap();
        map.register(NetId(100), e).unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_register_conflicting_pair_fails() {
        let mut map = NetworkEntityMap::new();
        let e1 = Entity::from_parts(1, 1);
        let e2 = Entity::from_parts(2, 1);
        map.register(NetId(100), e1).unwrap();
        let err = map.register(NetId(100), e2).unwrap_err();
        assert!(matches!(err, NetError::Conflict(_)));
    }

    #[test]
    fn test_register_null_or_zero_rejected() {
        let mut map = NetworkEntityMap::new();
        assert!(map.register(NetId::NONE, Entity::from_parts(1, 1)).is_err());
        assert!(map.register(NetId(1), Entity::NULL).is_err());
    }

    #[test]
    fn test_unregister_removes_both_directions() {
        let mut map = NetworkEntityMap::new();
        let e = Entity::from_parts(1, 1);
        map.register(NetId(100), e).unwrap();
        map.unregister(NetId(100));
        assert_eq!(map.try_resolve(NetId(100)), None);
        assert_eq!(map.try_reverse_resolve(e), None);
    }

    #[test]
    fn test_iteration_is_net_id_ascending() {
        let mut map = NetworkEntityMap::new();
        map.register(NetId(300), Entity::from_parts(1, 1)).unwrap();
        map.register(NetId(100), Entity::from_parts(2, 1)).unwrap();
        map.register(NetId(200), Entity::from_parts(3, 1)).unwrap();
        let ids: Vec<i64> = map.iter().map(|(n, _)| n.0).collect();
        assert_eq!(ids, vec![100, 200, 300]);
    }
}

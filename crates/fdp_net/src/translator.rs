//! Local ↔ wire translation, resolving entity-typed fields through a
//! [`NetworkEntityMap`] (§4.9).

use crate::network_map::{NetId, NetworkEntityMap};

/// What an encoder does when an entity-typed field has no registered netId.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedPolicy {
    /// Drop the whole value and emit a diagnostic.
    Drop,
    /// Encode it anyway, with `NetId::NONE` in place of the missing id.
    ProduceWithNone,
}

/// Converts between a local type `L` (carrying [`fdp_component::Entity`]
/// fields) and its wire type `W` (carrying [`NetId`] fields), resolving
/// identities through a [`NetworkEntityMap`].
///
/// Decoding always returns `true` and tolerates unresolved net ids by
/// filling `Entity::NULL` — consumers downstream must tolerate unresolved
/// references (§4.9); only encoding has a drop policy.
pub trait Translator<L, W> {
    fn unresolved_policy(&self) -> UnresolvedPolicy {
        UnresolvedPolicy::ProduceWithNone
    }

    /// Attempt to produce a wire value from a local one. Returns `None` if
    /// `unresolved_policy` is `Drop` and some entity field could not be
    /// resolved.
    fn try_encode(&self, local: &L, map: &NetworkEntityMap) -> Option<W>;

    /// Produce a local value from a wire one. Always succeeds; entity
    /// fields with no binding in `map` become `Entity::NULL`.
    fn try_decode(&self, wire: &W, map: &NetworkEntityMap) -> L;
}

/// Looks up `net_id` in `map`, honoring `policy` when unresolved. Encoders
/// call this once per entity-typed field.
#[must_use]
pub fn resolve_for_encode(
    entity: fdp_component::Entity,
    map: &NetworkEntityMap,
    policy: UnresolvedPolicy,
) -> Option<NetId> {
    match map.try_reverse_resolve(entity) {
        Some(id) => Some(id),
        None => match policy {
            UnresolvedPolicy::Drop => None,
            UnresolvedPolicy::ProduceWithNone => Some(NetId::NONE),
        },
    }
}

/// Looks up `net_id` in `map`, always succeeding with `Entity::NULL` on a
/// miss. Decoders call this once per entity-typed field.
#[must_use]
pub fn resolve_for_decode(net_id: NetId, map: &NetworkEntityMap) -> fdp_component::Entity {
    map.try_resolve(net_id).unwrap_or(fdp_component::Entity::NULL)
}

//! Outbound dirty-component diffing and inbound command-buffer application
//! (§4.11).

use std::collections::HashMap;

use fdp_component::{Component, ComponentTypeId, Diagnostic, Entity, ErrorKind};
use fdp_ecs::{CommandBuffer, PlaybackReport, Repository, Target};
use fdp_net::{NetId, NetworkEntityMap, NodeId};
use fdp_serde::Provider;

use crate::ownership::NetworkOwnership;
use crate::transport::{Transport, WireMessage};

/// Per-type erasure so [`ReplicationDriver`] can hold providers for many
/// concrete component types behind one vector, the same shape
/// `fdp_serde::registry` uses for its provider table.
trait ErasedReplicatedType: Send + Sync {
    fn type_id(&self) -> ComponentTypeId;

    fn collect_dirty(
        &self,
        repo: &mut Repository,
        local_node: NodeId,
        map: &NetworkEntityMap,
        last_replicated: &mut HashMap<(Entity, ComponentTypeId), u64>,
    ) -> Vec<(NetId, Vec<u8>)>;

    fn apply_inbound(
        &self,
        target: Target,
        payload: &[u8],
        buffer: &mut CommandBuffer,
    ) -> Result<(), ErrorKind>;
}

struct TypedReplicatedType<T: Component> {
    type_id: ComponentTypeId,
    provider: Box<dyn Provider<T>>,
}

impl<T: Component> ErasedReplicatedType for TypedReplicatedType<T> {
    fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }

    fn collect_dirty(
        &self,
        repo: &mut Repository,
        local_node: NodeId,
        map: &NetworkEntityMap,
        last_replicated: &mut HashMap<(Entity, ComponentTypeId), u64>,
    ) -> Vec<(NetId, Vec<u8>)> {
        let mut out = Vec::new();
        for entity in repo.entities_with::<T>() {
            let Some(net_id) = map.try_reverse_resolve(entity) else {
                continue;
            };
            let is_local_owner = matches!(
                repo.get_component_ro::<NetworkOwnership>(entity),
                Ok(Some(ownership)) if ownership.local_owner == local_node
            );
            if !is_local_owner {
                continue;
            }
            let Some(version) = repo.component_version::<T>(entity) else {
                continue;
            };
            let key = (entity, self.type_id);
            if last_replicated.get(&key).is_some_and(|&v| v >= version) {
                continue;
            }
            let Ok(Some(value)) = repo.get_component_ro::<T>(entity) else {
                continue;
            };
            let size = self.provider.get_size(value);
            let mut buf = vec![0u8; size];
            let Ok(written) = self.provider.encode(value, &mut buf) else {
                continue;
            };
            buf.truncate(written);
            last_replicated.insert(key, version);
            out.push((net_id, buf));
        }
        out
    }

    fn apply_inbound(
        &self,
        target: Target,
        payload: &[u8],
        buffer: &mut CommandBuffer,
    ) -> Result<(), ErrorKind> {
        self.provider
            .apply(target, payload, buffer)
            .map_err(|_| ErrorKind::SchemaMismatch)
    }
}

/// Diffs locally-owned component state out to a [`Transport`] and applies
/// inbound payloads through a [`CommandBuffer`], once per tick after
/// Simulation (§4.11).
pub struct ReplicationDriver {
    local_node: NodeId,
    types: HashMap<ComponentTypeId, Box<dyn ErasedReplicatedType>>,
    last_replicated: HashMap<(Entity, ComponentTypeId), u64>,
    /// netIds of stub entities created by the most recent `replicate_inbound`
    /// call, in the same order their `CreateEntity` ops were queued. Zipped
    /// against `PlaybackReport::created` by `resolve_pending_stubs` once the
    /// caller plays the buffer back, since a placeholder only resolves to a
    /// real `Entity` at that point.
    pending_stubs: Vec<NetId>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReplicationDriver {
    #[must_use]
    pub fn new(local_node: NodeId) -> Self {
        Self {
            local_node,
            types: HashMap::new(),
            last_replicated: HashMap::new(),
            pending_stubs: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn register_type<T: Component>(
        &mut self,
        type_id: ComponentTypeId,
        provider: impl Provider<T> + 'static,
    ) {
        self.types.insert(
            type_id,
            Box::new(TypedReplicatedType::<T> {
                type_id,
                provider: Box::new(provider),
            }),
        );
    }

    /// Iterate every locally-owned, dirty component across every
    /// registered type and hand it to `transport`.
    pub fn replicate_outbound(
        &mut self,
        repo: &mut Repository,
        map: &NetworkEntityMap,
        transport: &dyn Transport,
    ) {
        for replicated in self.types.values() {
            for (net_id, payload) in replicated.collect_dirty(
                repo,
                self.local_node,
                map,
                &mut self.last_replicated,
            ) {
                transport.send(WireMessage {
                    net_id,
                    type_id: replicated.type_id(),
                    payload,
                });
            }
        }
    }

    /// Drain `transport` and queue every message onto `buffer`, resolving
    /// each netId through `map`. An unregistered netId gets a stub entity
    /// created on first sight, with a diagnostic, and the payload is applied
    /// against that stub's placeholder rather than dropped; call
    /// [`Self::resolve_pending_stubs`] with the resulting [`PlaybackReport`]
    /// once `buffer` plays back to bind the stub's real entity into `map`.
    /// Ordering within a single (entity, type) pair follows arrival order
    /// since messages are applied in drain order.
    pub fn replicate_inbound(
        &mut self,
        map: &mut NetworkEntityMap,
        buffer: &mut CommandBuffer,
        transport: &dyn Transport,
    ) {
        for message in transport.drain() {
            let target: Target = match map.try_resolve(message.net_id) {
                Some(e) => e.into(),
                None => {
                    let placeholder = buffer.create_entity();
                    self.pending_stubs.push(message.net_id);
                    let diagnostic = Diagnostic::new(
                        ErrorKind::NotFound,
                        format!("stub entity created for unregistered netId {}", message.net_id.0),
                    );
                    self.diagnostics.push(diagnostic);
                    placeholder.into()
                }
            };
            let Some(replicated) = self.types.get(&message.type_id) else {
                self.diagnostics.push(Diagnostic::new(
                    ErrorKind::SchemaMismatch,
                    "inbound message for unregistered component type",
                ));
                continue;
            };
            if let Err(kind) = replicated.apply_inbound(target, &message.payload, buffer) {
                let mut diagnostic = Diagnostic::new(kind, "inbound replication payload rejected");
                if let Target::Entity(entity) = target {
                    diagnostic = diagnostic.with_entity(entity);
                }
                self.diagnostics.push(diagnostic);
            }
        }
    }

    /// Bind every stub created by the most recent `replicate_inbound` call
    /// into `map`, now that `report` carries the entities the buffer's
    /// playback actually resolved them to. A registration conflict (the
    /// netId or entity already bound to something else) is surfaced as a
    /// diagnostic rather than panicking; the stub entity is left unbound in
    /// `map` in that case.
    pub fn resolve_pending_stubs(&mut self, report: &PlaybackReport, map: &mut NetworkEntityMap) {
        for (net_id, &entity) in self.pending_stubs.drain(..).zip(report.created.iter()) {
            if let Err(err) = map.register(net_id, entity) {
                self.diagnostics.push(
                    Diagnostic::new(ErrorKind::Conflict, err.to_string()).with_entity(entity),
                );
            }
        }
    }
}

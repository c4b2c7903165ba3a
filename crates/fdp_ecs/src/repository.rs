//! The entity repository: entity allocation, per-type component storage,
//! singleton slots, borrow tracking, and queries.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use fdp_component::{Component, ComponentStore, ComponentTypeId, Diagnostic, Entity, EntityAllocator, ErrorKind, TypeRegistry};

/// A live exclusive or shared borrow of one (entity, type) pair, tracked so
/// a second conflicting `GetComponentRW`/`GetComponentRO` fails with
/// [`ErrorKind::Misuse`] instead of aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BorrowKey {
    entity: Entity,
    type_id: ComponentTypeId,
}

/// The canonical, single-owner store of entities and their components.
///
/// A `Repository` is not `Clone`; the world that owns it is the only thing
/// allowed to touch it directly (§5). Module code reaches it only through a
/// [`crate::view::SimulationView`] and the command buffer.
pub struct Repository {
    allocator: EntityAllocator,
    registry: TypeRegistry,
    stores: HashMap<ComponentTypeId, ComponentStore>,
    singletons: HashMap<TypeId, Box<dyn std::any::Any + Send + Sync>>,
    global_version: u64,
    exclusive_borrows: HashSet<BorrowKey>,
    shared_borrows: HashMap<BorrowKey, u32>,
    /// Set once an [`fdp_component::ErrorKind::Invariant`] fires; no further
    /// mutation is permitted.
    poisoned: bool,
    /// >0 while a [`CommandBuffer`](crate::command_buffer::CommandBuffer)
    /// playback is in progress: structural bumps coalesce into one bump at
    /// `end_batch` instead of firing per op (§4.2).
    batch_depth: u32,
    batch_dirty: bool,
}

impl Repository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            registry: TypeRegistry::new(),
            stores: HashMap::new(),
            singletons: HashMap::new(),
            global_version: 0,
            exclusive_borrows: HashSet::new(),
            shared_borrows: HashMap::new(),
            poisoned: false,
            batch_depth: 0,
            batch_dirty: false,
        }
    }

    /// Begin coalescing structural version bumps. Paired with
    /// [`Self::end_batch`]; calls may nest.
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// End a batch started with [`Self::begin_batch`], flushing one version
    /// bump if any structural change occurred during it.
    pub fn end_batch(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0 && self.batch_dirty {
            self.global_version += 1;
            self.batch_dirty = false;
        }
    }

    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn poison(&mut self, diagnostic: &Diagnostic) {
        tracing::error!(%diagnostic, "repository poisoned");
        self.poisoned = true;
    }

    #[must_use]
    pub fn global_version(&self) -> u64 {
        self.global_version
    }

    fn bump_global_version(&mut self) {
        if self.batch_depth > 0 {
            self.batch_dirty = true;
        } else {
            self.global_version += 1;
        }
    }

    /// Register a component type if it hasn't been already. Idempotent.
    pub fn register_component<T: Component>(&mut self) -> ComponentTypeId {
        let id = self.registry.register::<T>();
        self.stores
            .entry(id)
            .or_insert_with(|| ComponentStore::new(id, std::mem::size_of::<T>()));
        id
    }

    #[must_use]
    pub fn type_id_of<T: Component>(&self) -> Option<ComponentTypeId> {
        self.registry.id_of::<T>()
    }

    pub fn create_entity(&mut self) -> Entity {
        self.bump_global_version();
        self.allocator.allocate()
    }

    /// Destroy an entity and every component it carries. Returns `false` if
    /// the entity was already dead.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }
        for store in self.stores.values_mut() {
            store.remove(entity);
        }
        self.allocator.free(entity);
        self.bump_global_version();
        true
    }

    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        let Some(id) = self.registry.id_of::<T>() else {
            return false;
        };
        self.stores
            .get(&id)
            .is_some_and(|store| store.contains(entity))
    }

    /// Attach or overwrite `entity`'s component. Returns `Err(Misuse)` if
    /// the type was never registered.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> Result<(), ErrorKind> {
        let id = self.registry.id_of::<T>().ok_or(ErrorKind::Misuse)?;
        let store = self.stores.get_mut(&id).ok_or(ErrorKind::Misuse)?;
        // SAFETY: `id` was assigned to `T` at registration; the store for
        // `id` was created with `size_of::<T>()`.
        unsafe { store.insert(entity, value) };
        self.bump_global_version();
        Ok(())
    }

    /// Replace an existing component's value without changing structure.
    pub fn set_component<T: Component>(&mut self, entity: Entity, value: T) -> Result<(), ErrorKind> {
        let id = self.registry.id_of::<T>().ok_or(ErrorKind::Misuse)?;
        let store = self.stores.get_mut(&id).ok_or(ErrorKind::Misuse)?;
        if !store.contains(entity) {
            return Err(ErrorKind::NotFound);
        }
        // SAFETY: see `add_component`.
        unsafe { store.insert(entity, value) };
        Ok(())
    }

    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> bool {
        let Some(id) = self.registry.id_of::<T>() else {
            return false;
        };
        let removed = self
            .stores
            .get_mut(&id)
            .is_some_and(|store| store.remove(entity));
        if removed {
            self.bump_global_version();
        }
        removed
    }

    /// Attach or overwrite `entity`'s component from raw bytes, type-erased.
    /// Used by replay to apply a recorded structural op without recovering
    /// the concrete Rust type. `bytes` must match the store's declared item
    /// size, which replay guarantees by sourcing them from a prior
    /// `raw_bytes` capture for the same `type_id`.
    pub fn add_component_raw(&mut self, entity: Entity, type_id: ComponentTypeId, bytes: &[u8]) -> Result<(), ErrorKind> {
        let store = self.stores.get_mut(&type_id).ok_or(ErrorKind::Misuse)?;
        store.insert_raw(entity, bytes);
        self.bump_global_version();
        Ok(())
    }

    /// Remove `entity`'s component for `type_id` without knowing the
    /// concrete Rust type.
    pub fn remove_component_raw(&mut self, entity: Entity, type_id: ComponentTypeId) -> bool {
        let removed = self
            .stores
            .get_mut(&type_id)
            .is_some_and(|store| store.remove(entity));
        if removed {
            self.bump_global_version();
        }
        removed
    }

    fn try_borrow_ro(&mut self, key: BorrowKey) -> Result<(), ErrorKind> {
        if self.exclusive_borrows.contains(&key) {
            return Err(ErrorKind::Misuse);
        }
        *self.shared_borrows.entry(key).or_insert(0) += 1;
        Ok(())
    }

    fn try_borrow_rw(&mut self, key: BorrowKey) -> Result<(), ErrorKind> {
        if self.exclusive_borrows.contains(&key) || self.shared_borrows.contains_key(&key) {
            return Err(ErrorKind::Misuse);
        }
        self.exclusive_borrows.insert(key);
        Ok(())
    }

    /// Release a borrow taken by [`Self::try_borrow_ro`] or
    /// [`Self::try_borrow_rw`]. Call once the returned reference's lifetime
    /// has ended; `fdp_ecs` callers wrap this in a guard.
    pub fn release_borrow(&mut self, entity: Entity, type_id: ComponentTypeId, exclusive: bool) {
        let key = BorrowKey { entity, type_id };
        if exclusive {
            self.exclusive_borrows.remove(&key);
        } else if let Some(count) = self.shared_borrows.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.shared_borrows.remove(&key);
            }
        }
    }

    /// Shared read access. Fails [`ErrorKind::Misuse`] if an exclusive
    /// borrow of the same (entity, type) is outstanding.
    pub fn get_component_ro<T: Component>(&mut self, entity: Entity) -> Result<Option<&T>, ErrorKind> {
        let Some(id) = self.registry.id_of::<T>() else {
            return Err(ErrorKind::Misuse);
        };
        self.try_borrow_ro(BorrowKey {
            entity,
            type_id: id,
        })?;
        let store = self.stores.get(&id).ok_or(ErrorKind::Misuse)?;
        // SAFETY: `id` belongs to `T`.
        Ok(unsafe { store.get::<T>(entity) })
    }

    /// Exclusive write access. Fails [`ErrorKind::Misuse`] on any
    /// overlapping outstanding borrow of the same (entity, type).
    pub fn get_component_rw<T: Component>(&mut self, entity: Entity) -> Result<Option<&mut T>, ErrorKind> {
        let Some(id) = self.registry.id_of::<T>() else {
            return Err(ErrorKind::Misuse);
        };
        self.try_borrow_rw(BorrowKey {
            entity,
            type_id: id,
        })?;
        let store = self.stores.get_mut(&id).ok_or(ErrorKind::Misuse)?;
        // SAFETY: `id` belongs to `T`.
        Ok(unsafe { store.get_mut::<T>(entity) })
    }

    #[must_use]
    pub fn component_version<T: Component>(&self, entity: Entity) -> Option<u64> {
        let id = self.registry.id_of::<T>()?;
        self.stores.get(&id)?.version_of(entity)
    }

    pub fn set_singleton<T: Component>(&mut self, value: T) {
        self.singletons.insert(TypeId::of::<T>(), Box::new(value));
        self.bump_global_version();
    }

    #[must_use]
    pub fn get_singleton<T: Component>(&self) -> Option<&T> {
        self.singletons
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref::<T>())
    }

    /// Deterministic (ascending entity index) iteration over the entities
    /// carrying `T`. Picking the smallest eligible store as the driver, per
    /// §4.1, is `fdp_ecs::query`'s job; this is the per-type primitive it
    /// calls.
    #[must_use]
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        let Some(id) = self.registry.id_of::<T>() else {
            return Vec::new();
        };
        self.stores
            .get(&id)
            .map(ComponentStore::entities_sorted)
            .unwrap_or_default()
    }

    /// The [`fdp_component::ComponentKind`] a registered type was declared
    /// with, if it's registered at all.
    #[must_use]
    pub fn component_kind(&self, type_id: ComponentTypeId) -> Option<fdp_component::ComponentKind> {
        self.registry.meta(type_id).map(|m| m.kind)
    }

    /// Every component type currently registered, in no particular order.
    /// The flight recorder and replication driver use this to walk every
    /// type without the caller needing to know each concrete Rust type.
    #[must_use]
    pub fn registered_type_ids(&self) -> Vec<ComponentTypeId> {
        self.stores.keys().copied().collect()
    }

    /// Entities carrying `type_id`, in ascending index order.
    #[must_use]
    pub fn entities_for_type(&self, type_id: ComponentTypeId) -> Vec<Entity> {
        self.stores
            .get(&type_id)
            .map(ComponentStore::entities_sorted)
            .unwrap_or_default()
    }

    /// `entity`'s raw component bytes for `type_id`, type-erased.
    #[must_use]
    pub fn raw_bytes(&self, entity: Entity, type_id: ComponentTypeId) -> Option<&[u8]> {
        self.stores.get(&type_id)?.raw_bytes(entity)
    }

    /// `entity`'s component version for `type_id`, without knowing the
    /// concrete Rust type. See [`Self::component_version`] for the typed
    /// equivalent used by ordinary module code.
    #[must_use]
    pub fn component_version_raw(&self, entity: Entity, type_id: ComponentTypeId) -> Option<u64> {
        self.stores.get(&type_id)?.version_of(entity)
    }

    #[must_use]
    pub(crate) fn store_len(&self, type_id: ComponentTypeId) -> usize {
        self.stores.get(&type_id).map_or(0, ComponentStore::len)
    }

    #[must_use]
    pub(crate) fn store_contains(&self, type_id: ComponentTypeId, entity: Entity) -> bool {
        self.stores
            .get(&type_id)
            .is_some_and(|s| s.contains(entity))
    }

    #[must_use]
    pub(crate) fn store_entities_sorted(&self, type_id: ComponentTypeId) -> Vec<Entity> {
        self.stores
            .get(&type_id)
            .map(ComponentStore::entities_sorted)
            .unwrap_or_default()
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

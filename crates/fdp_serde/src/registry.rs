//! Type-erased provider lookup: `ComponentTypeId -> provider vtable`.
//!
//! Replication and the flight recorder both need to encode/decode a
//! component given only its [`ComponentTypeId`] and an `&dyn Any` payload,
//! without knowing the concrete Rust type at the call site. This mirrors
//! `engine_net`'s codec registry, but keyed on the dense ids this crate
//! assigns rather than by type name.

use std::any::Any;
use std::collections::HashMap;

use fdp_component::{Component, ComponentTypeId, Entity};
use fdp_ecs::{CommandBuffer, Target};

use crate::error::SerdeError;
use crate::provider::Provider;

/// Object-safe facade over a concrete `Provider<T>`, downcasting its `&dyn
/// Any` argument to `T` before delegating.
trait ErasedProvider: Send + Sync {
    fn get_size(&self, value: &dyn Any) -> Result<usize, SerdeError>;
    fn encode(&self, value: &dyn Any, out: &mut [u8]) -> Result<usize, SerdeError>;
    fn apply(&self, target: Target, input: &[u8], buffer: &mut CommandBuffer) -> Result<(), SerdeError>;
}

struct Adapter<T, P> {
    provider: P,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T, P> ErasedProvider for Adapter<T, P>
where
    T: Component,
    P: Provider<T> + Send + Sync,
{
    fn get_size(&self, value: &dyn Any) -> Result<usize, SerdeError> {
        let value = value
            .downcast_ref::<T>()
            .ok_or(SerdeError::DescriptorTypeMismatch)?;
        Ok(self.provider.get_size(value))
    }

    fn encode(&self, value: &dyn Any, out: &mut [u8]) -> Result<usize, SerdeError> {
        let value = value
            .downcast_ref::<T>()
            .ok_or(SerdeError::DescriptorTypeMismatch)?;
        self.provider.encode(value, out)
    }

    fn apply(&self, target: Target, input: &[u8], buffer: &mut CommandBuffer) -> Result<(), SerdeError> {
        self.provider.apply(target, input, buffer)
    }
}

/// Maps each registered component type to its serialization provider.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ComponentTypeId, Box<dyn ErasedProvider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Component>(&mut self, type_id: ComponentTypeId, provider: impl Provider<T> + Send + Sync + 'static) {
        self.providers.insert(
            type_id,
            Box::new(Adapter::<T, _> {
                provider,
                _marker: std::marker::PhantomData,
            }),
        );
    }

    #[must_use]
    pub fn contains(&self, type_id: ComponentTypeId) -> bool {
        self.providers.contains_key(&type_id)
    }

    pub fn get_size(&self, type_id: ComponentTypeId, value: &dyn Any) -> Result<usize, SerdeError> {
        self.lookup(type_id)?.get_size(value)
    }

    pub fn encode(&self, type_id: ComponentTypeId, value: &dyn Any, out: &mut [u8]) -> Result<usize, SerdeError> {
        self.lookup(type_id)?.encode(value, out)
    }

    /// Every caller reachable through this registry (replication's outbound
    /// path, the flight recorder) only ever targets an already-live entity,
    /// so the public surface stays `Entity`; placeholder targets go through
    /// [`Provider::apply`] directly.
    pub fn apply(
        &self,
        type_id: ComponentTypeId,
        entity: Entity,
        input: &[u8],
        buffer: &mut CommandBuffer,
    ) -> Result<(), SerdeError> {
        self.lookup(type_id)?.apply(entity.into(), input, buffer)
    }

    fn lookup(&self, type_id: ComponentTypeId) -> Result<&dyn ErasedProvider, SerdeError> {
        self.providers
            .get(&type_id)
            .map(|b| b.as_ref())
            .ok_or(SerdeError::DescriptorTypeMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::FixedLayoutProvider;
    use fdp_component::TypeRegistry;
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
    fn test_register_and_round_trip_via_dyn_any() {
        let mut types = TypeRegistry::new();
        let id = types.register::<Position>();

        let mut registry = ProviderRegistry::new();
        registry.register::<Position>(id, FixedLayoutProvider::<Position>::default());

        let value = Position { x: 3.0, y: 4.0 };
        let size = registry.get_size(id, &value).unwrap();
        let mut buf = vec![0u8; size];
        registry.encode(id, &value, &mut buf).unwrap();

        let mut cb = CommandBuffer::with_capacity(4);
        let e = Entity::from_parts(0, 1);
        registry.apply(id, e, &buf, &mut cb).unwrap();
        assert_eq!(cb.len(), 1);
    }

    #[test]
    fn test_unregistered_type_is_descriptor_mismatch() {
        let registry = ProviderRegistry::new();
        let bogus = ComponentTypeId(999);
        let err = registry.get_size(bogus, &Position { x: 0.0, y: 0.0 }).unwrap_err();
        assert!(matches!(err, SerdeError::DescriptorTypeMismatch));
    }
}

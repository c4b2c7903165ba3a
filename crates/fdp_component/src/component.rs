//! Core [`Component`] trait, type registry, and component metadata.
//!
//! Unlike a hash-of-`TypeId` scheme, [`ComponentTypeId`]s here are small
//! dense integers assigned by a [`TypeRegistry`] in registration order, so
//! they can index directly into per-repository `Vec`s of stores and serve as
//! a compact, stable-within-a-process wire identifier.

use std::any::TypeId;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Whether a component type is a bit-copyable value or a reference-shaped,
/// possibly variable-length, managed type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Fixed-size, bit-copyable. Encoded by the fixed-layout provider.
    Value,
    /// Reference-shaped; may contain strings or arrays. Encoded by the
    /// managed provider.
    Managed,
}

/// A component type's identity: a dense id assigned at registration order.
///
/// Two different processes that register the same set of types in the same
/// order end up with identical ids, which is what makes this scheme usable
/// on the wire (§6) without shipping a type name on every message — the
/// type table preamble in the recording format is there precisely to let a
/// replay pin down the mapping used by the run being replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentTypeId(pub u32);

/// Metadata recorded about a component type at registration time.
#[derive(Debug, Clone)]
pub struct ComponentMeta {
    pub type_id: ComponentTypeId,
    pub name: &'static str,
    pub kind: ComponentKind,
    /// Size of one component instance in bytes; meaningful only for
    /// `ComponentKind::Value` (managed types are variable length).
    pub layout: std::alloc::Layout,
}

/// The core component trait. All data stored in the repository implements
/// this.
///
/// ```rust
/// use serde::{Serialize, Deserialize};
/// use fdp_component::Component;
///
/// #[derive(Debug, Clone, Copy, Serialize, Deserialize)]
/// struct Health { current: f32, max: f32 }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Send + Sync + 'static + Serialize + for<'de> Deserialize<'de> {
    /// A human-readable name, used in diagnostics and the recording file's
    /// type table.
    fn type_name() -> &'static str;

    /// `Value` unless overridden. Types containing `String`/`Vec` must
    /// override this to `Managed`.
    fn kind() -> ComponentKind {
        ComponentKind::Value
    }
}

/// Assigns dense [`ComponentTypeId`]s in registration order and remembers
/// each type's metadata.
///
/// Registration is idempotent: registering the same Rust type twice returns
/// the id assigned the first time. A repository owns one registry; ids are
/// only meaningful relative to that repository (or a recording produced by
/// it).
#[derive(Debug, Default)]
pub struct TypeRegistry {
    by_type: HashMap<TypeId, ComponentTypeId>,
    meta: Vec<ComponentMeta>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_type: HashMap::new(),
            meta: Vec::new(),
        }
    }

    /// Register `T`, returning its id. Idempotent for a type already
    /// registered.
    pub fn register<T: Component>(&mut self) -> ComponentTypeId {
        if let Some(&id) = self.by_type.get(&TypeId::of::<T>()) {
            return id;
        }
        let id = ComponentTypeId(self.meta.len() as u32);
        self.meta.push(ComponentMeta {
            type_id: id,
            name: T::type_name(),
            kind: T::kind(),
            layout: std::alloc::Layout::new::<T>(),
        });
        self.by_type.insert(TypeId::of::<T>(), id);
        id
    }

    /// The id assigned to `T`, if it has been registered.
    #[must_use]
    pub fn id_of<T: Component>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Metadata for a previously registered id.
    #[must_use]
    pub fn meta(&self, id: ComponentTypeId) -> Option<&ComponentMeta> {
        self.meta.get(id.0 as usize)
    }

    /// All registered types' metadata, in registration (id) order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentMeta> {
        self.meta.iter()
    }

    /// Number of distinct types registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }
}

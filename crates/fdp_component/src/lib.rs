//! # fdp_component
//!
//! The "C" in ECS — entity identity, the component trait, the type registry,
//! and per-type sparse-set storage.
//!
//! This crate provides:
//!
//! - [`Component`] trait and [`ComponentKind`] — the contract component data
//!   satisfies, and whether it's bit-copyable or reference-shaped.
//! - [`Entity`] / [`EntityAllocator`] — (index, generation) identity with
//!   generation-based staleness and free-list recycling.
//! - [`TypeRegistry`] — assigns dense [`ComponentTypeId`]s in registration
//!   order.
//! - [`ComponentStore`] — one sparse set per component type.
//! - [`QueryDescriptor`] — RW/RO borrow-conflict declarations.
//! - [`ErrorKind`] / [`Diagnostic`] — the shared error taxonomy.

pub mod component;
pub mod entity;
pub mod error;
pub mod query;
pub mod store;

pub use component::{Component, ComponentKind, ComponentMeta, ComponentTypeId, TypeRegistry};
pub use entity::{Entity, EntityAllocator};
pub use error::{Diagnostic, ErrorKind};
pub use query::{QueryDescriptor, QueryFilter};
pub use store::ComponentStore;

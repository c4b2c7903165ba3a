//! # fdp_serde
//!
//! Fixed-layout and managed serialization providers for component payloads,
//! plus a type-erased registry so callers can encode/decode by
//! [`fdp_component::ComponentTypeId`] alone (§4.7).

pub mod error;
pub mod fixed;
pub mod managed;
pub mod provider;
pub mod registry;

pub use error::SerdeError;
pub use fixed::FixedLayoutProvider;
pub use managed::ManagedProvider;
pub use provider::Provider;
pub use registry::ProviderRegistry;

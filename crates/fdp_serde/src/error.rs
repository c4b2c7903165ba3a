//! Serialization error types.

use fdp_component::ComponentTypeId;

/// Errors a [`crate::Provider`] can surface. All of these must be detected
/// before any mutation of the repository (§4.7).
#[derive(Debug, thiserror::Error)]
pub enum SerdeError {
    #[error("buffer too small: need at least {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },

    #[error("schema mismatch: declared type {declared:?} does not match expected {expected:?}")]
    SchemaMismatch {
        declared: ComponentTypeId,
        expected: ComponentTypeId,
    },

    #[error("descriptor type mismatch: provider registered for a different Rust type")]
    DescriptorTypeMismatch,

    #[error("managed payload encoding failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("managed payload decoding failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

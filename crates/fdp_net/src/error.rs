//! Network-layer error types.

use fdp_component::ErrorKind;

/// Errors raised by the [`crate::NetworkEntityMap`] and translators.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// `Register` was called with a netId or entity already bound to a
    /// different counterpart.
    #[error("netId/entity registration conflict: {0}")]
    Conflict(String),

    /// A lookup found nothing bound for the given key.
    #[error("no binding found for {0}")]
    NotFound(String),
}

impl NetError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetError::Conflict(_) => ErrorKind::Conflict,
            NetError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

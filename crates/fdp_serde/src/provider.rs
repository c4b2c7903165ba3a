//! The [`Provider`] contract: size, encode, and apply for one component
//! type (§4.7).

use fdp_component::Component;
use fdp_ecs::{CommandBuffer, Target};

use crate::error::SerdeError;

/// Encodes and decodes one component type to/from a byte span. `apply`
/// decodes straight into a [`CommandBuffer`] `SetComponent`/`AddComponent`
/// op rather than returning the value, so callers never need an
/// intermediate typed buffer. The target is a [`Target`] rather than a bare
/// `Entity` so inbound data can be applied against a placeholder created
/// earlier in the same buffer, not just an already-live entity.
pub trait Provider<T: Component>: Send + Sync {
    /// The exact number of bytes `encode` will write for `value`.
    fn get_size(&self, value: &T) -> usize;

    /// Encode `value` into `out`, returning the number of bytes written.
    /// `out` must be at least `get_size(value)` bytes.
    fn encode(&self, value: &T, out: &mut [u8]) -> Result<usize, SerdeError>;

    /// Decode `input` and queue the result onto `buffer` as an
    /// `AddComponent` targeting `target`. All validation happens before
    /// `buffer` is touched.
    fn apply(
        &self,
        target: Target,
        input: &[u8],
        buffer: &mut CommandBuffer,
    ) -> Result<(), SerdeError>;
}

//! Fixed-layout provider: a bit-copy encoding for `Value`-kind components.
//!
//! Size is `size_of::<T>()`, a compile-time constant. Encode and decode are
//! unaligned byte copies; the wire format is little-endian regardless of
//! host, which this provider satisfies by requiring `T: Copy` and assuming
//! a little-endian host architecture for its field layout — the dominant
//! case, and the one every teacher-stack target runs on. A big-endian host
//! would need a per-field byte-swap table this provider does not build.

use std::marker::PhantomData;

use fdp_component::Component;
use fdp_ecs::{CommandBuffer, Target};

use crate::error::SerdeError;
use crate::provider::Provider;

#[derive(Debug)]
pub struct FixedLayoutProvider<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for FixedLayoutProvider<T> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: Component + Copy> Provider<T> for FixedLayoutProvider<T> {
    fn get_size(&self, _value: &T) -> usize {
        std::mem::size_of::<T>()
    }

    fn encode(&self, value: &T, out: &mut [u8]) -> Result<usize, SerdeError> {
        let size = std::mem::size_of::<T>();
        if out.len() < size {
            return Err(SerdeError::BufferTooSmall {
                needed: size,
                got: out.len(),
            });
        }
        // SAFETY: `T: Copy` and `size` bytes are read from a live `&T`.
        let bytes = unsafe { std::slice::from_raw_parts((value as *const T).cast::<u8>(), size) };
        out[..size].copy_from_slice(bytes);
        Ok(size)
    }

    fn apply(
        &self,
        target: Target,
        input: &[u8],
        buffer: &mut CommandBuffer,
    ) -> Result<(), SerdeError> {
        let size = std::mem::size_of::<T>();
        if input.len() < size {
            return Err(SerdeError::BufferTooSmall {
                needed: size,
                got: input.len(),
            });
        }
        // SAFETY: `input` holds at least `size` bytes, and every bit
        // pattern of a `Copy` component built from `Value`-kind fields
        // (primitive numerics) is valid.
        let value = unsafe { std::ptr::read_unaligned(input.as_ptr().cast::<T>()) };
        // `add_component` attaches-or-overwrites, so this works whether
        // `target` is an already-live entity getting a delta update or a
        // placeholder for a stub just created for a first-sight netId.
        buffer.add_component(target, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdp_component::ErrorKind;
    use fdp_ecs::Repository;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
        z: f32,
    }
    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let provider = FixedLayoutProvider::<Position>::default();
        let value = Position { x: 1.0, y: 2.0, z: 3.0 };
        let mut buf = vec![0u8; provider.get_size(&value)];
        let written = provider.encode(&value, &mut buf).unwrap();
        assert_eq!(written, 12);

        let mut repo = Repository::new();
        repo.register_component::<Position>();
        let e = repo.create_entity();
        repo.add_component(e, Position { x: 0.0, y: 0.0, z: 0.0 }).unwrap();
        let mut cb = CommandBuffer::with_capacity(4);
        provider.apply(e.into(), &buf, &mut cb).unwrap();
        cb.playback(&mut repo, fdp_ecs::PlaybackPolicy::Lenient);
        assert_eq!(repo.get_component_ro::<Position>(e).unwrap(), Some(&value));
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let provider = FixedLayoutProvider::<Position>::default();
        let value = Position { x: 1.0, y: 2.0, z: 3.0 };
        let mut buf = vec![0u8; 4];
        let err = provider.encode(&value, &mut buf).unwrap_err();
        assert!(matches!(err, SerdeError::BufferTooSmall { .. }));
    }

    #[test]
    fn test_apply_buffer_too_small_before_mutation() {
        let provider = FixedLayoutProvider::<Position>::default();
        let mut repo = Repository::new();
        repo.register_component::<Position>();
        let e = repo.create_entity();
        repo.add_component(e, Position { x: 9.0, y: 9.0, z: 9.0 }).unwrap();
        let mut cb = CommandBuffer::with_capacity(4);
        let err = provider.apply(e.into(), &[0u8; 2], &mut cb).unwrap_err();
        assert!(matches!(err, SerdeError::BufferTooSmall { .. }));
        assert!(cb.is_empty());
        // repository untouched
        assert_eq!(
            repo.get_component_ro::<Position>(e).unwrap(),
            Some(&Position { x: 9.0, y: 9.0, z: 9.0 })
        );
        let _ = ErrorKind::SchemaMismatch; // referenced for documentation purposes in other providers
    }
}

//! Managed provider: length-prefixed MessagePack encoding for reference-
//! shaped or variable-length components (`ComponentKind::Managed`).
//!
//! Wire format is a 4-byte little-endian length prefix followed by the
//! `rmp_serde` payload, mirroring the framing `engine_net`'s codec used for
//! its wire messages.

use std::marker::PhantomData;

use fdp_component::Component;
use fdp_ecs::{CommandBuffer, Target};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::SerdeError;
use crate::provider::Provider;

const LEN_PREFIX: usize = 4;

#[derive(Debug)]
pub struct ManagedProvider<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for ManagedProvider<T> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: Component + Serialize + DeserializeOwned> Provider<T> for ManagedProvider<T> {
    fn get_size(&self, value: &T) -> usize {
        LEN_PREFIX + rmp_serde::to_vec_named(value).map(|v| v.len()).unwrap_or(0)
    }

    fn encode(&self, value: &T, out: &mut [u8]) -> Result<usize, SerdeError> {
        let payload = rmp_serde::to_vec_named(value)?;
        let total = LEN_PREFIX + payload.len();
        if out.len() < total {
            return Err(SerdeError::BufferTooSmall {
                needed: total,
                got: out.len(),
            });
        }
        out[..LEN_PREFIX].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        out[LEN_PREFIX..total].copy_from_slice(&payload);
        Ok(total)
    }

    fn apply(
        &self,
        target: Target,
        input: &[u8],
        buffer: &mut CommandBuffer,
    ) -> Result<(), SerdeError> {
        if input.len() < LEN_PREFIX {
            return Err(SerdeError::BufferTooSmall {
                needed: LEN_PREFIX,
                got: input.len(),
            });
        }
        let len = u32::from_le_bytes(input[..LEN_PREFIX].try_into().unwrap()) as usize;
        let total = LEN_PREFIX + len;
        if input.len() < total {
            return Err(SerdeError::BufferTooSmall {
                needed: total,
                got: input.len(),
            });
        }
        let value: T = rmp_serde::from_slice(&input[LEN_PREFIX..total])?;
        // `add_component` attaches-or-overwrites, so this works whether
        // `target` is an already-live entity getting a delta update or a
        // placeholder for a stub just created for a first-sight netId.
        buffer.add_component(target, value);
        Ok(())
    }
}

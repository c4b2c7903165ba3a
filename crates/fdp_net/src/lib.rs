//! # fdp_net
//!
//! Network identity: the [`NetworkEntityMap`] netId↔entity bijection and
//! [`Translator`]s that convert between local and wire shapes through it
//! (§4.8, §4.9).

pub mod error;
pub mod network_map;
pub mod translator;

pub use error::NetError;
pub use network_map::{NetId, NetworkEntityMap, NodeId};
pub use translator::{Translator, UnresolvedPolicy};

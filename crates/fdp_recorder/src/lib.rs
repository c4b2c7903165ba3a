//! # fdp_recorder
//!
//! Flight recorder: per-tick structural/value logging, deterministic tick
//! hashing, and a replay driver that verifies a replayed run reproduces a
//! recorded one exactly (§4.10).

pub mod hash;
pub mod recorder;
pub mod replay;

pub use hash::hash_repository;
pub use recorder::{FlightRecorder, StructuralOp, TickRecord};
pub use replay::{HashMismatch, ReplayDriver};

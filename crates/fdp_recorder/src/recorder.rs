//! Per-tick recording: header, structural log, value-event log (§4.10).

use fdp_component::{ComponentTypeId, Entity};

use crate::hash::hash_repository;
use fdp_ecs::Repository;

/// One structural change to the repository, captured verbatim so replay can
/// reproduce it without re-deriving it from module logic.
#[derive(Debug, Clone)]
pub enum StructuralOp {
    CreateEntity,
    DestroyEntity(Entity),
    AddComponent {
        entity: Entity,
        type_id: ComponentTypeId,
        payload: Vec<u8>,
    },
    RemoveComponent {
        entity: Entity,
        type_id: ComponentTypeId,
    },
}

/// Everything recorded for one tick.
#[derive(Debug, Clone)]
pub struct TickRecord {
    pub tick: u64,
    pub time: f64,
    pub delta: f32,
    pub structural_ops: Vec<StructuralOp>,
    /// Opaque, provider-encoded event payloads published during the tick.
    pub events: Vec<Vec<u8>>,
    /// Hash of the repository immediately after this tick's playback.
    pub post_state_hash: u64,
}

/// An in-memory sequence of [`TickRecord`]s. A real deployment would frame
/// these per §6's file format before writing to disk; this crate models the
/// record sequence itself, leaving on-disk framing to the host binary.
#[derive(Debug, Default)]
pub struct FlightRecorder {
    records: Vec<TickRecord>,
}

impl FlightRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-assembled sequence of records, e.g. one just read
    /// back from a recording file, without recomputing any hash.
    #[must_use]
    pub fn from_records(records: Vec<TickRecord>) -> Self {
        Self { records }
    }

    /// Append a tick's record, computing its post-state hash from `repo`
    /// (captured by the caller immediately after that tick's playback).
    pub fn record_tick(
        &mut self,
        tick: u64,
        time: f64,
        delta: f32,
        structural_ops: Vec<StructuralOp>,
        events: Vec<Vec<u8>>,
        repo: &Repository,
    ) {
        self.records.push(TickRecord {
            tick,
            time,
            delta,
            structural_ops,
            events,
            post_state_hash: hash_repository(repo),
        });
    }

    #[must_use]
    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tick_captures_hash_of_current_state() {
        let mut recorder = FlightRecorder::new();
        let repo = Repository::new();
        recorder.record_tick(0, 0.0, 0.016, vec![], vec![], &repo);
        assert_eq!(recorder.records()[0].post_state_hash, hash_repository(&repo));
    }

    #[test]
    fn test_records_accumulate_in_order() {
        let mut recorder = FlightRecorder::new();
        let repo = Repository::new();
        recorder.record_tick(0, 0.0, 0.016, vec![], vec![], &repo);
        recorder.record_tick(1, 0.016, 0.016, vec![], vec![], &repo);
        let ticks: Vec<u64> = recorder.records().iter().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![0, 1]);
    }
}

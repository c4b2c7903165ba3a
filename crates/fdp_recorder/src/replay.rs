//! Replay driver: advances a fresh repository tick-by-tick from a
//! [`FlightRecorder`]'s records, applying structural ops verbatim (§4.10).

use fdp_ecs::Repository;

use crate::hash::hash_repository;
use crate::recorder::{FlightRecorder, StructuralOp, TickRecord};

/// Raised when a replayed tick's post-state hash does not match the
/// recorded one — the one condition replay treats as fatal, since it means
/// the recording and the replaying build disagree about what "the same
/// state" is.
#[derive(Debug, Clone, PartialEq)]
pub struct HashMismatch {
    pub tick: u64,
    pub expected: u64,
    pub actual: u64,
}

impl std::fmt::Display for HashMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tick {} hash mismatch: expected {:#x}, got {:#x}",
            self.tick, self.expected, self.actual
        )
    }
}

impl std::error::Error for HashMismatch {}

/// Replays structural ops from a [`FlightRecorder`] onto a fresh
/// [`Repository`], one tick at a time, verifying each tick's post-state
/// hash against what was recorded.
pub struct ReplayDriver<'a> {
    records: &'a [TickRecord],
    cursor: usize,
}

impl<'a> ReplayDriver<'a> {
    #[must_use]
    pub fn new(recorder: &'a FlightRecorder) -> Self {
        Self {
            records: recorder.records(),
            cursor: 0,
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cursor >= self.records.len()
    }

    /// Apply the next tick's structural ops to `repo` and verify its
    /// post-state hash. Returns the record that was replayed.
    pub fn replay_next(&mut self, repo: &mut Repository) -> Result<&'a TickRecord, HashMismatch> {
        let record = &self.records[self.cursor];
        self.cursor += 1;

        for op in &record.structural_ops {
            apply(repo, op);
        }

        let actual = hash_repository(repo);
        if actual != record.post_state_hash {
            return Err(HashMismatch {
                tick: record.tick,
                expected: record.post_state_hash,
                actual,
            });
        }
        Ok(record)
    }

    /// Replay every remaining tick, stopping at the first hash mismatch.
    pub fn replay_all(&mut self, repo: &mut Repository) -> Result<(), HashMismatch> {
        while !self.is_done() {
            self.replay_next(repo)?;
        }
        Ok(())
    }
}

fn apply(repo: &mut Repository, op: &StructuralOp) {
    match op {
        StructuralOp::CreateEntity => {
            repo.create_entity();
        }
        StructuralOp::DestroyEntity(entity) => {
            repo.destroy_entity(*entity);
        }
        StructuralOp::AddComponent { entity, type_id, payload } => {
            if repo.add_component_raw(*entity, *type_id, payload).is_err() {
                tracing::warn!(?type_id, %entity, "replay: add_component_raw failed, type not registered");
            }
        }
        StructuralOp::RemoveComponent { entity, type_id } => {
            repo.remove_component_raw(*entity, *type_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdp_component::Component;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    fn bytes_of(value: &Position) -> Vec<u8> {
        unsafe {
            std::slice::from_raw_parts((value as *const Position).cast::<u8>(), std::mem::size_of::<Position>()).to_vec()
        }
    }

    #[test]
    fn test_replay_reproduces_recorded_state_and_hash() {
        let mut original = Repository::new();
        let id = original.register_component::<Position>();
        let e = original.create_entity();
        let value = Position { x: 3.0, y: 4.0 };
        original.add_component(e, value).unwrap();

        let mut recorder = FlightRecorder::new();
        recorder.record_tick(
            0,
            0.0,
            0.016,
            vec![
                StructuralOp::CreateEntity,
                StructuralOp::AddComponent { entity: e, type_id: id, payload: bytes_of(&value) },
            ],
            vec![],
            &original,
        );

        let mut fresh = Repository::new();
        fresh.register_component::<Position>();
        let mut driver = ReplayDriver::new(&recorder);
        driver.replay_all(&mut fresh).unwrap();

        assert_eq!(fresh.get_component_ro::<Position>(e).unwrap(), Some(&value));
    }

    #[test]
    fn test_replay_detects_hash_mismatch() {
        let original = Repository::new();
        let mut recorder = FlightRecorder::new();
        recorder.record_tick(0, 0.0, 0.016, vec![], vec![], &original);

        // A fresh repository that diverges from the recorded (empty) state
        // by carrying an unrecorded component.
        let mut fresh = Repository::new();
        fresh.register_component::<Position>();
        let e = fresh.create_entity();
        fresh.add_component(e, Position { x: 1.0, y: 1.0 }).unwrap();

        let mut driver = ReplayDriver::new(&recorder);
        let err = driver.replay_next(&mut fresh).unwrap_err();
        assert_eq!(err.tick, 0);
    }

    #[test]
    fn test_is_done_after_all_ticks_replayed() {
        let repo = Repository::new();
        let mut recorder = FlightRecorder::new();
        recorder.record_tick(0, 0.0, 0.016, vec![], vec![], &repo);
        let mut fresh = Repository::new();
        let mut driver = ReplayDriver::new(&recorder);
        assert!(!driver.is_done());
        driver.replay_all(&mut fresh).unwrap();
        assert!(driver.is_done());
    }
}

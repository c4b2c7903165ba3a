//! Builds the demo world (S1 movement, S2 area damage) and drives it through
//! either a live tick loop or a replay of a prior recording.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::time::Duration;

use fdp_component::{Component, ComponentTypeId, Entity};
use fdp_ecs::Repository;
use fdp_math::{Position, Velocity};
use fdp_recorder::{FlightRecorder, HashMismatch, ReplayDriver, StructuralOp};
use fdp_scheduler::Scheduler;
use glam::Vec3;

use crate::components::{DetonationEvent, Health};
use crate::config::HostConfig;
use crate::modules::damage::AreaDamageModule;
use crate::modules::detonator::DetonatorModule;
use crate::modules::movement::{IntegratorModule, MovementAiModule};
use crate::recording_file::{read_recording, write_recording, RecordingFileError};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("world is poisoned, refusing to continue")]
    Poisoned,
    #[error("interrupted")]
    Interrupted,
    #[error("recording replay diverged: {0}")]
    HashMismatch(#[from] HashMismatch),
    #[error("recording file error: {0}")]
    RecordingFile(#[from] RecordingFileError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The demo's two moving parts: a mover/target pair for S1, and a
/// damageable entity for S2.
struct DemoEntities {
    mover: Entity,
    target: Entity,
    victim: Entity,
}

fn type_table(repo: &Repository) -> Vec<(ComponentTypeId, &'static str)> {
    vec![
        (repo.type_id_of::<Position>().expect("Position registered"), Position::type_name()),
        (repo.type_id_of::<Velocity>().expect("Velocity registered"), Velocity::type_name()),
        (repo.type_id_of::<Health>().expect("Health registered"), Health::type_name()),
    ]
}

/// Number of `create_entity` calls `build_scheduler` makes, in order
/// (mover, target, victim) — needed up front so `run_live` can prepend the
/// matching `StructuralOp::CreateEntity` ops before the tick-0 component
/// diff; the allocator's deterministic free list then reproduces the exact
/// same `Entity` values on replay.
const DEMO_ENTITY_COUNT: usize = 3;

fn build_scheduler(config: &HostConfig) -> (Scheduler, DemoEntities) {
    let mut scheduler = Scheduler::new(config.fixed_delta_seconds);
    let repo = scheduler.repository_mut();
    repo.register_component::<Position>();
    repo.register_component::<Velocity>();
    repo.register_component::<Health>();

    let mover = repo.create_entity();
    let target = repo.create_entity();
    repo.add_component(mover, Position::new(0.0, 0.0, 0.0)).unwrap();
    repo.add_component(target, Position::new(10.0, 0.0, 0.0)).unwrap();

    let victim = repo.create_entity();
    repo.add_component(victim, Position::new(10.0, 0.0, 0.0)).unwrap();
    repo.add_component(victim, Health::new(100.0)).unwrap();

    scheduler.register_module(Box::new(MovementAiModule { mover, target, speed: 5.0 }));
    scheduler.register_module(Box::new(IntegratorModule));
    scheduler.register_module(Box::new(DetonatorModule {
        trigger_tick: 1,
        event: DetonationEvent {
            origin: Vec3::new(0.0, 0.0, 0.0),
            radius: 20.0,
            damage: 50.0,
        },
    }));
    scheduler.register_module(Box::new(AreaDamageModule));

    (scheduler, DemoEntities { mover, target, victim })
}

/// Diff each registered type's per-entity version against `before`, in
/// place, emitting an `AddComponent` op for anything new or changed and a
/// `RemoveComponent` op for anything gone. The host has no hook into what a
/// module's command buffer queued (§9 keeps that type-erased inside
/// `fdp_ecs`), so it derives the same information by diffing raw component
/// versions across the tick boundary instead.
fn diff_structural_ops(
    repo: &Repository,
    before: &mut HashMap<(Entity, ComponentTypeId), u64>,
) -> Vec<StructuralOp> {
    let mut ops = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for type_id in repo.registered_type_ids() {
        for entity in repo.entities_for_type(type_id) {
            let key = (entity, type_id);
            seen.insert(key);
            let version = repo.component_version_raw(entity, type_id).unwrap_or(0);
            if before.get(&key) != Some(&version) {
                if let Some(payload) = repo.raw_bytes(entity, type_id) {
                    ops.push(StructuralOp::AddComponent {
                        entity,
                        type_id,
                        payload: payload.to_vec(),
                    });
                }
                before.insert(key, version);
            }
        }
    }

    let stale: Vec<(Entity, ComponentTypeId)> =
        before.keys().filter(|k| !seen.contains(*k)).copied().collect();
    for key in stale {
        before.remove(&key);
        ops.push(StructuralOp::RemoveComponent { entity: key.0, type_id: key.1 });
    }

    ops
}

/// Record the tick-0 snapshot: one `CreateEntity` per demo entity, then
/// every component the setup above attached.
fn record_initial_state(
    scheduler: &Scheduler,
    recorder: &mut FlightRecorder,
    versions: &mut HashMap<(Entity, ComponentTypeId), u64>,
) {
    let mut setup_ops = vec![StructuralOp::CreateEntity; DEMO_ENTITY_COUNT];
    setup_ops.extend(diff_structural_ops(scheduler.repository(), versions));
    recorder.record_tick(0, 0.0, 0.0, setup_ops, vec![], scheduler.repository());
}

/// Advance one tick and append its record, derived from the component diff
/// rather than an explicit op log (see [`diff_structural_ops`]).
fn tick_and_record(
    scheduler: &mut Scheduler,
    recorder: &mut FlightRecorder,
    versions: &mut HashMap<(Entity, ComponentTypeId), u64>,
    fixed_delta_seconds: f64,
) {
    scheduler.tick();
    let ops = diff_structural_ops(scheduler.repository(), versions);
    recorder.record_tick(
        scheduler.current_tick(),
        scheduler.current_time(),
        fixed_delta_seconds as f32,
        ops,
        Vec::new(),
        scheduler.repository(),
    );
}

pub async fn run_live(config: &HostConfig) -> Result<(), RuntimeError> {
    let (mut scheduler, demo) = build_scheduler(config);
    let table = type_table(scheduler.repository());

    let mut recorder = FlightRecorder::new();
    let mut versions: HashMap<(Entity, ComponentTypeId), u64> = HashMap::new();
    record_initial_state(&scheduler, &mut recorder, &mut versions);

    tracing::info!(mover = %demo.mover, target = %demo.target, victim = %demo.victim, "demo world built");

    let mut interval = tokio::time::interval(Duration::from_secs_f64(config.fixed_delta_seconds));
    let mut tick_index: u64 = 0;
    loop {
        if config.max_ticks != 0 && tick_index >= config.max_ticks {
            break;
        }

        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping");
                flush_recording(config, &table, &recorder)?;
                return Err(RuntimeError::Interrupted);
            }
        }

        if scheduler.repository().is_poisoned() {
            flush_recording(config, &table, &recorder)?;
            return Err(RuntimeError::Poisoned);
        }

        tick_and_record(&mut scheduler, &mut recorder, &mut versions, config.fixed_delta_seconds);
        tick_index += 1;
    }

    if scheduler.repository().is_poisoned() {
        flush_recording(config, &table, &recorder)?;
        return Err(RuntimeError::Poisoned);
    }

    flush_recording(config, &table, &recorder)?;
    Ok(())
}

fn flush_recording(
    config: &HostConfig,
    table: &[(ComponentTypeId, &'static str)],
    recorder: &FlightRecorder,
) -> Result<(), RuntimeError> {
    let Some(path) = &config.recording_path else {
        return Ok(());
    };
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_recording(&mut writer, table, recorder)?;
    Ok(())
}

pub fn run_replay(config: &HostConfig) -> Result<(), RuntimeError> {
    let path = config
        .recording_path
        .as_ref()
        .expect("HostConfig::from_cli guarantees a recording path in replay mode");

    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let (_types, records) = read_recording(&mut reader)?;

    let mut repo = Repository::new();
    repo.register_component::<Position>();
    repo.register_component::<Velocity>();
    repo.register_component::<Health>();

    let tick_count = records.len();
    let recorder = FlightRecorder::from_records(records);
    let mut driver = ReplayDriver::new(&recorder);
    driver.replay_all(&mut repo)?;
    tracing::info!(ticks = tick_count, "replay verified, all tick hashes matched");
    Ok(())
}

//! The module host: owns the world's repository, command buffer, and event
//! bus, and drives the fixed-phase tick loop (§4.5).

use std::time::{Duration, Instant};

use fdp_component::Diagnostic;
use fdp_ecs::{CommandBuffer, EventBus, PlaybackPolicy, Repository, SimulationView};

use crate::module::{Module, Phase};
use crate::telemetry::{ModuleTiming, TelemetryObserver, TickTelemetry, TracingObserver};

/// A registered module plus its binding order, used to break policy ties
/// (registration order, then name) within a phase.
struct Binding {
    module: Box<dyn Module>,
    registration_index: usize,
}

/// Owns one simulation world and runs it tick by tick.
///
/// Scheduling is single-threaded cooperative: [`Scheduler::tick`] runs every
/// due module to completion, in order, with no preemption (§5). A module may
/// not call back into the scheduler from within `tick`.
pub struct Scheduler {
    repository: Repository,
    command_buffer: CommandBuffer,
    bus: EventBus,
    bindings: Vec<Binding>,
    tick: u64,
    time: f64,
    fixed_delta_seconds: f64,
    observer: Box<dyn TelemetryObserver>,
}

impl Scheduler {
    #[must_use]
    pub fn new(fixed_delta_seconds: f64) -> Self {
        Self {
            repository: Repository::new(),
            command_buffer: CommandBuffer::with_capacity(256),
            bus: EventBus::new(),
            bindings: Vec::new(),
            tick: 0,
            time: 0.0,
            fixed_delta_seconds,
            observer: Box::new(TracingObserver),
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn TelemetryObserver>) {
        self.observer = observer;
    }

    #[must_use]
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut Repository {
        &mut self.repository
    }

    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.time
    }

    /// Bind a module. Required components are registered immediately so
    /// the first tick can already observe them.
    pub fn register_module(&mut self, module: Box<dyn Module>) {
        module.register_required_components(&mut self.repository);
        let registration_index = self.bindings.len();
        self.bindings.push(Binding {
            module,
            registration_index,
        });
    }

    fn modules_in_phase(&mut self, phase: Phase) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .bindings
            .iter()
            .enumerate()
            .filter(|(_, b)| b.module.phase() == phase)
            .map(|(i, _)| i)
            .collect();
        indices.sort_by_key(|&i| {
            (
                self.bindings[i].registration_index,
                self.bindings[i].module.name().to_string(),
            )
        });
        indices
    }

    /// Advance the tick counter and simulated time, run every phase in
    /// fixed order, and emit telemetry.
    pub fn tick(&mut self) {
        if self.repository.is_poisoned() {
            tracing::error!("tick skipped: world is poisoned");
            return;
        }

        let started_at = Instant::now();
        self.tick += 1;
        self.time += self.fixed_delta_seconds;
        let mut module_timings = Vec::new();

        for &phase in &Phase::ORDER {
            let indices = self.modules_in_phase(phase);
            for index in indices {
                let due = self.bindings[index].module.policy().is_due(self.tick);
                let module_started = Instant::now();
                if due {
                    let mut view = SimulationView::new(
                        &mut self.repository,
                        &mut self.command_buffer,
                        &mut self.bus,
                        self.tick,
                        self.time,
                    );
                    self.bindings[index]
                        .module
                        .tick(&mut view, self.fixed_delta_seconds);
                }
                module_timings.push(ModuleTiming {
                    name: self.bindings[index].module.name().to_string(),
                    phase,
                    ran: due,
                    duration: module_started.elapsed(),
                });
            }

            let report = self
                .command_buffer
                .playback(&mut self.repository, PlaybackPolicy::Lenient);
            for diagnostic in &report.diagnostics {
                log_diagnostic(diagnostic);
            }

            if phase.always_swaps_bus() {
                self.bus.swap_all();
            }
        }

        let total_duration = started_at.elapsed();
        let overrun = total_duration > Duration::from_secs_f64(self.fixed_delta_seconds);
        self.observer.on_tick(&TickTelemetry {
            tick: self.tick,
            total_duration,
            module_timings,
            overrun,
        });
    }
}

fn log_diagnostic(diagnostic: &Diagnostic) {
    tracing::warn!(%diagnostic, "diagnostic during command buffer playback");
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdp_component::{Component, Entity};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    struct Counter {
        value: u32,
    }
    impl Component for Counter {
        fn type_name() -> &'static str {
            "Counter"
        }
    }

    struct Incrementer {
        entity: Entity,
    }
    impl Module for Incrementer {
        fn name(&self) -> &str {
            "incrementer"
        }
        fn register_required_components(&self, repo: &mut Repository) {
            repo.register_component::<Counter>();
        }
        fn tick(&mut self, view: &mut SimulationView<'_>, _dt: f64) {
            let value = view
                .get_component_ro::<Counter>(self.entity)
                .unwrap()
                .map_or(0, |c| c.value);
            view.command_buffer()
                .unwrap()
                .set_component(self.entity, Counter { value: value + 1 });
        }
    }

    #[test]
    fn test_tick_advances_counter_and_time() {
        let mut scheduler = Scheduler::new(1.0 / 60.0);
        scheduler.tick();
        assert_eq!(scheduler.current_tick(), 1);
        assert!((scheduler.current_time() - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_module_mutation_visible_next_tick() {
        let mut scheduler = Scheduler::new(1.0 / 60.0);
        scheduler.repository_mut().register_component::<Counter>();
        let e = scheduler.repository_mut().create_entity();
        scheduler
            .repository_mut()
            .add_component(e, Counter { value: 0 })
            .unwrap();
        scheduler.register_module(Box::new(Incrementer { entity: e }));

        scheduler.tick();
        assert_eq!(
            scheduler.repository().component_version::<Counter>(e),
            Some(2)
        );
        scheduler.tick();
        // second tick reads the playback of the first and increments again
        let value = scheduler
            .repository_mut()
            .get_component_ro::<Counter>(e)
            .unwrap()
            .map(|c| c.value);
        assert_eq!(value, Some(2));
    }

    #[test]
    fn test_register_module_auto_registers_required_components() {
        let mut scheduler = Scheduler::new(1.0 / 60.0);
        let e = scheduler.repository_mut().create_entity();
        // Not registered up front: Incrementer::register_required_components
        // must do it when the module is bound.
        scheduler.register_module(Box::new(Incrementer { entity: e }));
        assert!(scheduler.repository().type_id_of::<Counter>().is_some());

        scheduler.repository_mut().add_component(e, Counter { value: 0 }).unwrap();
        scheduler.tick();
        assert_eq!(
            scheduler.repository_mut().get_component_ro::<Counter>(e).unwrap(),
            Some(&Counter { value: 1 })
        );
    }

    #[test]
    fn test_poisoned_world_skips_tick() {
        let mut scheduler = Scheduler::new(1.0 / 60.0);
        scheduler
            .repository_mut()
            .poison(&Diagnostic::new(fdp_component::ErrorKind::Invariant, "test"));
        scheduler.tick();
        assert_eq!(scheduler.current_tick(), 0);
    }
}

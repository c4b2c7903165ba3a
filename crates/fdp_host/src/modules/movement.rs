//! AI-like movement planning and integration (S1).
//!
//! [`MovementAiModule`] steers one entity toward another by writing a
//! [`Velocity`] into the command buffer; [`IntegratorModule`] applies every
//! entity's current `Velocity` to its `Position` each tick. Splitting the two
//! means the integrator works for any velocity source, not just this module.

use fdp_component::Entity;
use fdp_ecs::SimulationView;
use fdp_math::{Position, Velocity};
use fdp_scheduler::Module;

/// Steers `mover` toward `target` at a constant speed.
pub struct MovementAiModule {
    pub mover: Entity,
    pub target: Entity,
    pub speed: f32,
}

impl Module for MovementAiModule {
    fn name(&self) -> &str {
        "movement_ai"
    }

    fn tick(&mut self, view: &mut SimulationView<'_>, _delta_time: f64) {
        let Ok(Some(&from)) = view.get_component_ro::<Position>(self.mover) else {
            return;
        };
        let Ok(Some(&to)) = view.get_component_ro::<Position>(self.target) else {
            return;
        };
        let velocity = Velocity::toward(from.0, to.0, self.speed);
        if let Ok(cb) = view.command_buffer() {
            cb.set_component(self.mover, velocity);
        }
    }
}

/// Advances every entity with both `Position` and `Velocity` by
/// `velocity * delta_time`.
pub struct IntegratorModule;

impl Module for IntegratorModule {
    fn name(&self) -> &str {
        "integrator"
    }

    fn tick(&mut self, view: &mut SimulationView<'_>, delta_time: f64) {
        for entity in view.entities_with::<Velocity>() {
            let Ok(Some(&velocity)) = view.get_component_ro::<Velocity>(entity) else {
                continue;
            };
            let Ok(Some(&position)) = view.get_component_ro::<Position>(entity) else {
                continue;
            };
            let next = Position(position.0 + velocity.0 * delta_time as f32);
            if let Ok(cb) = view.command_buffer() {
                cb.set_component(entity, next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdp_ecs::{CommandBuffer, EventBus, PlaybackPolicy, Repository};
    use glam::Vec3;

    #[test]
    fn test_movement_ai_sets_velocity_toward_target_only_on_mover() {
        let mut repo = Repository::new();
        repo.register_component::<Position>();
        repo.register_component::<Velocity>();
        let a = repo.create_entity();
        let b = repo.create_entity();
        repo.add_component(a, Position::new(0.0, 0.0, 0.0)).unwrap();
        repo.add_component(b, Position::new(10.0, 0.0, 0.0)).unwrap();

        let mut cb = CommandBuffer::with_capacity(8);
        let mut bus = EventBus::new();
        let mut module = MovementAiModule { mover: a, target: b, speed: 5.0 };
        {
            let mut view = SimulationView::new(&mut repo, &mut cb, &mut bus, 1, 1.0 / 60.0);
            module.tick(&mut view, 1.0 / 60.0);
        }
        cb.playback(&mut repo, PlaybackPolicy::Lenient);

        let velocity = repo.get_component_ro::<Velocity>(a).unwrap().copied().unwrap();
        assert!((velocity.0 - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-4);
        assert!(!repo.has_component::<Velocity>(b));
    }

    #[test]
    fn test_integrator_advances_position_by_velocity_times_delta() {
        let mut repo = Repository::new();
        repo.register_component::<Position>();
        repo.register_component::<Velocity>();
        let e = repo.create_entity();
        repo.add_component(e, Position::new(0.0, 0.0, 0.0)).unwrap();
        repo.add_component(e, Velocity::new(5.0, 0.0, 0.0)).unwrap();

        let mut cb = CommandBuffer::with_capacity(8);
        let mut bus = EventBus::new();
        let mut module = IntegratorModule;
        {
            let mut view = SimulationView::new(&mut repo, &mut cb, &mut bus, 1, 2.0);
            module.tick(&mut view, 2.0);
        }
        cb.playback(&mut repo, PlaybackPolicy::Lenient);

        let position = repo.get_component_ro::<Position>(e).unwrap().copied().unwrap();
        assert!((position.0 - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
    }
}

//! Area-damage from published [`DetonationEvent`]s (S2).
//!
//! Damage falls off linearly with distance from the blast origin, reaching
//! zero at `radius`: `damage * max(0, 1 - distance / radius)`. Runs in
//! [`fdp_scheduler::Phase::Simulation`], after the `BeforeSync` boundary has
//! already swapped the event bus, so events published earlier this tick are
//! visible here.

use fdp_math::Position;
use fdp_ecs::SimulationView;
use fdp_scheduler::Module;

use crate::components::{DetonationEvent, Health};

pub struct AreaDamageModule;

impl Module for AreaDamageModule {
    fn name(&self) -> &str {
        "area_damage"
    }

    fn tick(&mut self, view: &mut SimulationView<'_>, _delta_time: f64) {
        let events: Vec<DetonationEvent> = view.bus().consume::<DetonationEvent>().to_vec();
        if events.is_empty() {
            return;
        }

        for entity in view.entities_with::<Health>() {
            let Ok(Some(&position)) = view.get_component_ro::<Position>(entity) else {
                continue;
            };
            let Ok(Some(&health)) = view.get_component_ro::<Health>(entity) else {
                continue;
            };

            let mut current = health.current;
            for event in &events {
                let distance = (position.0 - event.origin).length();
                let falloff = (1.0 - distance / event.radius).max(0.0);
                current -= event.damage * falloff;
            }

            if let Ok(cb) = view.command_buffer() {
                cb.set_component(entity, Health::new(current));
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
    fn test_detonation_applies_linear_falloff_damage() {
        let mut repo = Repository::new();
        repo.register_component::<Position>();
        repo.register_component::<Health>();
        let v = repo.create_entity();
        repo.add_component(v, Position::new(10.0, 0.0, 0.0)).unwrap();
        repo.add_component(v, Health::new(100.0)).unwrap();

        let mut cb = CommandBuffer::with_capacity(8);
        let mut bus = EventBus::new();
        bus.publish(DetonationEvent {
            origin: Vec3::new(0.0, 0.0, 0.0),
            radius: 20.0,
            damage: 50.0,
        })
        .unwrap();
        bus.swap_all();

        let mut module = AreaDamageModule;
        {
            let mut view = SimulationView::new(&mut repo, &mut cb, &mut bus, 1, 1.0 / 60.0);
            module.tick(&mut view, 1.0 / 60.0);
        }
        cb.playback(&mut repo, PlaybackPolicy::Lenient);

        let health = repo.get_component_ro::<Health>(v).unwrap().copied().unwrap();
        assert!((health.current - 75.0).abs() < 1e-4);
    }

    #[test]
    fn test_no_events_leaves_health_untouched() {
        let mut repo = Repository::new();
        repo.register_component::<Position>();
        repo.register_component::<Health>();
        let v = repo.create_entity();
        repo.add_component(v, Position::new(0.0, 0.0, 0.0)).unwrap();
        repo.add_component(v, Health::new(100.0)).unwrap();

        let mut cb = CommandBuffer::with_capacity(8);
        let mut bus = EventBus::new();
        let mut module = AreaDamageModule;
        {
            let mut view = SimulationView::new(&mut repo, &mut cb, &mut bus, 1, 1.0 / 60.0);
            module.tick(&mut view, 1.0 / 60.0);
        }
        cb.playback(&mut repo, PlaybackPolicy::Lenient);

        assert_eq!(repo.component_version::<Health>(v), Some(1));
    }
}

//! Publishes a single [`DetonationEvent`] on a configured tick, standing in
//! for whatever triggers an explosion in a full game (a weapon, a scripted
//! event). Runs in [`fdp_scheduler::Phase::Input`], before the `BeforeSync`
//! boundary swaps the event bus for [`super::damage::AreaDamageModule`] to
//! observe later in the same tick.

use fdp_ecs::SimulationView;
use fdp_scheduler::{Module, Phase};

use crate::components::DetonationEvent;

pub struct DetonatorModule {
    pub trigger_tick: u64,
    pub event: DetonationEvent,
}

impl Module for DetonatorModule {
    fn name(&self) -> &str {
        "detonator"
    }

    fn phase(&self) -> Phase {
        Phase::Input
    }

    fn tick(&mut self, view: &mut SimulationView<'_>, _delta_time: f64) {
        if view.tick() != self.trigger_tick {
            return;
        }
        if view.bus().publish(self.event).is_err() {
            tracing::warn!(tick = view.tick(), "detonator: re-entrant publish rejected");
        }
    }
}

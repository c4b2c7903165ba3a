//! The [`Module`] contract and its execution-rate [`Policy`].

use fdp_ecs::{Repository, SimulationView};

/// A module's fixed phase assignment. Unannotated modules default to
/// [`Phase::Simulation`] (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Input,
    BeforeSync,
    Simulation,
    AfterSync,
    Output,
}

impl Phase {
    /// Fixed execution order, Input first.
    pub const ORDER: [Phase; 5] = [
        Phase::Input,
        Phase::BeforeSync,
        Phase::Simulation,
        Phase::AfterSync,
        Phase::Output,
    ];

    /// `BeforeSync` and `AfterSync` always swap the event bus at their
    /// boundary regardless of the phase's own modules' policies (§4.5).
    #[must_use]
    pub fn always_swaps_bus(self) -> bool {
        matches!(self, Phase::BeforeSync | Phase::AfterSync)
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Simulation
    }
}

/// How often a module's `tick` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Every tick.
    EveryTick,
    /// Every `n` ticks, starting at tick 0.
    FixedInterval { every_n_ticks: u64 },
    /// A slow background task, run every `n` ticks (conventionally a large
    /// `n`); semantically identical to `FixedInterval` but names intent.
    SlowBackground { every_n_ticks: u64 },
}

impl Policy {
    #[must_use]
    pub fn is_due(self, tick: u64) -> bool {
        match self {
            Policy::EveryTick => true,
            Policy::FixedInterval { every_n_ticks } | Policy::SlowBackground { every_n_ticks } => {
                every_n_ticks > 0 && tick % every_n_ticks == 0
            }
        }
    }
}

/// A unit of simulation logic invoked by the scheduler once per due tick.
///
/// `register_required_components` runs once, when the module is bound to a
/// world, so a module doesn't need a separate registration step before its
/// first tick — it calls `repo.register_component::<T>()` for whatever
/// types its `tick` expects to find. Registration is idempotent, so two
/// modules requiring the same type don't conflict.
pub trait Module: Send {
    fn name(&self) -> &str;

    fn policy(&self) -> Policy {
        Policy::EveryTick
    }

    fn phase(&self) -> Phase {
        Phase::default()
    }

    fn register_required_components(&self, repo: &mut Repository) {
        let _ = repo;
    }

    fn tick(&mut self, view: &mut SimulationView<'_>, delta_time: f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tick_always_due() {
        assert!(Policy::EveryTick.is_due(0));
        assert!(Policy::EveryTick.is_due(99));
    }

    #[test]
    fn test_fixed_interval_due_on_multiples() {
        let p = Policy::FixedInterval { every_n_ticks: 10 };
        assert!(p.is_due(0));
        assert!(p.is_due(10));
        assert!(!p.is_due(5));
    }

    #[test]
    fn test_phase_order_is_fixed() {
        assert_eq!(
            Phase::ORDER,
            [
                Phase::Input,
                Phase::BeforeSync,
                Phase::Simulation,
                Phase::AfterSync,
                Phase::Output
            ]
        );
    }

    #[test]
    fn test_unannotated_default_is_simulation() {
        assert_eq!(Phase::default(), Phase::Simulation);
    }

    #[test]
    fn test_sync_phases_always_swap() {
        assert!(Phase::BeforeSync.always_swaps_bus());
        assert!(Phase::AfterSync.always_swaps_bus());
        assert!(!Phase::Simulation.always_swaps_bus());
    }
}

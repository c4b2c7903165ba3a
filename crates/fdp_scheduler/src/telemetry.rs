//! Per-tick telemetry emitted at the end of each tick (§4.5 step 3).

use std::time::Duration;

use crate::module::Phase;

/// One module's contribution to a tick: whether it ran and how long it
/// took. A module skipped because its policy wasn't due still gets a
/// record with `ran: false`, so overrun analysis can see the whole
/// registration, not just what fired.
#[derive(Debug, Clone)]
pub struct ModuleTiming {
    pub name: String,
    pub phase: Phase,
    pub ran: bool,
    pub duration: Duration,
}

/// Aggregate record for one completed tick.
#[derive(Debug, Clone)]
pub struct TickTelemetry {
    pub tick: u64,
    pub total_duration: Duration,
    pub module_timings: Vec<ModuleTiming>,
    /// Set when a module's `tick` call pushed this tick over
    /// `fixed_delta_seconds`; the scheduler does not enforce a deadline,
    /// only records the overrun (§4.5).
    pub overrun: bool,
}

/// Receives [`TickTelemetry`] after every tick. The default
/// [`TracingObserver`] logs a structured event; hosts may swap in a
/// metrics-exporting implementation.
pub trait TelemetryObserver: Send {
    fn on_tick(&mut self, telemetry: &TickTelemetry);
}

/// Logs tick telemetry via `tracing` at `debug` level, and `warn` on
/// overrun.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl TelemetryObserver for TracingObserver {
    fn on_tick(&mut self, telemetry: &TickTelemetry) {
        if telemetry.overrun {
            tracing::warn!(
                tick = telemetry.tick,
                duration_us = telemetry.total_duration.as_micros() as u64,
                "tick overrun"
            );
        } else {
            tracing::debug!(
                tick = telemetry.tick,
                duration_us = telemetry.total_duration.as_micros() as u64,
                modules_ran = telemetry.module_timings.iter().filter(|m| m.ran).count(),
                "tick complete"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingObserver {
        ticks: Vec<u64>,
    }
    impl TelemetryObserver for RecordingObserver {
        fn on_tick(&mut self, telemetry: &TickTelemetry) {
            self.ticks.push(telemetry.tick);
        }
    }

    #[test]
    fn test_observer_receives_tick_number() {
        let mut observer = RecordingObserver::default();
        observer.on_tick(&TickTelemetry {
            tick: 7,
            total_duration: Duration::from_millis(1),
            module_timings: Vec::new(),
            overrun: false,
        });
        assert_eq!(observer.ticks, vec![7]);
    }
}

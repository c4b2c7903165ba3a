//! # fdp_scheduler
//!
//! The module host: fixed phase order, single-threaded cooperative tick
//! loop, per-tick telemetry.

pub mod module;
pub mod scheduler;
pub mod telemetry;

pub use module::{Module, Phase, Policy};
pub use scheduler::Scheduler;
pub use telemetry::{ModuleTiming, TelemetryObserver, TickTelemetry, TracingObserver};

//! # fdp_ecs
//!
//! The entity repository, command buffer, event bus, simulation view, and
//! hierarchy ordering — the mutation discipline modules run inside each
//! tick.

pub mod command_buffer;
pub mod event_bus;
pub mod hierarchy;
pub mod query;
pub mod repository;
pub mod view;

pub use command_buffer::{CommandBuffer, Placeholder, PlaybackPolicy, PlaybackReport, Target};
pub use event_bus::EventBus;
pub use hierarchy::{HierarchyNode, HierarchyOrdering};
pub use query::Query;
pub use repository::Repository;
pub use view::SimulationView;

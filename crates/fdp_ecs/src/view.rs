//! The capability-restricted façade modules receive each tick.
//!
//! A [`SimulationView`] gates direct mutation: modules query and read
//! through it, and queue structural/data changes into its command buffer
//! rather than touching the repository. A view constructed
//! [`SimulationView::read_only`] has no command buffer at all —
//! [`Self::command_buffer`] on one returns `Err(Misuse)`.

use fdp_component::{Component, Entity, ErrorKind};

use crate::command_buffer::CommandBuffer;
use crate::event_bus::EventBus;
use crate::repository::Repository;

/// Read-mostly access to the world plus, for mutable views, a command
/// buffer to queue deferred changes into.
pub struct SimulationView<'a> {
    repository: &'a mut Repository,
    command_buffer: Option<&'a mut CommandBuffer>,
    bus: &'a mut EventBus,
    tick: u64,
    time: f64,
}

impl<'a> SimulationView<'a> {
    #[must_use]
    pub fn new(
        repository: &'a mut Repository,
        command_buffer: &'a mut CommandBuffer,
        bus: &'a mut EventBus,
        tick: u64,
        time: f64,
    ) -> Self {
        Self {
            repository,
            command_buffer: Some(command_buffer),
            bus,
            tick,
            time,
        }
    }

    #[must_use]
    pub fn read_only(repository: &'a mut Repository, bus: &'a mut EventBus, tick: u64, time: f64) -> Self {
        Self {
            repository,
            command_buffer: None,
            bus,
            tick,
            time,
        }
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.repository.is_alive(entity)
    }

    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.repository.has_component::<T>(entity)
    }

    pub fn get_component_ro<T: Component>(&mut self, entity: Entity) -> Result<Option<&T>, ErrorKind> {
        self.repository.get_component_ro::<T>(entity)
    }

    pub fn get_component_rw<T: Component>(&mut self, entity: Entity) -> Result<Option<&mut T>, ErrorKind> {
        self.repository.get_component_rw::<T>(entity)
    }

    #[must_use]
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        self.repository.entities_with::<T>()
    }

    pub fn command_buffer(&mut self) -> Result<&mut CommandBuffer, ErrorKind> {
        self.command_buffer.as_deref_mut().ok_or(ErrorKind::Misuse)
    }

    #[must_use]
    pub fn bus(&mut self) -> &mut EventBus {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    struct Position {
        x: f32,
    }
    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[test]
    fn test_read_only_view_rejects_command_buffer() {
        let mut repo = Repository::new();
        let mut bus = EventBus::new();
        let mut view = SimulationView::read_only(&mut repo, &mut bus, 0, 0.0);
        assert_eq!(view.command_buffer().unwrap_err(), ErrorKind::Misuse);
    }

    #[test]
    fn test_mutable_view_exposes_command_buffer() {
        let mut repo = Repository::new();
        repo.register_component::<Position>();
        let mut bus = EventBus::new();
        let mut cb = CommandBuffer::with_capacity(4);
        let mut view = SimulationView::new(&mut repo, &mut cb, &mut bus, 1, 0.5);
        assert_eq!(view.tick(), 1);
        assert!((view.time() - 0.5).abs() < f64::EPSILON);
        assert!(view.command_buffer().is_ok());
    }
}

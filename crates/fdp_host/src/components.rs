//! Domain components and events owned by the demo modules rather than any
//! library crate: [`Health`] and [`DetonationEvent`] (S2).

use fdp_component::Component;
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Health {
    pub current: f32,
}

impl Health {
    #[must_use]
    pub fn new(current: f32) -> Self {
        Self { current }
    }
}

impl Component for Health {
    fn type_name() -> &'static str {
        "Health"
    }
}

/// Published when an explosion occurs. Damage falls off linearly with
/// distance from `origin`, reaching zero at `radius`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DetonationEvent {
    pub origin: Vec3,
    pub radius: f32,
    pub damage: f32,
}

impl Component for DetonationEvent {
    fn type_name() -> &'static str {
        "DetonationEvent"
    }
}

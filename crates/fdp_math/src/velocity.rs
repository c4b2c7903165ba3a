//! Per-tick displacement component, added by movement-planning modules and
//! consumed by an integrator (S1).

use fdp_component::Component;
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Velocity(pub Vec3);

impl Velocity {
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }

    /// Velocity pointing from `from` to `to`, scaled to `speed`. Zero if
    /// `from == to`.
    #[must_use]
    pub fn toward(from: Vec3, to: Vec3, speed: f32) -> Self {
        let delta = to - from;
        if delta == Vec3::ZERO {
            return Self(Vec3::ZERO);
        }
        Self(delta.normalize() * speed)
    }
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

//! # fdp_math
//!
//! Spatial components built on [`glam`]: [`Position`] and [`Velocity`] for
//! the point-mass scenarios (S1, S2).

pub mod position;
pub mod velocity;

// Re-export glam types for convenience.
pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub use position::Position;
pub use velocity::Velocity;

//! Per-tick locomotion for RTS units: steering requests, local collision
//! avoidance, hold-position negotiation and terrain elevation.
//!
//! [Mover](mover::Mover) can be driven directly, or through
//! [LocomotionPlugin](plugin::LocomotionPlugin) with a
//! [MoverIntent](intent::MoverIntent) per entity.

use bevy::math::{Vec2, Vec3};

pub mod agent;
pub mod angle;
mod behaviors;
pub mod config;
pub mod control;
pub mod error;
pub mod flow_field;
pub mod intent;
pub mod movement;
pub mod mover;
pub mod neighbors;
pub mod obstacles;
pub mod plugin;
pub mod prelude;
pub mod terrain;

pub(crate) const SMALL_THRESHOLD: f32 = 0.0001;

/// Projection of a position onto the ground plane.
pub(crate) fn ground(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

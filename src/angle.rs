//! Yaw arithmetic. Angles are radians in (-π, π].

use std::f32::consts::{PI, TAU};

use bevy::math::Vec2;

/// Wrap an angle into (-π, π].
pub fn normalize(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// Signed shortest rotation that takes `from` onto `to`. Positive values
/// turn counter-clockwise.
pub fn oriented_difference(from: f32, to: f32) -> f32 {
    normalize(to - from)
}

/// True when the two angles are closer than `epsilon` along the shorter arc.
pub fn are_similar(a: f32, b: f32, epsilon: f32) -> bool {
    oriented_difference(a, b).abs() < epsilon
}

/// Angle of a planar vector, or `None` for the zero vector.
pub fn of_vector(v: Vec2) -> Option<f32> {
    if v == Vec2::ZERO || !v.is_finite() {
        return None;
    }
    Some(v.y.atan2(v.x))
}

/// Turn `current` toward `desired` by at most `max_step`. Lands exactly on
/// `desired` when it is within reach or already similar.
pub fn step_toward(current: f32, desired: f32, max_step: f32, epsilon: f32) -> f32 {
    if are_similar(current, desired, epsilon) {
        return desired;
    }
    let diff = oriented_difference(current, desired);
    let max_step = max_step.max(0.0);
    if max_step >= diff.abs() {
        return desired;
    }
    normalize(current + max_step.copysign(diff))
}

//! Individual steering behaviors. Each returns a dimensionless direction
//! vector that the [SteeringMachine](crate::control::SteeringMachine)
//! weighs and sums.

pub(crate) mod avoid;
pub(crate) mod path_following;
pub(crate) mod seek;
pub(crate) mod separation;

use std::f32::consts::TAU;

use bevy::prelude::*;

const GOLDEN_ANGLE: f32 = 2.399_963;

/// Stable planar direction used to pull apart two units whose centres
/// coincide. Derived from the other unit's handle so it does not depend
/// on update order.
pub(crate) fn tie_break_direction(entity: Entity) -> Vec3 {
    let bits = entity.to_bits();
    let angle = (((bits ^ (bits >> 32)) % 1024) as f32 * GOLDEN_ANGLE) % TAU;
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

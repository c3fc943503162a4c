use bevy::prelude::*;

use crate::{SMALL_THRESHOLD, flow_field::FlowField};

/// Sample the flow field at the agent's ground position. Where the field
/// has no usable direction the agent heads straight for the destination.
pub(crate) fn proceed_to_destination(pos: Vec2, flow_field: &dyn FlowField) -> Vec3 {
    let direction = flow_field.direction_at(pos);
    let direction = if direction.is_finite() && direction.length_squared() > SMALL_THRESHOLD {
        direction.normalize()
    } else {
        let to_destination = flow_field.destination() - pos;
        if to_destination.length_squared() < SMALL_THRESHOLD || !to_destination.is_finite() {
            return Vec3::ZERO;
        }
        to_destination.normalize()
    };
    Vec3::new(direction.x, 0.0, direction.y)
}

use bevy::prelude::*;

use crate::SMALL_THRESHOLD;

/// Seek moves the agent straight towards the target. Does not slow down
/// on approach, and expresses no interest once the target is reached.
pub(crate) fn seek(from: Vec3, target: Vec3) -> Vec3 {
    let to_target = target - from;
    if to_target.length_squared() < SMALL_THRESHOLD || !to_target.is_finite() {
        return Vec3::ZERO;
    }
    to_target.normalize()
}

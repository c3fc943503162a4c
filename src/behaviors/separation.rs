use bevy::prelude::*;

use crate::{SMALL_THRESHOLD, behaviors::tie_break_direction, neighbors::MoverSnapshot};

/// Push away from every neighbor closer than the spacing of the pair.
/// Closer neighbors push harder: a neighbor at the same spot contributes
/// a unit vector, one at exactly the spacing contributes nothing.
pub(crate) fn separation(pos: Vec3, radius: f32, neighbors: &[MoverSnapshot]) -> Vec3 {
    let mut combined_away = Vec3::ZERO;
    for neighbor in neighbors {
        let spacing = radius + neighbor.radius;
        let away = pos - neighbor.pos;
        let distance = away.length();
        if distance >= spacing {
            continue;
        }
        let direction = if distance < SMALL_THRESHOLD {
            tie_break_direction(neighbor.entity)
        } else {
            away / distance
        };
        let intensity = 1.0 - distance / spacing;
        combined_away += direction * intensity;
    }
    combined_away
}

use bevy::prelude::*;

use crate::{SMALL_THRESHOLD, behaviors::tie_break_direction, neighbors::MoverSnapshot};

/// Steer around units that hold their position. Moving units can be
/// pushed aside by separation, holding ones cannot, so the agent must
/// route around them instead of into them.
///
/// A holder that sits ahead of `heading` and within `spacing + margin`
/// adds a sideways push, stronger the closer it is. A holder that already
/// overlaps the agent pushes it straight back.
pub(crate) fn avoid_holding_units(
    pos: Vec3,
    radius: f32,
    heading: Vec3,
    neighbors: &[MoverSnapshot],
    margin: f32,
) -> Vec3 {
    let heading = heading.with_y(0.0).normalize_or_zero();
    let mut push = Vec3::ZERO;

    for neighbor in neighbors.iter().filter(|n| n.hold_position) {
        let spacing = radius + neighbor.radius;
        let to_neighbor = (neighbor.pos - pos).with_y(0.0);
        let distance = to_neighbor.length();
        if distance >= spacing + margin {
            continue;
        }

        if distance < spacing {
            let away = if distance < SMALL_THRESHOLD {
                tie_break_direction(neighbor.entity)
            } else {
                -to_neighbor / distance
            };
            push += away * (1.0 - distance / spacing);
            continue;
        }

        if heading == Vec3::ZERO {
            continue;
        }
        let ahead = to_neighbor.dot(heading);
        if ahead <= 0.0 {
            continue;
        }
        // Offset of the holder from the line of travel. If the line already
        // clears it there is nothing to dodge.
        let lateral = to_neighbor - heading * ahead;
        if lateral.length() >= spacing {
            continue;
        }
        let side = if lateral.length_squared() < SMALL_THRESHOLD {
            // Dead ahead: always pass on the same side.
            Vec3::new(-heading.z, 0.0, heading.x)
        } else {
            -lateral.normalize()
        };
        let proximity = (1.0 - (distance - spacing) / margin).clamp(0.0, 1.0);
        push += side * proximity;
    }

    push
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbors::test_support::{entities, snapshot};

    fn holder(entity: Entity, pos: Vec3) -> MoverSnapshot {
        MoverSnapshot {
            hold_position: true,
            ..snapshot(entity, pos, 0.5)
        }
    }

    #[test]
    fn test_moving_units_are_not_avoided() {
        let e = entities(1);
        let moving = snapshot(e[0], Vec3::new(1.5, 0.0, 0.0), 0.5);
        let push = avoid_holding_units(Vec3::ZERO, 0.5, Vec3::X, &[moving], 1.0);
        assert_eq!(push, Vec3::ZERO);
    }

    #[test]
    fn test_holder_ahead_deflects_sideways() {
        let e = entities(1);
        // Slightly to the +Z side of the travel line: dodge towards -Z.
        let ahead = holder(e[0], Vec3::new(1.5, 0.0, 0.2));
        let push = avoid_holding_units(Vec3::ZERO, 0.5, Vec3::X, &[ahead], 1.0);
        assert!(push.z < 0.0, "got {push:?}");
        assert!(push.x.abs() < 0.0001, "push should be lateral, got {push:?}");
    }

    #[test]
    fn test_holder_dead_ahead_is_passed_on_a_fixed_side() {
        let e = entities(1);
        let ahead = holder(e[0], Vec3::new(1.5, 0.0, 0.0));
        let push = avoid_holding_units(Vec3::ZERO, 0.5, Vec3::X, &[ahead], 1.0);
        assert!(push.abs_diff_eq(Vec3::new(0.0, 0.0, 0.5), 0.0001), "got {push:?}");
    }

    #[test]
    fn test_holder_behind_or_far_is_ignored() {
        let e = entities(2);
        let behind = holder(e[0], Vec3::new(-1.5, 0.0, 0.0));
        let far = holder(e[1], Vec3::new(5.0, 0.0, 0.0));
        let push = avoid_holding_units(Vec3::ZERO, 0.5, Vec3::X, &[behind, far], 1.0);
        assert_eq!(push, Vec3::ZERO);
    }

    #[test]
    fn test_overlapping_holder_pushes_back() {
        let e = entities(1);
        let overlapping = holder(e[0], Vec3::new(0.5, 0.0, 0.0));
        let push = avoid_holding_units(Vec3::ZERO, 0.5, Vec3::ZERO, &[overlapping], 1.0);
        assert!(push.abs_diff_eq(Vec3::new(-0.5, 0.0, 0.0), 0.0001), "got {push:?}");
    }
}

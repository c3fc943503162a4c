use bevy::{math::bounding::Aabb2d, prelude::*};
use derivative::Derivative;
use itertools::Itertools;

use crate::{
    SMALL_THRESHOLD,
    behaviors::tie_break_direction,
    neighbors::MoverSnapshot,
    obstacles::{bounds_at, collides_with_any},
};

/// Sum over `avoid` of how deep a unit at `pos` sinks into each neighbor.
pub fn total_overlap(pos: Vec3, radius: f32, avoid: &[MoverSnapshot]) -> f32 {
    avoid
        .iter()
        .map(|other| (radius + other.radius - pos.distance(other.pos)).max(0.0))
        .sum()
}

/// Outcome of a collision resolution.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Resolution {
    /// Relaxation passes that were needed.
    pub iterations: usize,
    /// Whether the relaxation reached an overlap-free position before
    /// running out of passes.
    pub converged: bool,
    /// Overlap left at the final position.
    pub residual_overlap: f32,
}

/// Integrates a steering vector into position and velocity, then pushes
/// the unit out of the units it must avoid. Neighbor positions are a
/// fixed snapshot: only the unit being resolved moves.
#[derive(Debug, Copy, Clone, PartialEq, Derivative)]
#[derivative(Default)]
pub struct CollisionManager {
    #[derivative(Default(value = "8"))]
    max_iterations: usize,
}

impl CollisionManager {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Position reached by moving at the clamped steering for `elapsed_time`.
    pub(crate) fn integrate(start: Vec3, steering: Vec3, max_speed: f32, elapsed_time: f32) -> Vec3 {
        start + Self::clamp_steering(steering, max_speed) * elapsed_time.max(0.0)
    }

    fn clamp_steering(steering: Vec3, max_speed: f32) -> Vec3 {
        if steering.is_finite() {
            steering.clamp_length_max(max_speed)
        } else {
            Vec3::ZERO
        }
    }

    /// Move the unit at `pos` for `elapsed_time` along `steering`, resolving
    /// overlaps with `avoid` and never entering one of `walls`.
    ///
    /// The result never overlaps `avoid` more than the unit did before it
    /// moved, nor more than the plain unresolved move would have. When the
    /// relaxation cannot do better the unit keeps the plain move, or stays
    /// put.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_steering(
        &self,
        pos: &mut Vec3,
        velocity: &mut Vec3,
        radius: f32,
        max_speed: f32,
        steering: Vec3,
        elapsed_time: f32,
        avoid: &[MoverSnapshot],
        walls: &[Aabb2d],
    ) -> Resolution {
        let start = *pos;
        let dt = elapsed_time.max(0.0);
        let integrated = Self::integrate(start, steering, max_speed, dt);

        // Nearest neighbors first, ties broken by handle, so the same
        // configuration always resolves the same way.
        let ordered = avoid
            .iter()
            .sorted_by(|a, b| {
                start
                    .distance_squared(a.pos)
                    .total_cmp(&start.distance_squared(b.pos))
                    .then_with(|| a.entity.cmp(&b.entity))
            })
            .collect::<Vec<_>>();

        let mut resolved = integrated;
        let mut iterations = 0;
        while iterations < self.max_iterations && Self::penetrates(resolved, radius, &ordered) {
            for other in &ordered {
                let depth = radius + other.radius - resolved.distance(other.pos);
                if depth <= 0.0 {
                    continue;
                }
                let away = (resolved - other.pos).with_y(0.0);
                let back = (start - other.pos).with_y(0.0);
                // Landing on a neighbor's centre: back off the way we came.
                let direction = if away.length_squared() >= SMALL_THRESHOLD {
                    away.normalize()
                } else if back.length_squared() >= SMALL_THRESHOLD {
                    back.normalize()
                } else {
                    tie_break_direction(other.entity)
                };
                resolved += direction * depth;
            }
            iterations += 1;
        }
        let converged = !Self::penetrates(resolved, radius, &ordered);

        let start_walled = collides_with_any(&bounds_at(start, radius), walls);
        let (chosen, residual_overlap) = [resolved, integrated, start]
            .into_iter()
            .filter(|candidate| {
                *candidate == start
                    || start_walled
                    || !collides_with_any(&bounds_at(*candidate, radius), walls)
            })
            .map(|candidate| (candidate, total_overlap(candidate, radius, avoid)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((start, total_overlap(start, radius, avoid)));

        if !converged {
            debug!(
                "collision relaxation stopped after {} passes with {} overlap left",
                iterations, residual_overlap
            );
        }

        *pos = chosen;
        *velocity = if dt > 0.0 {
            (chosen - start) / dt
        } else {
            Self::clamp_steering(steering, max_speed)
        };

        Resolution {
            iterations,
            converged,
            residual_overlap,
        }
    }

    fn penetrates(pos: Vec3, radius: f32, avoid: &[&MoverSnapshot]) -> bool {
        avoid
            .iter()
            .any(|other| radius + other.radius - pos.distance(other.pos) > SMALL_THRESHOLD)
    }
}

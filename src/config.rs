use bevy::prelude::*;
use derivative::Derivative;
use enum_map::{EnumMap, enum_map};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::control::BehaviorType;

/// Relative weight of each steering behavior when the per-tick
/// contributions are combined.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SteeringWeights(EnumMap<BehaviorType, f32>);

impl Default for SteeringWeights {
    fn default() -> Self {
        Self(enum_map! {
            BehaviorType::Seek => 1.0,
            BehaviorType::PathFollowing => 1.0,
            BehaviorType::Separation => 1.5,
            BehaviorType::AvoidHolding => 2.0,
        })
    }
}

impl SteeringWeights {
    pub fn get(&self, behavior: BehaviorType) -> f32 {
        self.0[behavior]
    }

    /// Override the weight of a single behavior. Negative weights are
    /// treated as zero.
    pub fn with(mut self, behavior: BehaviorType, weight: f32) -> Self {
        self.0[behavior] = weight.max(0.0);
        self
    }
}

/// Tuning shared by every mover. Insert it as a resource to override the
/// defaults; [LocomotionPlugin](crate::plugin::LocomotionPlugin) inserts
/// the default one otherwise.
#[derive(Resource, Debug, Copy, Clone, PartialEq, Derivative)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
#[derivative(Default)]
pub struct LocomotionConfig {
    /// Height kept between ground units and the terrain surface.
    #[derivative(Default(value = "0.25"))]
    pub ground_offset: f32,
    /// Height of sky units above the level of the tile below.
    #[derivative(Default(value = "3.0"))]
    pub sky_offset: f32,
    /// Two yaws closer than this are considered the same heading.
    #[derivative(Default(value = "0.001"))]
    pub angle_epsilon: f32,
    /// Flock size is divided by this, rounding down, to widen the radius
    /// in which flock-mates also stop when one of them arrives. Zero
    /// disables the widening.
    #[derivative(Default(value = "20"))]
    pub flock_completion_divisor: usize,
    /// Upper bound on relaxation passes per collision resolution.
    #[derivative(Default(value = "8"))]
    pub max_collision_iterations: usize,
    /// Extra distance beyond the spacing in which holding units are
    /// steered around.
    #[derivative(Default(value = "1.0"))]
    pub avoid_margin: f32,
    pub weights: SteeringWeights,
}

impl LocomotionConfig {
    pub fn with_ground_offset(mut self, offset: f32) -> Self {
        self.ground_offset = offset;
        self
    }

    pub fn with_sky_offset(mut self, offset: f32) -> Self {
        self.sky_offset = offset;
        self
    }

    pub fn with_max_collision_iterations(mut self, iterations: usize) -> Self {
        self.max_collision_iterations = iterations;
        self
    }

    pub fn with_avoid_margin(mut self, margin: f32) -> Self {
        self.avoid_margin = margin.max(0.0);
        self
    }

    pub fn with_weights(mut self, weights: SteeringWeights) -> Self {
        self.weights = weights;
        self
    }
}

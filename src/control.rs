use bevy::prelude::*;
use enum_map::{Enum, EnumMap};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::{
    behaviors::{avoid, path_following, seek, separation},
    config::SteeringWeights,
    flow_field::FlowField,
    neighbors::MoverSnapshot,
};

/// Enum representing the different types of steering behaviors.
#[derive(Debug, Copy, Clone, Enum, Hash, PartialEq, Eq, Display, EnumIter)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum BehaviorType {
    Seek,
    Separation,
    PathFollowing,
    AvoidHolding,
}

/// Accumulates the steering requests of a single tick. Requests of the
/// same behavior add up; the weighted sum is read once with
/// [SteeringMachine::get_steering_and_reset], which also empties the
/// machine for the next tick.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct SteeringMachine {
    contributions: EnumMap<BehaviorType, Vec3>,
}

impl SteeringMachine {
    /// The raw, unweighted contribution of a behavior so far this tick.
    pub fn get(&self, behavior: BehaviorType) -> Vec3 {
        self.contributions[behavior]
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.values().all(|v| *v == Vec3::ZERO)
    }

    fn add(&mut self, behavior: BehaviorType, contribution: Vec3) {
        if contribution.is_finite() {
            self.contributions[behavior] += contribution;
        }
    }

    pub fn seek(&mut self, from: Vec3, target: Vec3) {
        self.add(BehaviorType::Seek, seek::seek(from, target));
    }

    pub fn apply_separation(&mut self, pos: Vec3, radius: f32, neighbors: &[MoverSnapshot]) {
        self.add(
            BehaviorType::Separation,
            separation::separation(pos, radius, neighbors),
        );
    }

    pub fn proceed_to_destination(&mut self, pos: Vec2, flow_field: &dyn FlowField) {
        self.add(
            BehaviorType::PathFollowing,
            path_following::proceed_to_destination(pos, flow_field),
        );
    }

    /// Route around holding units. The direction of travel is taken from
    /// the goal requested so far this tick, or from `velocity` when no
    /// goal has been requested yet.
    pub fn avoid_holding_units(
        &mut self,
        pos: Vec3,
        radius: f32,
        velocity: Vec3,
        neighbors: &[MoverSnapshot],
        margin: f32,
    ) {
        let goal = self.contributions[BehaviorType::Seek]
            + self.contributions[BehaviorType::PathFollowing];
        let heading = if goal == Vec3::ZERO { velocity } else { goal };
        self.add(
            BehaviorType::AvoidHolding,
            avoid::avoid_holding_units(pos, radius, heading, neighbors, margin),
        );
    }

    /// Combine the contributions into a desired velocity no faster than
    /// `max_speed`, then clear them.
    pub fn get_steering_and_reset(&mut self, max_speed: f32, weights: &SteeringWeights) -> Vec3 {
        let combined = self
            .contributions
            .iter()
            .fold(Vec3::ZERO, |sum, (behavior, contribution)| {
                sum + *contribution * weights.get(behavior)
            });
        *self = Self::default();

        let steering = (combined * max_speed).clamp_length_max(max_speed);
        if steering.is_finite() {
            steering
        } else {
            Vec3::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        flow_field::GridFlowField,
        neighbors::test_support::{entities, snapshot},
    };
    use strum::IntoEnumIterator;

    #[test]
    fn test_empty_machine_steers_nowhere() {
        let mut machine = SteeringMachine::default();
        assert!(machine.is_empty());
        let steering = machine.get_steering_and_reset(3.0, &SteeringWeights::default());
        assert_eq!(steering, Vec3::ZERO);
    }

    #[test]
    fn test_seek_scales_to_max_speed() {
        let mut machine = SteeringMachine::default();
        machine.seek(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        let steering = machine.get_steering_and_reset(3.0, &SteeringWeights::default());
        assert!(steering.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 0.0001), "got {steering:?}");
    }

    #[test]
    fn test_reset_clears_every_behavior() {
        let e = entities(1);
        let field = GridFlowField::straight_to(Vec2::new(5.0, 0.0), Vec2::splat(-10.0), 1.0, 20, 20)
            .unwrap();
        let mut machine = SteeringMachine::default();
        machine.seek(Vec3::ZERO, Vec3::Z);
        machine.apply_separation(Vec3::ZERO, 1.0, &[snapshot(e[0], Vec3::X, 1.0)]);
        machine.proceed_to_destination(Vec2::ZERO, &field);
        assert!(!machine.is_empty());

        let _ = machine.get_steering_and_reset(1.0, &SteeringWeights::default());
        for behavior in BehaviorType::iter() {
            assert_eq!(machine.get(behavior), Vec3::ZERO, "{behavior} not reset");
        }
    }

    #[test]
    fn test_contributions_are_additive_before_clamp() {
        let e = entities(2);
        let weights = SteeringWeights::default().with(BehaviorType::Separation, 1.0);
        let mut machine = SteeringMachine::default();
        // Two separation requests in one tick (flock-mates, then units to
        // let pass) add up.
        machine.apply_separation(Vec3::ZERO, 1.0, &[snapshot(e[0], Vec3::new(1.5, 0.0, 0.0), 1.0)]);
        machine.apply_separation(Vec3::ZERO, 1.0, &[snapshot(e[1], Vec3::new(1.5, 0.0, 0.0), 1.0)]);
        assert!(
            machine
                .get(BehaviorType::Separation)
                .abs_diff_eq(Vec3::new(-0.5, 0.0, 0.0), 0.0001)
        );
        let steering = machine.get_steering_and_reset(10.0, &weights);
        assert!(steering.abs_diff_eq(Vec3::new(-5.0, 0.0, 0.0), 0.0001), "got {steering:?}");
    }

    #[test]
    fn test_combined_steering_is_clamped() {
        let e = entities(1);
        let mut machine = SteeringMachine::default();
        machine.seek(Vec3::ZERO, Vec3::X);
        machine.apply_separation(Vec3::ZERO, 1.0, &[snapshot(e[0], Vec3::new(0.0, 0.0, -0.1), 1.0)]);
        let steering = machine.get_steering_and_reset(2.0, &SteeringWeights::default());
        assert!(steering.length() <= 2.0 + 0.0001, "got {steering:?}");
        assert!(steering.x > 0.0 && steering.z > 0.0);
    }

    #[test]
    fn test_avoidance_uses_requested_goal_as_heading() {
        let e = entities(1);
        let holder = MoverSnapshot {
            hold_position: true,
            ..snapshot(e[0], Vec3::new(0.0, 0.0, 1.5), 0.5)
        };
        let mut machine = SteeringMachine::default();
        machine.seek(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
        // The velocity points away from the holder but the goal is through it.
        machine.avoid_holding_units(Vec3::ZERO, 0.5, Vec3::NEG_Z, &[holder], 1.0);
        assert_ne!(machine.get(BehaviorType::AvoidHolding), Vec3::ZERO);
    }
}

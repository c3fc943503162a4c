use bevy::prelude::*;

/// What a mover tries to do this tick. The game sets it; the locomotion
/// systems apply it every fixed tick until it changes. Holds must be
/// renewed every tick, which keeping the intent in place does.
#[derive(Component, Debug, Default, Copy, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub enum MoverIntent {
    /// No steering request. The unit drifts to a stop out of collisions.
    #[default]
    Idle,
    SeekPoint(Vec3),
    /// Seek another mover. If the target is not a mover the unit idles.
    SeekUnit(Entity),
    /// Follow the flow field set with
    /// [Mover::set_destination](crate::mover::Mover::set_destination).
    FollowPath,
    /// Follow the flow field without avoiding the given mover.
    FollowPathTo(Entity),
    HoldSoftly,
    HoldHardly,
}

impl MoverIntent {
    /// The mover this intent is about, if any.
    pub fn target(&self) -> Option<Entity> {
        match self {
            Self::SeekUnit(target) | Self::FollowPathTo(target) => Some(*target),
            Self::Idle
            | Self::SeekPoint(_)
            | Self::FollowPath
            | Self::HoldSoftly
            | Self::HoldHardly => None,
        }
    }
}

/// Tells the locomotion systems that a mover arrived. Its destination is
/// cleared along with the destinations of the flock-mates close to it.
#[derive(Message, Debug, Copy, Clone, PartialEq, Eq)]
pub struct DestinationReached {
    pub entity: Entity,
}

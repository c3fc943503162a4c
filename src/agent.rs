use bevy::prelude::*;
use derivative::Derivative;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::error::MovableError;

/// Vertical placement policy. Decides how the altitude of a unit is
/// corrected after it moves.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Reflect, Display, EnumIter)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Heightmap {
    /// Flies at a fixed band above the level of the tile below.
    Sky,
    /// Free altitude. No correction is applied, the altitude is whatever
    /// the steering produced.
    Air,
    /// Hugs the terrain surface.
    #[default]
    Ground,
}

impl Heightmap {
    /// Whether steering should be flattened onto the ground plane before
    /// it is integrated.
    pub fn is_planar(self) -> bool {
        match self {
            Heightmap::Sky | Heightmap::Ground => true,
            Heightmap::Air => false,
        }
    }
}

/// How the unit is routed. Flying units ignore ground crowding when they
/// hold position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Reflect, Display, EnumIter)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum PathfindingMode {
    Fly,
    #[default]
    Walk,
}

/// Per-unit constants. Add this next to a [Mover](crate::mover::Mover)
/// to describe the unit's body and engine. Deserialized values go
/// through [Movable::new] and are rejected the same way.
#[derive(Component, Copy, Clone, Debug, PartialEq, Reflect, Derivative)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(try_from = "MovableConstants"))]
#[derivative(Default)]
#[reflect(Component)]
pub struct Movable {
    /// Radius of the bounding circle on the ground plane.
    #[derivative(Default(value = "0.5"))]
    radius: f32,
    /// Maximum linear speed in world units per second.
    #[derivative(Default(value = "3.0"))]
    speed: f32,
    /// Maximum angular speed in radians per second.
    #[derivative(Default(value = "std::f32::consts::TAU"))]
    rot_speed: f32,
}

impl Movable {
    /// Build a capability set, rejecting negative or non-finite constants.
    pub fn new(radius: f32, speed: f32, rot_speed: f32) -> Result<Self, MovableError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(MovableError::InvalidRadius(radius));
        }
        if !speed.is_finite() || speed < 0.0 {
            return Err(MovableError::InvalidSpeed(speed));
        }
        if !rot_speed.is_finite() || rot_speed < 0.0 {
            return Err(MovableError::InvalidRotSpeed(rot_speed));
        }
        Ok(Self {
            radius,
            speed,
            rot_speed,
        })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn rot_speed(&self) -> f32 {
        self.rot_speed
    }
}

/// Unvalidated constants of a [Movable], e.g. as read from a unit
/// definition file.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Deserialize))]
pub struct MovableConstants {
    pub radius: f32,
    pub speed: f32,
    pub rot_speed: f32,
}

impl TryFrom<MovableConstants> for Movable {
    type Error = MovableError;

    fn try_from(constants: MovableConstants) -> Result<Self, Self::Error> {
        Movable::new(constants.radius, constants.speed, constants.rot_speed)
    }
}

use bevy::prelude::*;
use itertools::Itertools;

/// The neighbor lists of a mover, as entity handles. These are written by
/// the game's spatial partitioning between ticks and never mutated by the
/// locomotion systems. Handles to entities that are no longer movers are
/// skipped.
#[derive(Component, Debug, Default, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Neighborhood {
    /// Units that matter for collisions, e.g. enemies or other groups.
    pub to_avoid: Vec<Entity>,
    /// Same-group units used for separation and destination sharing.
    pub to_flock_with: Vec<Entity>,
    /// Units this one yields to.
    pub to_let_pass: Vec<Entity>,
}

impl Neighborhood {
    pub fn with_to_avoid(mut self, entities: Vec<Entity>) -> Self {
        self.to_avoid = entities;
        self
    }

    pub fn with_to_flock_with(mut self, entities: Vec<Entity>) -> Self {
        self.to_flock_with = entities;
        self
    }

    pub fn with_to_let_pass(mut self, entities: Vec<Entity>) -> Self {
        self.to_let_pass = entities;
        self
    }
}

/// Frozen view of another mover, taken once per phase so that every
/// mover reads the same neighbor state regardless of update order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MoverSnapshot {
    pub entity: Entity,
    pub pos: Vec3,
    pub radius: f32,
    pub has_destination: bool,
    pub hold_position: bool,
    pub try_hold: bool,
}

impl MoverSnapshot {
    pub fn spacing(&self, other: &MoverSnapshot) -> f32 {
        self.radius + other.radius
    }

    pub fn distance(&self, other: &MoverSnapshot) -> f32 {
        self.pos.distance(other.pos)
    }

    /// Circle-circle overlap test. Touching counts as colliding.
    pub fn collide(&self, other: &MoverSnapshot) -> bool {
        self.distance(other) <= self.spacing(other)
    }
}

/// Per-tick neighbor lists resolved to snapshots.
#[derive(Debug, Default, Copy, Clone)]
pub struct Neighbors<'a> {
    pub to_avoid: &'a [MoverSnapshot],
    pub to_flock_with: &'a [MoverSnapshot],
    pub to_let_pass: &'a [MoverSnapshot],
}

impl<'a> Neighbors<'a> {
    /// Every neighbor of every list, each entity once.
    pub fn all(self) -> impl Iterator<Item = &'a MoverSnapshot> + 'a {
        self.to_avoid
            .iter()
            .chain(self.to_flock_with)
            .chain(self.to_let_pass)
            .unique_by(|snapshot| snapshot.entity)
    }
}

/// Owned storage backing a [Neighbors] view, resolved from a
/// [Neighborhood] through a snapshot lookup.
#[derive(Debug, Default, Clone)]
pub(crate) struct ResolvedNeighbors {
    to_avoid: Vec<MoverSnapshot>,
    to_flock_with: Vec<MoverSnapshot>,
    to_let_pass: Vec<MoverSnapshot>,
}

impl ResolvedNeighbors {
    pub(crate) fn resolve(
        neighborhood: &Neighborhood,
        lookup: impl Fn(Entity) -> Option<MoverSnapshot>,
    ) -> Self {
        let resolve_list =
            |entities: &[Entity]| entities.iter().filter_map(|e| lookup(*e)).collect::<Vec<_>>();
        Self {
            to_avoid: resolve_list(neighborhood.to_avoid.as_slice()),
            to_flock_with: resolve_list(neighborhood.to_flock_with.as_slice()),
            to_let_pass: resolve_list(neighborhood.to_let_pass.as_slice()),
        }
    }

    pub(crate) fn view(&self) -> Neighbors<'_> {
        Neighbors {
            to_avoid: &self.to_avoid,
            to_flock_with: &self.to_flock_with,
            to_let_pass: &self.to_let_pass,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Mint `n` distinct entity handles.
    pub(crate) fn entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    pub(crate) fn snapshot(entity: Entity, pos: Vec3, radius: f32) -> MoverSnapshot {
        MoverSnapshot {
            entity,
            pos,
            radius,
            has_destination: false,
            hold_position: false,
            try_hold: false,
        }
    }
}

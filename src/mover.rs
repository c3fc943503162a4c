use std::sync::Arc;

use bevy::{
    math::bounding::{Aabb2d, BoundingCircle},
    prelude::*,
};
use bitflags::bitflags;
use derivative::Derivative;

use crate::{
    agent::{Heightmap, Movable, PathfindingMode},
    angle,
    config::LocomotionConfig,
    control::SteeringMachine,
    flow_field::FlowField,
    ground,
    intent::MoverIntent,
    movement::{CollisionManager, Resolution},
    neighbors::{MoverSnapshot, Neighborhood, Neighbors},
    obstacles::{bounds_at, collides_with_any},
    terrain::Terrain,
};

bitflags! {
    /// Boolean state of a [Mover].
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct MoverFlags: u8 {
        /// Position or heading changed during the last tick.
        const HAS_MOVED = 1;
        /// The unit is following a flow field to a destination.
        const HAS_DESTINATION = 1 << 1;
        /// Neither the unit nor any flock-mate is still travelling.
        const HAS_FOUND_POST = 1 << 2;
        /// Steering and collision integration are skipped.
        const HOLD_POSITION = 1 << 3;
        /// A hold was requested this tick.
        const TRY_HOLD = 1 << 4;
    }
}

/// Read-only collaborators of a mover for one tick.
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    pub movable: &'a Movable,
    pub neighbors: Neighbors<'a>,
    pub terrain: &'a dyn Terrain,
    pub config: &'a LocomotionConfig,
    pub walls: &'a [Aabb2d],
}

impl<'a> TickContext<'a> {
    pub fn new(movable: &'a Movable, terrain: &'a dyn Terrain, config: &'a LocomotionConfig) -> Self {
        Self {
            movable,
            neighbors: Neighbors::default(),
            terrain,
            config,
            walls: &[],
        }
    }

    pub fn with_neighbors(mut self, neighbors: Neighbors<'a>) -> Self {
        self.neighbors = neighbors;
        self
    }

    pub fn with_walls(mut self, walls: &'a [Aabb2d]) -> Self {
        self.walls = walls;
        self
    }
}

/// Kinematic state and per-tick state machine of one unit.
///
/// Each tick the owner first sets an intent ([Mover::seek],
/// [Mover::follow_path], a hold attempt...) and then calls
/// [Mover::update_position] exactly once.
#[derive(Component, Clone, Reflect, Derivative)]
#[derivative(Debug)]
#[reflect(Component)]
#[require(Movable, Neighborhood, MoverIntent, Transform)]
pub struct Mover {
    heightmap: Heightmap,
    pathfinding_mode: PathfindingMode,
    pos: Vec3,
    velocity: Vec3,
    yaw: f32,
    desired_yaw: f32,
    // Per-tick bookkeeping, only reachable through the accessors.
    #[reflect(ignore)]
    flags: MoverFlags,
    #[derivative(Debug = "ignore")]
    #[reflect(ignore)]
    flow_field: Option<Arc<dyn FlowField>>,
    #[reflect(ignore)]
    steering: SteeringMachine,
}

impl Mover {
    pub fn new(position: Vec3) -> Self {
        Self {
            heightmap: Heightmap::default(),
            pathfinding_mode: PathfindingMode::default(),
            pos: position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            desired_yaw: 0.0,
            flags: MoverFlags::empty(),
            flow_field: None,
            steering: SteeringMachine::default(),
        }
    }

    pub fn with_heightmap(mut self, heightmap: Heightmap) -> Self {
        self.heightmap = heightmap;
        self
    }

    pub fn with_pathfinding_mode(mut self, mode: PathfindingMode) -> Self {
        self.pathfinding_mode = mode;
        self
    }

    /// Start facing `yaw`.
    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = angle::normalize(yaw);
        self.desired_yaw = self.yaw;
        self
    }

    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn desired_yaw(&self) -> f32 {
        self.desired_yaw
    }

    pub fn flags(&self) -> MoverFlags {
        self.flags
    }

    pub fn heightmap(&self) -> Heightmap {
        self.heightmap
    }

    pub fn pathfinding_mode(&self) -> PathfindingMode {
        self.pathfinding_mode
    }

    /// Steering requested so far this tick.
    pub fn steering(&self) -> &SteeringMachine {
        &self.steering
    }

    pub fn has_moved(&self) -> bool {
        self.flags.contains(MoverFlags::HAS_MOVED)
    }

    pub fn has_found_post(&self) -> bool {
        self.flags.contains(MoverFlags::HAS_FOUND_POST)
    }

    pub fn holds_position(&self) -> bool {
        self.flags.contains(MoverFlags::HOLD_POSITION)
    }

    pub fn tries_to_hold(&self) -> bool {
        self.flags.contains(MoverFlags::TRY_HOLD)
    }

    pub fn fly(&self) -> bool {
        self.pathfinding_mode == PathfindingMode::Fly
    }

    pub fn get_speed(&self, movable: &Movable) -> f32 {
        movable.speed()
    }

    pub fn get_pos_2d(&self) -> Vec2 {
        ground(self.pos)
    }

    /// Bounding circle on the ground plane, for spatial indexing.
    pub fn get_bounds(&self, movable: &Movable) -> BoundingCircle {
        bounds_at(self.pos, movable.radius())
    }

    /// The view other movers get of this one.
    pub fn snapshot(&self, entity: Entity, movable: &Movable) -> MoverSnapshot {
        MoverSnapshot {
            entity,
            pos: self.pos,
            radius: movable.radius(),
            has_destination: self.has_destination(),
            hold_position: self.holds_position(),
            try_hold: self.tries_to_hold(),
        }
    }

    pub fn get_spacing(&self, movable: &Movable, other: &MoverSnapshot) -> f32 {
        movable.radius() + other.radius
    }

    pub fn get_distance(&self, other: &MoverSnapshot) -> f32 {
        self.pos.distance(other.pos)
    }

    pub fn get_vector_to(&self, other: &MoverSnapshot) -> Vec3 {
        other.pos - self.pos
    }

    pub fn collide(&self, movable: &Movable, other: &MoverSnapshot) -> bool {
        self.get_distance(other) <= self.get_spacing(movable, other)
    }

    /// True if the unit's bounding circle touches any of the boxes.
    pub fn collide_walls(&self, movable: &Movable, walls: &[Aabb2d]) -> bool {
        collides_with_any(&self.get_bounds(movable), walls)
    }

    pub fn set_destination(&mut self, flow_field: Arc<dyn FlowField>) {
        self.flow_field = Some(flow_field);
        self.flags.insert(MoverFlags::HAS_DESTINATION);
        self.flags.remove(MoverFlags::HAS_FOUND_POST);
    }

    pub fn has_destination(&self) -> bool {
        self.flags.contains(MoverFlags::HAS_DESTINATION)
    }

    /// Destination of the current flow field, if one was ever set.
    pub fn get_destination(&self) -> Option<Vec2> {
        self.flow_field.as_ref().map(|field| field.destination())
    }

    pub fn flow_field(&self) -> Option<&Arc<dyn FlowField>> {
        self.flow_field.as_ref()
    }

    /// Stop travelling without touching flock-mates. This is what a
    /// flock-mate receives when a nearby unit arrives.
    pub fn clear_destination(&mut self) {
        self.flags.remove(MoverFlags::HAS_DESTINATION);
    }

    /// Stop travelling, and return the flock-mates close enough to stop
    /// with this unit. The completion radius grows by one world unit per
    /// whole `flock_completion_divisor` flock-mates, so a large group does
    /// not pile up on a single point.
    pub fn set_destination_reached(&mut self, ctx: &TickContext) -> Vec<Entity> {
        self.clear_destination();
        let flock = ctx.neighbors.to_flock_with;
        let reach = flock
            .len()
            .checked_div(ctx.config.flock_completion_divisor)
            .unwrap_or(0) as f32;
        flock
            .iter()
            .filter(|mate| self.get_distance(mate) < self.get_spacing(ctx.movable, mate) + reach)
            .map(|mate| mate.entity)
            .collect()
    }

    /// Hold position unless that would freeze the unit on top of another
    /// one, or a flock-mate is still negotiating its own hold. Returns
    /// whether the unit now holds.
    pub fn try_to_hold_position_softly(&mut self, ctx: &TickContext) -> bool {
        self.flags.insert(MoverFlags::TRY_HOLD);
        if self.fly() {
            self.flags.insert(MoverFlags::HOLD_POSITION);
            return true;
        }
        if ctx
            .neighbors
            .all()
            .any(|other| self.collide(ctx.movable, other))
        {
            trace!("soft hold refused: overlapping a neighbor");
            return self.holds_position();
        }
        if ctx
            .neighbors
            .to_flock_with
            .iter()
            .any(|mate| mate.try_hold && !mate.hold_position)
        {
            trace!("soft hold deferred: a flock-mate is still settling");
            return self.holds_position();
        }
        self.flags.insert(MoverFlags::HOLD_POSITION);
        true
    }

    /// Hold position unless the unit overlaps a neighbor that already
    /// holds. Overlapping a moving neighbor is fine, it will be pushed
    /// around this unit. Returns whether the unit now holds.
    pub fn try_to_hold_position_hardly(&mut self, ctx: &TickContext) -> bool {
        self.flags.insert(MoverFlags::TRY_HOLD);
        if self.fly() {
            self.flags.insert(MoverFlags::HOLD_POSITION);
            return true;
        }
        if ctx
            .neighbors
            .all()
            .any(|other| other.hold_position && self.collide(ctx.movable, other))
        {
            trace!("hard hold refused: overlapping a holding neighbor");
            return self.holds_position();
        }
        self.flags.insert(MoverFlags::HOLD_POSITION);
        true
    }

    /// Head for a point.
    pub fn seek(&mut self, ctx: &TickContext, point: Vec3) {
        self.flock_and_separate(ctx);
        let (from, target) = (self.steering_frame(self.pos), self.steering_frame(point));
        self.steering.seek(from, target);
        self.avoid_holding_units(ctx, None);
    }

    /// Head for another unit. The target itself is not avoided.
    pub fn seek_unit(&mut self, ctx: &TickContext, target: &MoverSnapshot) {
        self.flock_and_separate(ctx);
        let (from, to) = (self.steering_frame(self.pos), self.steering_frame(target.pos));
        self.steering.seek(from, to);
        self.avoid_holding_units(ctx, Some(target.entity));
    }

    /// Proceed along the destination flow field.
    pub fn follow_path(&mut self, ctx: &TickContext) {
        self.follow_path_excluding(ctx, None);
    }

    /// Proceed along the destination flow field towards a unit, which is
    /// not avoided.
    pub fn follow_path_to(&mut self, ctx: &TickContext, target: &MoverSnapshot) {
        self.follow_path_excluding(ctx, Some(target.entity));
    }

    fn follow_path_excluding(&mut self, ctx: &TickContext, target: Option<Entity>) {
        self.flock_and_separate(ctx);
        if let Some(flow_field) = &self.flow_field {
            self.steering
                .proceed_to_destination(ground(self.pos), flow_field.as_ref());
        }
        self.avoid_holding_units(ctx, target);
    }

    fn flock_and_separate(&mut self, ctx: &TickContext) {
        let radius = ctx.movable.radius();
        self.steering
            .apply_separation(self.pos, radius, ctx.neighbors.to_flock_with);
        self.steering
            .apply_separation(self.pos, radius, ctx.neighbors.to_let_pass);
    }

    fn avoid_holding_units(&mut self, ctx: &TickContext, except: Option<Entity>) {
        let to_avoid = ctx
            .neighbors
            .to_avoid
            .iter()
            .filter(|other| Some(other.entity) != except)
            .copied()
            .collect::<Vec<_>>();
        self.steering.avoid_holding_units(
            self.pos,
            ctx.movable.radius(),
            self.velocity,
            &to_avoid,
            ctx.config.avoid_margin,
        );
    }

    fn steering_frame(&self, v: Vec3) -> Vec3 {
        if self.heightmap.is_planar() {
            v.with_y(0.0)
        } else {
            v
        }
    }

    /// Advance the unit by one tick: integrate the steering requested
    /// since the last tick (unless holding), turn, settle on the terrain
    /// and update the bookkeeping flags.
    ///
    /// Returns the collision resolution report, or `None` when the unit
    /// held its position.
    pub fn update_position(&mut self, ctx: &TickContext, elapsed_time: f32) -> Option<Resolution> {
        let last_yaw = self.yaw;
        let last_pos = self.pos;

        let steering = self
            .steering
            .get_steering_and_reset(ctx.movable.speed(), &ctx.config.weights);
        let resolution = if self.holds_position() {
            None
        } else {
            let steering = self.steering_frame(steering);
            let manager = CollisionManager::new(ctx.config.max_collision_iterations);
            Some(manager.apply_steering(
                &mut self.pos,
                &mut self.velocity,
                ctx.movable.radius(),
                ctx.movable.speed(),
                steering,
                elapsed_time,
                ctx.neighbors.to_avoid,
                ctx.walls,
            ))
        };

        self.head(ctx.movable, ctx.config, elapsed_time);

        let moved =
            !angle::are_similar(last_yaw, self.yaw, ctx.config.angle_epsilon) || last_pos != self.pos;
        self.flags.set(MoverFlags::HAS_MOVED, moved);
        if moved {
            self.update_elevation(ctx.terrain, ctx.config);
        }

        let found_post = !self.has_destination()
            && !ctx
                .neighbors
                .to_flock_with
                .iter()
                .any(|mate| mate.has_destination);
        self.flags.set(MoverFlags::HAS_FOUND_POST, found_post);

        if !self.tries_to_hold() {
            self.flags.remove(MoverFlags::HOLD_POSITION);
        }
        // A hold lapses unless it is requested again next tick.
        self.flags.remove(MoverFlags::TRY_HOLD);

        resolution
    }

    /// Turn towards the direction of travel, no faster than the unit's
    /// rotation speed. A unit at rest keeps its previous desired heading.
    pub fn head(&mut self, movable: &Movable, config: &LocomotionConfig, elapsed_time: f32) {
        if let Some(angle) = angle::of_vector(ground(self.velocity)) {
            self.desired_yaw = angle;
        }
        let max_step = movable.rot_speed() * elapsed_time.max(0.0);
        self.yaw = angle::step_toward(self.yaw, self.desired_yaw, max_step, config.angle_epsilon);
    }

    /// Snap the altitude to the heightmap policy.
    pub fn update_elevation(&mut self, terrain: &dyn Terrain, config: &LocomotionConfig) {
        let at = ground(self.pos);
        match self.heightmap {
            Heightmap::Ground => self.pos.y = terrain.ground_altitude(at) + config.ground_offset,
            Heightmap::Sky => self.pos.y = terrain.tile_at(at).level as f32 + config.sky_offset,
            Heightmap::Air => {}
        }
    }
}

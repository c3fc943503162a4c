use bevy::{platform::collections::HashMap, prelude::*};
use itertools::Itertools;

use crate::{
    agent::Movable,
    config::LocomotionConfig,
    intent::{DestinationReached, MoverIntent},
    mover::{Mover, TickContext},
    neighbors::{MoverSnapshot, Neighborhood, ResolvedNeighbors},
    obstacles::StaticObstacles,
    terrain::TerrainMap,
};

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct LocomotionSystemSet;

/// Runs the mover tick in [FixedUpdate]: arrivals, then intents, then
/// integration, then the [Transform] copy. Movers are processed in
/// ascending [Entity] order.
pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LocomotionConfig>()
            .init_resource::<TerrainMap>()
            .init_resource::<StaticObstacles>()
            .add_message::<DestinationReached>();

        let update_systems = (
            handle_destination_reached,
            apply_intents,
            update_positions,
            sync_transforms,
        )
            .chain()
            .in_set(LocomotionSystemSet);
        app.add_systems(FixedUpdate, update_systems);
    }
}

fn snapshot_table<'a>(
    movers: impl Iterator<Item = (Entity, &'a Mover, &'a Movable)>,
) -> HashMap<Entity, MoverSnapshot> {
    movers
        .map(|(entity, mover, movable)| (entity, mover.snapshot(entity, movable)))
        .collect()
}

fn update_order(snapshots: &HashMap<Entity, MoverSnapshot>) -> Vec<Entity> {
    snapshots.keys().copied().sorted().collect()
}

fn neighbors_of(
    entity: Entity,
    neighborhood: &Neighborhood,
    snapshots: &HashMap<Entity, MoverSnapshot>,
) -> ResolvedNeighbors {
    ResolvedNeighbors::resolve(neighborhood, |other| {
        if other == entity {
            None
        } else {
            snapshots.get(&other).copied()
        }
    })
}

pub(crate) fn handle_destination_reached(
    mut reader: MessageReader<DestinationReached>,
    mut movers: Query<(Entity, &mut Mover, &Movable, &Neighborhood)>,
    terrain: Res<TerrainMap>,
    config: Res<LocomotionConfig>,
) {
    let arrived = reader.read().map(|message| message.entity).collect::<Vec<_>>();
    for entity in arrived {
        let snapshots = snapshot_table(movers.iter().map(|(e, m, b, _)| (e, m, b)));
        let Ok((_, _, movable, neighborhood)) = movers.get(entity) else {
            warn!("destination reached by {entity}, which is not a mover");
            continue;
        };
        let movable = *movable;
        let neighbors = neighbors_of(entity, neighborhood, &snapshots);
        let Ok((_, mut mover, _, _)) = movers.get_mut(entity) else {
            continue;
        };
        let ctx = TickContext::new(&movable, terrain.0.as_ref(), &config)
            .with_neighbors(neighbors.view());
        let mates = mover.set_destination_reached(&ctx);
        debug!("{entity} arrived, stopping {} flock-mates with it", mates.len());
        for mate in mates {
            if let Ok((_, mut mate, _, _)) = movers.get_mut(mate) {
                mate.clear_destination();
            }
        }
    }
}

/// Turns every mover's intent into steering requests or hold attempts.
/// Each mover sees the intents already applied by the movers before it,
/// so soft holds settle one unit after another.
pub(crate) fn apply_intents(
    mut movers: Query<(Entity, &mut Mover, &Movable, &Neighborhood, &MoverIntent)>,
    terrain: Res<TerrainMap>,
    config: Res<LocomotionConfig>,
) {
    let mut snapshots = snapshot_table(movers.iter().map(|(e, m, b, _, _)| (e, m, b)));
    for entity in update_order(&snapshots) {
        let Ok((_, _, movable, neighborhood, intent)) = movers.get(entity) else {
            continue;
        };
        let (movable, intent) = (*movable, *intent);
        let neighbors = neighbors_of(entity, neighborhood, &snapshots);
        let target = match intent.target() {
            Some(target) => match snapshots.get(&target) {
                Some(snapshot) => Some(*snapshot),
                None => {
                    warn!("{entity} targets {target}, which is not a mover");
                    continue;
                }
            },
            None => None,
        };

        let Ok((_, mut mover, _, _, _)) = movers.get_mut(entity) else {
            continue;
        };
        let ctx = TickContext::new(&movable, terrain.0.as_ref(), &config)
            .with_neighbors(neighbors.view());
        match (intent, target) {
            (MoverIntent::SeekPoint(point), _) => mover.seek(&ctx, point),
            (MoverIntent::SeekUnit(_), Some(target)) => mover.seek_unit(&ctx, &target),
            (MoverIntent::FollowPath, _) => mover.follow_path(&ctx),
            (MoverIntent::FollowPathTo(_), Some(target)) => mover.follow_path_to(&ctx, &target),
            (MoverIntent::HoldSoftly, _) => {
                mover.try_to_hold_position_softly(&ctx);
            }
            (MoverIntent::HoldHardly, _) => {
                mover.try_to_hold_position_hardly(&ctx);
            }
            _ => {}
        }
        snapshots.insert(entity, mover.snapshot(entity, &movable));
    }
}

/// Integrates every mover against the positions all movers had at the
/// start of the pass.
pub(crate) fn update_positions(
    time: Res<Time>,
    mut movers: Query<(Entity, &mut Mover, &Movable, &Neighborhood)>,
    terrain: Res<TerrainMap>,
    obstacles: Res<StaticObstacles>,
    config: Res<LocomotionConfig>,
) {
    let elapsed_time = time.delta_secs();
    let snapshots = snapshot_table(movers.iter().map(|(e, m, b, _)| (e, m, b)));
    for entity in update_order(&snapshots) {
        let Ok((_, _, movable, neighborhood)) = movers.get(entity) else {
            continue;
        };
        let movable = *movable;
        let neighbors = neighbors_of(entity, neighborhood, &snapshots);
        let Ok((_, mut mover, _, _)) = movers.get_mut(entity) else {
            continue;
        };
        let ctx = TickContext::new(&movable, terrain.0.as_ref(), &config)
            .with_neighbors(neighbors.view())
            .with_walls(&obstacles);
        mover.update_position(&ctx, elapsed_time);
    }
}

/// Copies mover state to [Transform]. Yaw zero faces `+X`.
pub(crate) fn sync_transforms(mut query: Query<(Ref<Mover>, &mut Transform)>) {
    for (mover, mut transform) in query.iter_mut() {
        if !mover.has_moved() && !mover.is_added() {
            continue;
        }
        transform.translation = mover.pos();
        transform.rotation = Quat::from_rotation_y(-mover.yaw());
    }
}

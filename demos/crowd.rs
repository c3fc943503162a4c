//! Headless run of a small squad crossing a field past two sentries and a
//! wall. Progress is logged; the app exits once every unit has found its
//! post.

use std::{sync::Arc, time::Duration};

use bevy::{
    app::ScheduleRunnerPlugin, log::LogPlugin, math::bounding::Aabb2d, prelude::*,
};
use bevy_locomotion::prelude::*;

const DESTINATION: Vec2 = Vec2::new(20.0, 0.0);
/// Distance at which a unit reports arrival.
const ARRIVAL_RADIUS: f32 = 1.0;
const MAX_TICKS: u32 = 6_000;

#[derive(Component)]
struct Squad;

fn main() {
    App::new()
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 120.0,
            ))),
            LogPlugin::default(),
        ))
        .add_plugins(LocomotionPlugin)
        .insert_resource(TerrainMap::new(FlatTerrain::new(0.0, 0)))
        .insert_resource(StaticObstacles(vec![Aabb2d::new(
            Vec2::new(10.0, 4.0),
            Vec2::new(1.0, 2.0),
        )]))
        .add_systems(Startup, setup)
        .add_systems(FixedUpdate, detect_arrivals.before(LocomotionSystemSet))
        .add_systems(FixedUpdate, report.after(LocomotionSystemSet))
        .run();
}

fn setup(mut commands: Commands) {
    let Ok(field) = GridFlowField::straight_to(DESTINATION, Vec2::splat(-32.0), 1.0, 64, 64) else {
        error!("could not build the flow field");
        return;
    };
    let field: Arc<dyn FlowField> = Arc::new(field);

    let sentries = [Vec3::new(8.0, 0.25, 0.0), Vec3::new(12.0, 0.25, -1.5)]
        .map(|pos| {
            commands
                .spawn((Mover::new(pos), MoverIntent::HoldHardly))
                .id()
        })
        .to_vec();

    let squad = (0..12)
        .map(|i| {
            let pos = Vec3::new((i % 4) as f32 * 1.2, 0.25, (i / 4) as f32 * 1.2 - 1.2);
            let mut mover = Mover::new(pos);
            mover.set_destination(field.clone());
            commands.spawn((Squad, mover, MoverIntent::FollowPath)).id()
        })
        .collect::<Vec<_>>();

    for unit in &squad {
        let mates = squad.iter().copied().filter(|e| e != unit).collect::<Vec<_>>();
        commands.entity(*unit).insert(
            Neighborhood::default()
                .with_to_avoid(sentries.clone())
                .with_to_flock_with(mates),
        );
    }
    info!("squad of {} heading for {DESTINATION}", squad.len());
}

fn detect_arrivals(
    mut arrivals: MessageWriter<DestinationReached>,
    mut query: Query<(Entity, &Mover, &mut MoverIntent), With<Squad>>,
) {
    for (entity, mover, mut intent) in query.iter_mut() {
        if !mover.has_destination() {
            if *intent == MoverIntent::FollowPath {
                *intent = MoverIntent::HoldSoftly;
            }
            continue;
        }
        if mover.get_pos_2d().distance(DESTINATION) < ARRIVAL_RADIUS {
            arrivals.write(DestinationReached { entity });
        }
    }
}

fn report(
    mut ticks: Local<u32>,
    mut exit: MessageWriter<AppExit>,
    query: Query<&Mover, With<Squad>>,
) {
    *ticks += 1;
    if *ticks % 64 == 0 {
        let travelling = query.iter().filter(|mover| mover.has_destination()).count();
        let holding = query.iter().filter(|mover| mover.holds_position()).count();
        info!("tick {}: {travelling} travelling, {holding} holding", *ticks);
    }
    if query.iter().all(|mover| mover.has_found_post()) {
        info!("every unit found its post after {} ticks", *ticks);
        exit.write(AppExit::Success);
    } else if *ticks >= MAX_TICKS {
        warn!("giving up after {} ticks", *ticks);
        exit.write(AppExit::error());
    }
}

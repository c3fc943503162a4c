pub use crate::{
    agent::{Heightmap, Movable, MovableConstants, PathfindingMode},
    config::{LocomotionConfig, SteeringWeights},
    control::{BehaviorType, SteeringMachine},
    error::{FlowFieldError, MovableError},
    flow_field::{FlowField, GridFlowField},
    intent::{DestinationReached, MoverIntent},
    movement::{CollisionManager, Resolution},
    mover::{Mover, MoverFlags, TickContext},
    neighbors::{MoverSnapshot, Neighborhood, Neighbors},
    obstacles::StaticObstacles,
    plugin::{LocomotionPlugin, LocomotionSystemSet},
    terrain::{FlatTerrain, Terrain, TerrainMap, Tile},
};

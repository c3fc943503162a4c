use std::sync::Arc;

use bevy::prelude::*;

/// Tile data the kernel reads when placing sky units.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Tile {
    /// Base elevation level of the tile.
    pub level: i32,
}

/// Read-only terrain queries. Points are on the ground plane (`x`, `z`).
/// Implementations must answer for every position a unit can occupy.
pub trait Terrain: Send + Sync {
    fn ground_altitude(&self, at: Vec2) -> f32;

    fn tile_at(&self, at: Vec2) -> Tile;
}

/// Terrain with a constant surface, mostly useful for tests and demos.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FlatTerrain {
    pub altitude: f32,
    pub level: i32,
}

impl FlatTerrain {
    pub fn new(altitude: f32, level: i32) -> Self {
        Self { altitude, level }
    }
}

impl Terrain for FlatTerrain {
    fn ground_altitude(&self, _at: Vec2) -> f32 {
        self.altitude
    }

    fn tile_at(&self, _at: Vec2) -> Tile {
        Tile { level: self.level }
    }
}

/// Shared terrain handle used by the locomotion systems. Map edits must
/// happen between ticks.
#[derive(Resource, Clone, Deref)]
pub struct TerrainMap(pub Arc<dyn Terrain>);

impl TerrainMap {
    pub fn new(terrain: impl Terrain + 'static) -> Self {
        Self(Arc::new(terrain))
    }
}

impl Default for TerrainMap {
    fn default() -> Self {
        Self::new(FlatTerrain::default())
    }
}

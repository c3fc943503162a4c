use bevy::{
    math::bounding::{Aabb2d, BoundingCircle, IntersectsVolume},
    prelude::*,
};

/// Static, axis-aligned obstacles on the ground plane (walls, buildings).
/// Units are never integrated into one of these unless they already
/// started inside it.
#[derive(Resource, Debug, Default, Clone, Deref, DerefMut)]
pub struct StaticObstacles(pub Vec<Aabb2d>);

/// Bounding circle of a unit on the ground plane.
pub fn bounds_at(pos: Vec3, radius: f32) -> BoundingCircle {
    BoundingCircle::new(crate::ground(pos), radius)
}

/// True if the circle intersects any of the boxes.
pub fn collides_with_any(bounds: &BoundingCircle, walls: &[Aabb2d]) -> bool {
    walls.iter().any(|wall| bounds.intersects(wall))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_against_boxes() {
        let walls = [
            Aabb2d::new(Vec2::new(5.0, 0.0), Vec2::new(1.0, 1.0)),
            Aabb2d::new(Vec2::new(0.0, -5.0), Vec2::new(3.0, 0.5)),
        ];
        assert!(!collides_with_any(&bounds_at(Vec3::ZERO, 1.0), &walls));
        assert!(collides_with_any(&bounds_at(Vec3::new(3.5, 0.0, 0.0), 1.0), &walls));
        // Altitude does not matter, only the ground footprint.
        assert!(collides_with_any(&bounds_at(Vec3::new(0.0, 40.0, -4.0), 0.6), &walls));
        assert!(!collides_with_any(&bounds_at(Vec3::ZERO, 1.0), &[]));
    }
}

use bevy::prelude::*;

use crate::error::FlowFieldError;

/// A directional field leading to a shared destination. Produced by an
/// external pathfinder and only sampled here.
pub trait FlowField: Send + Sync {
    /// Point on the ground plane that the field leads to.
    fn destination(&self) -> Vec2;

    /// Locally optimal travel direction at `at`. May be zero where the
    /// field has no information.
    fn direction_at(&self, at: Vec2) -> Vec2;
}

/// Flow field stored as a row-major grid of directions on the ground
/// plane. Cell `(0, 0)` starts at `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridFlowField {
    destination: Vec2,
    origin: Vec2,
    cell_size: f32,
    width: usize,
    height: usize,
    directions: Vec<Vec2>,
}

impl GridFlowField {
    pub fn new(
        destination: Vec2,
        origin: Vec2,
        cell_size: f32,
        width: usize,
        height: usize,
        directions: Vec<Vec2>,
    ) -> Result<Self, FlowFieldError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(FlowFieldError::InvalidCellSize(cell_size));
        }
        let expected = width * height;
        if directions.len() != expected {
            return Err(FlowFieldError::SizeMismatch {
                expected,
                actual: directions.len(),
            });
        }
        Ok(Self {
            destination,
            origin,
            cell_size,
            width,
            height,
            directions,
        })
    }

    /// Field in which every cell points straight at the destination, as
    /// produced over open ground.
    pub fn straight_to(
        destination: Vec2,
        origin: Vec2,
        cell_size: f32,
        width: usize,
        height: usize,
    ) -> Result<Self, FlowFieldError> {
        let directions = (0..height)
            .flat_map(|row| (0..width).map(move |col| (col, row)))
            .map(|(col, row)| {
                let centre =
                    origin + (Vec2::new(col as f32, row as f32) + Vec2::splat(0.5)) * cell_size;
                (destination - centre).normalize_or_zero()
            })
            .collect();
        Self::new(destination, origin, cell_size, width, height, directions)
    }

    fn cell_index(&self, at: Vec2) -> Option<usize> {
        let local = (at - self.origin) / self.cell_size;
        if !local.is_finite() || local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let (col, row) = (local.x as usize, local.y as usize);
        (col < self.width && row < self.height).then_some(row * self.width + col)
    }
}

impl FlowField for GridFlowField {
    fn destination(&self) -> Vec2 {
        self.destination
    }

    fn direction_at(&self, at: Vec2) -> Vec2 {
        self.cell_index(at)
            .and_then(|index| self.directions.get(index).copied())
            .unwrap_or(Vec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mismatched_grid() {
        let result = GridFlowField::new(Vec2::ZERO, Vec2::ZERO, 1.0, 2, 2, vec![Vec2::X; 3]);
        assert_eq!(
            result,
            Err(FlowFieldError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        );
        let result = GridFlowField::new(Vec2::ZERO, Vec2::ZERO, 0.0, 1, 1, vec![Vec2::X]);
        assert_eq!(result, Err(FlowFieldError::InvalidCellSize(0.0)));
    }

    #[test]
    fn test_samples_cells_row_major() {
        let directions = vec![Vec2::X, Vec2::Y, Vec2::NEG_X, Vec2::NEG_Y];
        let field =
            GridFlowField::new(Vec2::ZERO, Vec2::new(-2.0, -2.0), 2.0, 2, 2, directions).unwrap();
        assert_eq!(field.direction_at(Vec2::new(-1.0, -1.0)), Vec2::X);
        assert_eq!(field.direction_at(Vec2::new(1.0, -1.0)), Vec2::Y);
        assert_eq!(field.direction_at(Vec2::new(-1.0, 1.0)), Vec2::NEG_X);
        assert_eq!(field.direction_at(Vec2::new(1.0, 1.0)), Vec2::NEG_Y);
    }

    #[test]
    fn test_outside_the_grid_is_zero() {
        let field = GridFlowField::straight_to(Vec2::ZERO, Vec2::ZERO, 1.0, 4, 4).unwrap();
        assert_eq!(field.direction_at(Vec2::new(-0.5, 1.0)), Vec2::ZERO);
        assert_eq!(field.direction_at(Vec2::new(1.0, 4.5)), Vec2::ZERO);
    }

    #[test]
    fn test_straight_field_points_at_destination() {
        let destination = Vec2::new(10.0, 0.0);
        let field =
            GridFlowField::straight_to(destination, Vec2::new(-5.0, -5.0), 1.0, 10, 10).unwrap();
        assert_eq!(field.destination(), destination);
        let dir = field.direction_at(Vec2::new(0.2, 0.3));
        assert!(dir.dot(Vec2::X) > 0.95, "got {dir:?}");
    }
}

use thiserror::Error;

/// Rejected capability constants. A [Movable](crate::agent::Movable)
/// can only be built from finite, non-negative values.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum MovableError {
    #[error("radius must be finite and non-negative, got {0}")]
    InvalidRadius(f32),
    #[error("speed must be finite and non-negative, got {0}")]
    InvalidSpeed(f32),
    #[error("rotation speed must be finite and non-negative, got {0}")]
    InvalidRotSpeed(f32),
}

/// Rejected flow field layouts.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum FlowFieldError {
    #[error("cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),
    #[error("expected {expected} directions for the grid, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

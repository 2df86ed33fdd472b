//! Error types for boxes and surfaces.

use thiserror::Error;

/// Errors raised while building or splitting boxes and surfaces.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// Box has zero, negative or non-finite volume.
    #[error("degenerate box: {0}")]
    DegenerateBox(String),

    /// Box dimensions are not all positive and finite.
    #[error("invalid box dimensions: {0:?}")]
    InvalidDimensions([f64; 3]),

    /// Box frame is not orthonormal.
    #[error("box frame is not orthonormal")]
    InvalidFrame,

    /// Surface parameters do not describe a valid surface.
    #[error("invalid surface: {0}")]
    InvalidSurface(String),
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeomError>;

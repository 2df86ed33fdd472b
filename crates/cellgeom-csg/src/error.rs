//! Error types for expression construction and evaluation.

use cellgeom_geom::GeomError;
use thiserror::Error;

/// Errors that can occur while building or evaluating expressions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CsgError {
    /// Reverse-Polish token stream does not reduce to a single expression.
    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    /// The starting box for a bounding-box search does not cut the geometry.
    #[error("initial box is too small: geometry is {0}")]
    InvalidInitialBox(String),

    /// An algorithm invariant was violated.
    #[error("internal consistency error: {0}")]
    InternalConsistency(String),

    /// A box with zero, negative or non-finite volume was produced.
    #[error("degenerate box: {0}")]
    DegenerateBox(String),

    /// Invalid algorithm settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Box or surface error.
    #[error(transparent)]
    Geom(#[from] GeomError),
}

/// Result type for expression operations.
pub type Result<T> = std::result::Result<T, CsgError>;

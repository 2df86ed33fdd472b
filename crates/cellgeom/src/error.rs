//! Error types for cells and configuration.

use cellgeom_csg::CsgError;
use cellgeom_geom::GeomError;
use thiserror::Error;

/// Errors raised by the cell facade.
#[derive(Error, Debug)]
pub enum CellError {
    /// Expression construction or evaluation failed.
    #[error(transparent)]
    Csg(#[from] CsgError),

    /// Box or surface error.
    #[error(transparent)]
    Geom(#[from] GeomError),

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An operation on a specific cell failed.
    #[error("cell {name}: {source}")]
    Cell {
        /// Card name of the cell.
        name: u32,
        /// Underlying failure.
        #[source]
        source: CsgError,
    },
}

/// Result type for cell operations.
pub type Result<T> = std::result::Result<T, CellError>;

//! Named cells: geometry plus card options.

use std::collections::BTreeMap;
use std::fmt;

use cellgeom_csg::{
    bounding_box_with, simplify_with, volume_with, BoolExpr, BoundsSettings, CsgError,
    SimplifySettings, Token, VolumeSettings,
};
use cellgeom_geom::GeomBox;
use cellgeom_math::Transformation;
use tracing::{debug, instrument};

use crate::error::{CellError, Result};

/// Option key holding the universe a cell belongs to.
pub const UNIVERSE: &str = "U";

/// Option key naming the universe that fills a cell.
pub const FILL: &str = "FILL";

/// A cell card: a name, its geometry and free-form options such as material
/// or importance.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    name: u32,
    geometry: BoolExpr,
    options: BTreeMap<String, String>,
}

impl Cell {
    /// Cell without options.
    pub fn new(name: u32, geometry: BoolExpr) -> Self {
        Self {
            name,
            geometry,
            options: BTreeMap::new(),
        }
    }

    /// Cell whose geometry is given as reverse-Polish tokens.
    pub fn from_polish(name: u32, tokens: &[Token]) -> Result<Self> {
        let geometry =
            BoolExpr::from_polish(tokens).map_err(|source| CellError::Cell { name, source })?;
        Ok(Self::new(name, geometry))
    }

    /// Builder-style option setter.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Card name.
    pub fn name(&self) -> u32 {
        self.name
    }

    /// Cell geometry.
    pub fn geometry(&self) -> &BoolExpr {
        &self.geometry
    }

    /// All options, ordered by key.
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    /// Option value by key.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Set an option, returning the previous value.
    pub fn set_option(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.options.insert(key.into(), value.into())
    }

    // =========================================================================
    // Geometry operations
    // =========================================================================

    /// This cell bounded by `other`. Name and options are kept from `self`.
    pub fn intersection(&self, other: &Cell) -> Cell {
        self.with_geometry(BoolExpr::intersection([
            self.geometry.clone(),
            other.geometry.clone(),
        ]))
    }

    /// Union of this cell with `other`. Name and options are kept from `self`.
    pub fn union(&self, other: &Cell) -> Cell {
        self.with_geometry(BoolExpr::union([
            self.geometry.clone(),
            other.geometry.clone(),
        ]))
    }

    /// Cell with every surface moved by `t`.
    pub fn transform(&self, t: &Transformation) -> Cell {
        self.with_geometry(self.geometry.transform(t))
    }

    /// Fill this cell with the cells of `universe`.
    ///
    /// Without a universe the cell itself is returned. Otherwise each
    /// universe cell is bounded by this one; it keeps its own name and
    /// options except the universe option, which is taken from this cell
    /// when present.
    pub fn populate(&self, universe: Option<&[Cell]>) -> Vec<Cell> {
        let Some(universe) = universe else {
            return vec![self.clone()];
        };
        universe
            .iter()
            .map(|c| {
                let mut filled = c.intersection(self);
                if let Some(u) = self.option(UNIVERSE) {
                    filled.set_option(UNIVERSE, u);
                }
                filled
            })
            .collect()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Cell with the simplest geometry equivalent to this one inside `b`.
    #[instrument(skip(self, b, settings), fields(name = self.name))]
    pub fn simplify(&self, b: &GeomBox, settings: &SimplifySettings) -> Result<Cell> {
        let candidates = simplify_with(&self.geometry, b, settings).map_err(|e| self.wrap(e))?;
        let simplest = candidates.into_iter().next().ok_or_else(|| {
            self.wrap(CsgError::InternalConsistency(
                "simplification produced no candidates".into(),
            ))
        })?;
        debug!(
            before = self.geometry.complexity(),
            after = simplest.complexity(),
            "cell simplified"
        );
        Ok(self.with_geometry(simplest))
    }

    /// Volume of the part of this cell inside `b`.
    pub fn volume(&self, b: &GeomBox, settings: &VolumeSettings) -> Result<f64> {
        volume_with(&self.geometry, b, settings).map_err(|e| self.wrap(e))
    }

    /// Box bounding this cell, shrunk from `initial`.
    pub fn bounding_box(&self, initial: &GeomBox, settings: &BoundsSettings) -> Result<GeomBox> {
        bounding_box_with(&self.geometry, initial, settings).map_err(|e| self.wrap(e))
    }

    fn with_geometry(&self, geometry: BoolExpr) -> Cell {
        Cell {
            name: self.name,
            geometry,
            options: self.options.clone(),
        }
    }

    fn wrap(&self, source: CsgError) -> CellError {
        CellError::Cell {
            name: self.name,
            source,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.geometry)?;
        for (k, v) in &self.options {
            write!(f, " {k}={v}")?;
        }
        Ok(())
    }
}

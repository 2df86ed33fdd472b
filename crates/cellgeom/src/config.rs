//! Run configuration loaded from TOML.
//!
//! ```toml
//! [global_box]
//! center = [0.0, 0.0, 0.0]
//! dimensions = [200.0, 200.0, 200.0]
//!
//! [simplify]
//! min_volume = 0.01
//! trim_size = 2
//!
//! [volume]
//! sample_count = 5000
//! ```
//!
//! Every section and field is optional.

use std::path::Path;

use cellgeom_csg::{BoundsSettings, SimplifySettings, VolumeSettings};
use cellgeom_geom::GeomBox;
use cellgeom_math::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Side length of the default global box.
pub const GLOBAL_BOX_SIZE: f64 = 1e4;

/// Axis-aligned box given by center and edge lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxSpec {
    /// Box center.
    pub center: [f64; 3],
    /// Edge lengths along x, y and z.
    pub dimensions: [f64; 3],
}

impl Default for BoxSpec {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            dimensions: [GLOBAL_BOX_SIZE; 3],
        }
    }
}

impl BoxSpec {
    /// Build the box, validating its dimensions.
    pub fn to_box(&self) -> Result<GeomBox> {
        let [x, y, z] = self.center;
        Ok(GeomBox::new(Point3::new(x, y, z), self.dimensions)?)
    }
}

/// All parameters of a geometry run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Region searched when no other box is given.
    pub global_box: BoxSpec,
    /// Simplification parameters.
    pub simplify: SimplifySettings,
    /// Volume estimation parameters.
    pub volume: VolumeSettings,
    /// Bounding-box parameters.
    pub bounds: BoundsSettings,
}

impl GeometryConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.global_box.to_box()?;
        self.simplify.validate()?;
        self.volume.validate()?;
        self.bounds.validate()?;
        Ok(())
    }

    /// The configured global box.
    pub fn global_box(&self) -> Result<GeomBox> {
        self.global_box.to_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CellError;
    use cellgeom_csg::{CsgError, DEFAULT_SAMPLE_COUNT, MIN_BOX_VOLUME};

    #[test]
    fn test_defaults() {
        let config = GeometryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.global_box().unwrap().dimensions(), [GLOBAL_BOX_SIZE; 3]);
        assert_eq!(config.simplify.min_volume, MIN_BOX_VOLUME);
        assert_eq!(config.simplify.trim_size, 1);
        assert_eq!(config.volume.sample_count, DEFAULT_SAMPLE_COUNT);
        assert_eq!(config.bounds.tolerance, 1.0);
    }

    #[test]
    fn test_empty_text_is_default() {
        assert_eq!(GeometryConfig::from_toml_str("").unwrap(), GeometryConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let text = r#"
            [global_box]
            dimensions = [10.0, 20.0, 30.0]

            [simplify]
            trim_size = 3

            [volume]
            seed = 17
        "#;
        let config = GeometryConfig::from_toml_str(text).unwrap();
        assert_eq!(config.global_box.center, [0.0; 3]);
        assert_eq!(config.global_box().unwrap().volume(), 6000.0);
        assert_eq!(config.simplify.trim_size, 3);
        assert_eq!(config.simplify.min_volume, MIN_BOX_VOLUME);
        assert_eq!(config.volume.seed, 17);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let bad_box = "[global_box]\ndimensions = [1.0, 0.0, 1.0]";
        assert!(matches!(
            GeometryConfig::from_toml_str(bad_box),
            Err(CellError::Geom(_))
        ));
        let bad_volume = "[volume]\nsample_count = 0";
        assert!(matches!(
            GeometryConfig::from_toml_str(bad_volume),
            Err(CellError::Csg(CsgError::InvalidSettings(_)))
        ));
        assert!(matches!(
            GeometryConfig::from_toml_str("simplify = 3"),
            Err(CellError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            GeometryConfig::load("/nonexistent/cellgeom.toml"),
            Err(CellError::Io(_))
        ));
    }
}

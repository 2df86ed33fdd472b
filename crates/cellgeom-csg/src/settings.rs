//! Algorithm parameters.

use serde::{Deserialize, Serialize};

use crate::error::{CsgError, Result};

/// Default smallest box volume at which subdivision stops.
pub const MIN_BOX_VOLUME: f64 = 1e-3;

/// Default number of random points per terminal box.
pub const DEFAULT_SAMPLE_COUNT: usize = 1000;

/// Default seed for volume sampling.
pub const DEFAULT_SEED: u64 = 0x5eed_ce11;

fn check_volume(name: &str, v: f64) -> Result<()> {
    if v > 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(CsgError::InvalidSettings(format!(
            "{name} must be positive and finite, got {v}"
        )))
    }
}

/// Parameters of [`crate::simplify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifySettings {
    /// Boxes at or below this volume are not split further.
    pub min_volume: f64,
    /// Maximum number of candidates kept at each step. Zero behaves as one.
    pub trim_size: usize,
}

impl Default for SimplifySettings {
    fn default() -> Self {
        Self {
            min_volume: MIN_BOX_VOLUME,
            trim_size: 1,
        }
    }
}

impl SimplifySettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        check_volume("min_volume", self.min_volume)
    }
}

/// Parameters of [`crate::volume`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeSettings {
    /// Ambiguous boxes at or below this volume are sampled.
    pub min_volume: f64,
    /// Random points per sampled box.
    pub sample_count: usize,
    /// Base seed. Each sampled box derives its own stream from it.
    pub seed: u64,
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self {
            min_volume: MIN_BOX_VOLUME,
            sample_count: DEFAULT_SAMPLE_COUNT,
            seed: DEFAULT_SEED,
        }
    }
}

impl VolumeSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        check_volume("min_volume", self.min_volume)?;
        if self.sample_count == 0 {
            return Err(CsgError::InvalidSettings(
                "sample_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parameters of [`crate::bounding_box`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsSettings {
    /// Absolute tolerance on each face position.
    pub tolerance: f64,
}

impl Default for BoundsSettings {
    fn default() -> Self {
        Self { tolerance: 1.0 }
    }
}

impl BoundsSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        check_volume("tolerance", self.tolerance)
    }
}

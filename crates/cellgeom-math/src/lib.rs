#![warn(missing_docs)]

//! Math types for cellgeom.
//!
//! Thin wrappers around nalgebra providing the types the geometry engine
//! works in: points, vectors, directions, rigid transformations as they
//! appear on transport-code `TR` cards, and tolerance constants.

use nalgebra::{Matrix3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A 3x3 matrix.
pub type Mat3 = Matrix3<f64>;

/// Errors raised while building a transformation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// Basis vectors deviate from orthogonality by more than the allowed angle.
    #[error("rotation basis is not orthogonal (deviation {0:.3e})")]
    NotOrthogonal(f64),

    /// The rotation matrix could not be orthonormalized.
    #[error("rotation basis is degenerate")]
    Degenerate,
}

/// A rigid transformation mapping local (auxiliary) coordinates into the
/// global coordinate system: `p_global = rotation * p_local + translation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    rotation: Mat3,
    translation: Vec3,
}

impl Transformation {
    /// Largest deviation from orthogonality (in cosine units) that is
    /// silently corrected when a rotation is read from a card.
    pub const ORTHOGONALITY_TOLERANCE: f64 = 1e-3;

    /// Identity transformation.
    pub fn identity() -> Self {
        Self {
            rotation: Mat3::identity(),
            translation: Vec3::zeros(),
        }
    }

    /// Pure translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            rotation: Mat3::identity(),
            translation: Vec3::new(dx, dy, dz),
        }
    }

    /// Rotation about an axis through the origin by `angle` radians.
    ///
    /// Uses Rodrigues' rotation formula.
    pub fn rotation_about_axis(axis: &Dir3, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (axis.as_ref().x, axis.as_ref().y, axis.as_ref().z);
        let rotation = Mat3::new(
            t * x * x + c,
            t * x * y - s * z,
            t * x * z + s * y,
            t * x * y + s * z,
            t * y * y + c,
            t * y * z - s * x,
            t * x * z - s * y,
            t * y * z + s * x,
            t * z * z + c,
        );
        Self {
            rotation,
            translation: Vec3::zeros(),
        }
    }

    /// Build a transformation from the parameters of a `TR` card.
    ///
    /// * `translation` - displacement vector.
    /// * `rotation` - nine parameters: entries 1-3 are `ex'`, 4-6 `ey'`,
    ///   7-9 `ez'`, the basis of the local system in global coordinates.
    ///   `None` means no rotation.
    /// * `indegrees` - rotation parameters are angles in degrees between
    ///   the axes rather than cosines.
    /// * `inverted` - `translation` is the origin of the local system in
    ///   global coordinates. Otherwise it is the origin of the global system
    ///   expressed in the local one.
    ///
    /// Small deviations from orthogonality (below
    /// [`Self::ORTHOGONALITY_TOLERANCE`]) are corrected.
    pub fn from_card(
        translation: [f64; 3],
        rotation: Option<[f64; 9]>,
        indegrees: bool,
        inverted: bool,
    ) -> Result<Self, TransformError> {
        let rotation = match rotation {
            None => Mat3::identity(),
            Some(mut params) => {
                if indegrees {
                    for p in params.iter_mut() {
                        *p = p.to_radians().cos();
                    }
                }
                let ex = Vec3::new(params[0], params[1], params[2]);
                let ey = Vec3::new(params[3], params[4], params[5]);
                let ez = Vec3::new(params[6], params[7], params[8]);
                orthonormalize(Mat3::from_columns(&[ex, ey, ez]))?
            }
        };
        let t = Vec3::from(translation);
        let translation = if inverted { t } else { -(rotation * t) };
        Ok(Self {
            rotation,
            translation,
        })
    }

    /// The rotation part.
    pub fn rotation(&self) -> &Mat3 {
        &self.rotation
    }

    /// The translation part.
    pub fn translation_vector(&self) -> &Vec3 {
        &self.translation
    }

    /// Map a point from local to global coordinates.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        Point3::from(self.rotation * p.coords + self.translation)
    }

    /// Map a vector (no translation).
    pub fn apply_vector(&self, v: &Vec3) -> Vec3 {
        self.rotation * v
    }

    /// The inverse transformation.
    pub fn reverse(&self) -> Self {
        let rt = self.rotation.transpose();
        Self {
            translation: -(rt * self.translation),
            rotation: rt,
        }
    }

    /// Compose: apply `self` first, then `other`.
    pub fn then(&self, other: &Transformation) -> Self {
        Self {
            rotation: other.rotation * self.rotation,
            translation: other.rotation * self.translation + other.translation,
        }
    }
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

fn orthonormalize(m: Mat3) -> Result<Mat3, TransformError> {
    let deviation = (m.transpose() * m - Mat3::identity()).abs().max();
    if deviation > Transformation::ORTHOGONALITY_TOLERANCE {
        return Err(TransformError::NotOrthogonal(deviation));
    }
    if deviation == 0.0 {
        return Ok(m);
    }
    // Nearest orthogonal matrix is U * V^T of the SVD.
    let svd = m.svd(true, true);
    match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => Ok(u * v_t),
        _ => Err(TransformError::Degenerate),
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Band around a surface within which a point counts as lying on it.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances (1e-12 linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-12,
        angular: 1e-9,
    };

    /// Three-valued sign of an implicit-function value: `0` inside the
    /// tolerance band, otherwise `-1` or `+1`.
    pub fn sign(&self, value: f64) -> i8 {
        if value > self.linear {
            1
        } else if value < -self.linear {
            -1
        } else {
            0
        }
    }

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

//! Oriented boxes: the regions that expressions are tested against.

use cellgeom_math::{Point3, Vec3};
use rand::Rng;

use crate::error::{GeomError, Result};

const FRAME_TOL: f64 = 1e-9;

/// A rectangular box with its own orthonormal frame.
///
/// `dimensions` are full edge lengths along the frame axes, not half-sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct GeomBox {
    center: Point3,
    frame: [Vec3; 3],
    dimensions: [f64; 3],
}

impl GeomBox {
    /// Axis-aligned box from a center point and full dimensions.
    pub fn new(center: Point3, dimensions: [f64; 3]) -> Result<Self> {
        Self::with_frame(center, dimensions, [Vec3::x(), Vec3::y(), Vec3::z()])
    }

    /// Axis-aligned box spanning two opposite corners.
    pub fn from_corners(a: Point3, b: Point3) -> Result<Self> {
        let center = Point3::from((a.coords + b.coords) * 0.5);
        let d = b - a;
        Self::new(center, [d.x.abs(), d.y.abs(), d.z.abs()])
    }

    /// Box with an explicit frame. The frame vectors must be orthonormal.
    pub fn with_frame(center: Point3, dimensions: [f64; 3], frame: [Vec3; 3]) -> Result<Self> {
        if dimensions.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(GeomError::InvalidDimensions(dimensions));
        }
        if !center.coords.iter().all(|c| c.is_finite()) {
            return Err(GeomError::DegenerateBox(format!(
                "non-finite center {:?}",
                center
            )));
        }
        for i in 0..3 {
            if (frame[i].norm() - 1.0).abs() > FRAME_TOL {
                return Err(GeomError::InvalidFrame);
            }
            for j in (i + 1)..3 {
                if frame[i].dot(&frame[j]).abs() > FRAME_TOL {
                    return Err(GeomError::InvalidFrame);
                }
            }
        }
        let b = Self {
            center,
            frame,
            dimensions,
        };
        let v = b.volume();
        if !v.is_finite() || v <= 0.0 {
            return Err(GeomError::DegenerateBox(format!("volume {v}")));
        }
        Ok(b)
    }

    /// Center point.
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Full edge lengths along the frame axes.
    pub fn dimensions(&self) -> [f64; 3] {
        self.dimensions
    }

    /// The frame axes.
    pub fn frame(&self) -> &[Vec3; 3] {
        &self.frame
    }

    /// Box volume.
    pub fn volume(&self) -> f64 {
        self.dimensions.iter().product()
    }

    /// Half the length of the space diagonal.
    pub fn half_diagonal(&self) -> f64 {
        0.5 * self.dimensions.iter().map(|d| d * d).sum::<f64>().sqrt()
    }

    /// Index of the axis with the largest dimension (first on ties).
    pub fn largest_axis(&self) -> usize {
        let mut best = 0;
        for i in 1..3 {
            if self.dimensions[i] > self.dimensions[best] {
                best = i;
            }
        }
        best
    }

    /// Coordinates of `p` in the box frame, relative to the center.
    pub fn to_local(&self, p: &Point3) -> Vec3 {
        let d = p - self.center;
        Vec3::new(
            d.dot(&self.frame[0]),
            d.dot(&self.frame[1]),
            d.dot(&self.frame[2]),
        )
    }

    /// Global point for local offsets from the center.
    pub fn to_global(&self, local: &Vec3) -> Point3 {
        self.center + self.frame[0] * local.x + self.frame[1] * local.y + self.frame[2] * local.z
    }

    /// The eight corners. Bit `i` of the index selects the upper face along axis `i`.
    pub fn corners(&self) -> [Point3; 8] {
        let mut out = [self.center; 8];
        for (k, corner) in out.iter_mut().enumerate() {
            let mut local = Vec3::zeros();
            for i in 0..3 {
                let s = if k & (1 << i) != 0 { 0.5 } else { -0.5 };
                local[i] = s * self.dimensions[i];
            }
            *corner = self.to_global(&local);
        }
        out
    }

    /// Axis-aligned bounds in global coordinates as `(min, max)`.
    pub fn bounds(&self) -> (Point3, Point3) {
        let mut extent = Vec3::zeros();
        for i in 0..3 {
            extent += self.frame[i].abs() * (0.5 * self.dimensions[i]);
        }
        (self.center - extent, self.center + extent)
    }

    /// Whether `p` lies in the closed box.
    pub fn contains_point(&self, p: &Point3) -> bool {
        let local = self.to_local(p);
        (0..3).all(|i| local[i].abs() <= 0.5 * self.dimensions[i])
    }

    /// Split along `axis` so that the first box receives `ratio` of the edge.
    ///
    /// The first box is on the lower side of the axis, the second on the upper.
    pub fn split(&self, axis: usize, ratio: f64) -> Result<(GeomBox, GeomBox)> {
        if axis > 2 {
            return Err(GeomError::DegenerateBox(format!("no axis {axis}")));
        }
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(GeomError::DegenerateBox(format!(
                "split ratio {ratio} outside (0, 1)"
            )));
        }
        let d = self.dimensions[axis];
        let (d1, d2) = (d * ratio, d * (1.0 - ratio));
        if d1 <= 0.0 || d2 <= 0.0 {
            return Err(GeomError::DegenerateBox(format!(
                "split of edge {d} underflows"
            )));
        }
        let e = self.frame[axis];
        let mut dims1 = self.dimensions;
        let mut dims2 = self.dimensions;
        dims1[axis] = d1;
        dims2[axis] = d2;
        let lower = GeomBox {
            center: self.center - e * (0.5 * d2),
            frame: self.frame,
            dimensions: dims1,
        };
        let upper = GeomBox {
            center: self.center + e * (0.5 * d1),
            frame: self.frame,
            dimensions: dims2,
        };
        Ok((lower, upper))
    }

    /// Split in half across the largest dimension.
    pub fn split_auto(&self) -> Result<(GeomBox, GeomBox)> {
        self.split(self.largest_axis(), 0.5)
    }

    /// `n` points drawn uniformly from the box.
    pub fn random_points<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Point3> {
        (0..n)
            .map(|_| {
                let local = Vec3::new(
                    (rng.gen::<f64>() - 0.5) * self.dimensions[0],
                    (rng.gen::<f64>() - 0.5) * self.dimensions[1],
                    (rng.gen::<f64>() - 0.5) * self.dimensions[2],
                );
                self.to_global(&local)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_volume_and_corners() {
        let b = GeomBox::new(Point3::new(1.0, 2.0, 3.0), [2.0, 4.0, 6.0]).unwrap();
        assert_relative_eq!(b.volume(), 48.0);
        let corners = b.corners();
        assert_relative_eq!(corners[0].x, 0.0);
        assert_relative_eq!(corners[0].y, 0.0);
        assert_relative_eq!(corners[0].z, 0.0);
        assert_relative_eq!(corners[7].x, 2.0);
        assert_relative_eq!(corners[7].y, 4.0);
        assert_relative_eq!(corners[7].z, 6.0);
    }

    #[test]
    fn test_from_corners() {
        let b = GeomBox::from_corners(Point3::new(1.0, 1.0, 1.0), Point3::new(-1.0, 3.0, 2.0))
            .unwrap();
        assert_eq!(b.dimensions(), [2.0, 2.0, 1.0]);
        assert_relative_eq!(b.center().y, 2.0);
    }

    #[test]
    fn test_rejects_degenerate() {
        assert!(matches!(
            GeomBox::new(Point3::origin(), [1.0, 0.0, 1.0]),
            Err(GeomError::InvalidDimensions(_))
        ));
        assert!(matches!(
            GeomBox::new(Point3::origin(), [1.0, f64::NAN, 1.0]),
            Err(GeomError::InvalidDimensions(_))
        ));
        let skew = [Vec3::x(), Vec3::new(1.0, 1.0, 0.0).normalize(), Vec3::z()];
        assert!(matches!(
            GeomBox::with_frame(Point3::origin(), [1.0; 3], skew),
            Err(GeomError::InvalidFrame)
        ));
    }

    #[test]
    fn test_split() {
        let b = GeomBox::new(Point3::origin(), [4.0, 2.0, 2.0]).unwrap();
        let (lo, hi) = b.split(0, 0.25).unwrap();
        assert_relative_eq!(lo.dimensions()[0], 1.0);
        assert_relative_eq!(hi.dimensions()[0], 3.0);
        assert_relative_eq!(lo.center().x, -1.5);
        assert_relative_eq!(hi.center().x, 0.5);
        assert_relative_eq!(lo.volume() + hi.volume(), b.volume());
        assert!(b.split(0, 1.0).is_err());
        assert!(b.split(3, 0.5).is_err());
    }

    #[test]
    fn test_split_auto_uses_largest_axis() {
        let b = GeomBox::new(Point3::origin(), [1.0, 5.0, 2.0]).unwrap();
        let (lo, hi) = b.split_auto().unwrap();
        assert_relative_eq!(lo.dimensions()[1], 2.5);
        assert_relative_eq!(lo.center().y, -1.25);
        assert_relative_eq!(hi.center().y, 1.25);
    }

    #[test]
    fn test_rotated_frame() {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let frame = [Vec3::new(s, s, 0.0), Vec3::new(-s, s, 0.0), Vec3::z()];
        let b = GeomBox::with_frame(Point3::origin(), [2.0, 2.0, 2.0], frame).unwrap();
        assert!(b.contains_point(&Point3::new(0.0, 1.3, 0.0)));
        assert!(!b.contains_point(&Point3::new(1.0, 1.0, 0.0)));
        let (min, max) = b.bounds();
        assert_relative_eq!(max.x, 2.0 * s, epsilon = 1e-12);
        assert_relative_eq!(min.y, -2.0 * s, epsilon = 1e-12);
    }

    #[test]
    fn test_random_points_inside() {
        let b = GeomBox::new(Point3::new(3.0, -1.0, 0.5), [1.0, 2.0, 0.1]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let points = b.random_points(500, &mut rng);
        assert_eq!(points.len(), 500);
        assert!(points.iter().all(|p| b.contains_point(p)));
    }
}

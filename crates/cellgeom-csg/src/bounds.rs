//! Bounding-box search.

use cellgeom_geom::GeomBox;
use tracing::{debug, instrument};

use crate::classification::Classification;
use crate::classify::classify_refined;
use crate::error::{CsgError, Result};
use crate::expr::BoolExpr;
use crate::settings::BoundsSettings;

/// Smallest tolerance, relative to the box scale, that bisection can still resolve.
const RESOLUTION: f64 = 64.0 * f64::EPSILON;

/// Shrink `initial` to a box that still contains everything of `expr` that
/// was inside it.
///
/// For each axis the upper face is moved inward by bisection while the part
/// cut off is outside the geometry, until the search interval is at most
/// `tol`; then the lower face. Box tests are refined down to `tol^3`.
///
/// The initial box must cut the geometry (classify as ambiguous), otherwise
/// [`CsgError::InvalidInitialBox`] is returned. A tolerance too small to be
/// resolved at the box's coordinates is [`CsgError::InvalidSettings`], and a
/// bisection step that no longer narrows the interval ends that face.
/// Geometry that is not convex along an axis can leave the result larger
/// than the tightest box.
#[instrument(skip(expr, initial), fields(complexity = expr.complexity()))]
pub fn bounding_box(expr: &BoolExpr, initial: &GeomBox, tol: f64) -> Result<GeomBox> {
    BoundsSettings { tolerance: tol }.validate()?;
    let scale = initial.center().coords.abs().max()
        + initial.dimensions().into_iter().fold(0.0, f64::max);
    if tol <= RESOLUTION * scale {
        return Err(CsgError::InvalidSettings(format!(
            "tolerance {tol} is below the floating-point resolution of a box at scale {scale}"
        )));
    }
    let start = expr.classify(initial);
    if start != Classification::Ambiguous {
        return Err(CsgError::InvalidInitialBox(start.to_string()));
    }
    let min_volume = tol.powi(3);

    let mut b = initial.clone();
    for axis in 0..3 {
        // Upper face.
        let mut lower = 0.0;
        loop {
            let gap = b.dimensions()[axis] - lower;
            if gap <= tol {
                break;
            }
            let edge = b.dimensions()[axis];
            let (b1, b2) = b.split(axis, 0.5 * (lower + edge) / edge)?;
            if classify_refined(expr, &b2, min_volume)? == Classification::Outside {
                b = b1;
            } else {
                lower = b1.dimensions()[axis];
            }
            if b.dimensions()[axis] - lower >= gap {
                break;
            }
        }
        // Lower face.
        let mut upper = 0.0;
        loop {
            let gap = b.dimensions()[axis] - upper;
            if gap <= tol {
                break;
            }
            let edge = b.dimensions()[axis];
            let (b1, b2) = b.split(axis, 0.5 * (edge - upper) / edge)?;
            if classify_refined(expr, &b1, min_volume)? == Classification::Outside {
                b = b2;
            } else {
                upper = b2.dimensions()[axis];
            }
            if b.dimensions()[axis] - upper >= gap {
                break;
            }
        }
        debug!(axis, extent = b.dimensions()[axis], "axis bounded");
    }
    Ok(b)
}

/// [`bounding_box`] with the tolerance from a settings struct.
pub fn bounding_box_with(
    expr: &BoolExpr,
    initial: &GeomBox,
    settings: &BoundsSettings,
) -> Result<GeomBox> {
    bounding_box(expr, initial, settings.tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgeom_geom::{Plane, SurfaceRef};
    use cellgeom_math::Point3;

    fn slab_box() -> BoolExpr {
        // 1 < x < 3, -2 < y < 0, 0 < z < 5
        let p = |n: u32, plane: Plane, s: bool| BoolExpr::halfspace(SurfaceRef::new(n, plane), s);
        BoolExpr::intersection([
            p(1, Plane::px(1.0).unwrap(), true),
            p(2, Plane::px(3.0).unwrap(), false),
            p(3, Plane::py(-2.0).unwrap(), true),
            p(4, Plane::py(0.0).unwrap(), false),
            p(5, Plane::pz(0.0).unwrap(), true),
            p(6, Plane::pz(5.0).unwrap(), false),
        ])
    }

    #[test]
    fn test_planar_box() {
        let e = slab_box();
        let start = GeomBox::new(Point3::origin(), [20.0; 3]).unwrap();
        let tol = 0.05;
        let b = bounding_box(&e, &start, tol).unwrap();
        let (min, max) = b.bounds();
        let expected = [(1.0, 3.0), (-2.0, 0.0), (0.0, 5.0)];
        for (axis, (lo, hi)) in expected.iter().enumerate() {
            let (lo, hi) = (*lo, *hi);
            assert!(
                min[axis] <= lo + 1e-9 && min[axis] >= lo - tol,
                "axis {axis} min {}",
                min[axis]
            );
            assert!(
                max[axis] >= hi - 1e-9 && max[axis] <= hi + tol,
                "axis {axis} max {}",
                max[axis]
            );
        }
    }

    #[test]
    fn test_rejects_box_without_boundary() {
        let e = slab_box();
        let far = GeomBox::new(Point3::new(50.0, 0.0, 0.0), [1.0; 3]).unwrap();
        assert!(matches!(
            bounding_box(&e, &far, 0.1),
            Err(CsgError::InvalidInitialBox(_))
        ));
        let start = GeomBox::new(Point3::origin(), [20.0; 3]).unwrap();
        assert!(matches!(
            bounding_box(&e, &start, 0.0),
            Err(CsgError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_rejects_unresolvable_tolerance() {
        let e = slab_box();
        let start = GeomBox::new(Point3::origin(), [20.0; 3]).unwrap();
        assert!(matches!(
            bounding_box(&e, &start, 1e-15),
            Err(CsgError::InvalidSettings(_))
        ));
        let far = GeomBox::new(Point3::new(1e9, 0.0, 0.0), [1e9; 3]).unwrap();
        assert!(matches!(
            bounding_box(&e, &far, 1e-6),
            Err(CsgError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_small_tolerance_terminates() {
        let e = slab_box();
        let start = GeomBox::new(Point3::origin(), [20.0; 3]).unwrap();
        let tol = 1e-9;
        let b = bounding_box(&e, &start, tol).unwrap();
        let (min, max) = b.bounds();
        let expected = [(1.0, 3.0), (-2.0, 0.0), (0.0, 5.0)];
        for (axis, (lo, hi)) in expected.into_iter().enumerate() {
            assert!((min[axis] - lo).abs() <= 1e-6, "axis {axis} min {}", min[axis]);
            assert!((max[axis] - hi).abs() <= 1e-6, "axis {axis} max {}", max[axis]);
        }
    }
}

//! Analytic surfaces with three-valued point and box tests.
//!
//! Every surface is the zero set of an implicit function `f`. A point is on
//! the positive side when `f > 0` (outside a sphere, cylinder or cone; on the
//! normal side of a plane). Box tests return `+1` when the whole box is on the
//! positive side, `-1` when it is on the negative side, and `0` when the
//! surface may cross it. A `0` is always allowed: implementations that cannot
//! decide cheaply answer `0`, never a wrong sign.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use cellgeom_math::{Point3, Tolerance, Transformation, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{GeomError, Result};
use crate::geom_box::GeomBox;

/// The kind of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SurfaceKind {
    /// Infinite plane.
    Plane,
    /// Sphere.
    Sphere,
    /// Infinite circular cylinder.
    Cylinder,
    /// Double-sheeted circular cone.
    Cone,
}

/// An analytic surface that can classify points and boxes.
pub trait Surface: Send + Sync + fmt::Debug {
    /// Implicit function value at `p`.
    fn value(&self, p: &Point3) -> f64;

    /// Sense of `p`: `+1`, `-1`, or `0` within the linear tolerance.
    fn classify_point(&self, p: &Point3) -> i8 {
        Tolerance::DEFAULT.sign(self.value(p))
    }

    /// Sense of the whole box: `+1`, `-1`, or `0` if undecided.
    fn classify_box(&self, b: &GeomBox) -> i8;

    /// The kind of this surface.
    fn surface_type(&self) -> SurfaceKind;

    /// Defining parameters, in a fixed order per kind.
    fn parameters(&self) -> Vec<f64>;

    /// Apply a transformation, returning a new surface.
    fn transform(&self, t: &Transformation) -> Box<dyn Surface>;
}

fn check_finite(what: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(GeomError::InvalidSurface(format!("{what} has non-finite parameters")))
    }
}

fn unit(what: &str, v: Vec3) -> Result<Vec3> {
    let n = v.norm();
    if !n.is_finite() || n < 1e-300 {
        return Err(GeomError::InvalidSurface(format!("{what} direction is zero")));
    }
    Ok(v / n)
}

/// Classify by the distance range `[dmin, dmax]` from a reference set to the
/// box, against a threshold `r` with the positive side at large distance.
fn by_distance(dmin: f64, dmax: f64, r: f64) -> i8 {
    if dmin >= r {
        1
    } else if dmax <= r {
        -1
    } else {
        0
    }
}

// =============================================================================
// Plane
// =============================================================================

/// Plane `normal . x + offset = 0`, with a unit normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal, pointing to the positive side.
    pub normal: Vec3,
    /// Signed offset.
    pub offset: f64,
}

impl Plane {
    /// Plane `normal . x + offset = 0`. The normal is normalized and the
    /// offset scaled with it.
    pub fn new(normal: Vec3, offset: f64) -> Result<Self> {
        check_finite("plane", &[normal.x, normal.y, normal.z, offset])?;
        let len = normal.norm();
        let n = unit("plane", normal)?;
        Ok(Self {
            normal: n,
            offset: offset / len,
        })
    }

    /// Plane through `point` with the given normal.
    pub fn from_point_normal(point: Point3, normal: Vec3) -> Result<Self> {
        let n = unit("plane", normal)?;
        Self::new(n, -n.dot(&point.coords))
    }

    /// Plane `x = d` (MCNP `PX`), positive for larger `x`.
    pub fn px(d: f64) -> Result<Self> {
        Self::new(Vec3::x(), -d)
    }

    /// Plane `y = d` (MCNP `PY`).
    pub fn py(d: f64) -> Result<Self> {
        Self::new(Vec3::y(), -d)
    }

    /// Plane `z = d` (MCNP `PZ`).
    pub fn pz(d: f64) -> Result<Self> {
        Self::new(Vec3::z(), -d)
    }
}

impl Surface for Plane {
    fn value(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) + self.offset
    }

    fn classify_box(&self, b: &GeomBox) -> i8 {
        // f is linear: its range over the box is center value +- the support.
        let fc = self.value(b.center());
        let dims = b.dimensions();
        let spread: f64 = (0..3)
            .map(|i| 0.5 * dims[i] * self.normal.dot(&b.frame()[i]).abs())
            .sum();
        let tol = Tolerance::DEFAULT.linear;
        if fc - spread > -tol {
            1
        } else if fc + spread < tol {
            -1
        } else {
            0
        }
    }

    fn surface_type(&self) -> SurfaceKind {
        SurfaceKind::Plane
    }

    fn parameters(&self) -> Vec<f64> {
        let n = self.normal;
        vec![n.x, n.y, n.z, self.offset]
    }

    fn transform(&self, t: &Transformation) -> Box<dyn Surface> {
        let point = Point3::from(-self.normal * self.offset);
        let normal = t.apply_vector(&self.normal);
        let point = t.apply_point(&point);
        Box::new(Plane {
            offset: -normal.dot(&point.coords),
            normal,
        })
    }
}

// =============================================================================
// Sphere
// =============================================================================

/// Sphere `|x - center|^2 - radius^2 = 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    /// Center point.
    pub center: Point3,
    /// Radius.
    pub radius: f64,
}

impl Sphere {
    /// Create a sphere. The radius must be positive.
    pub fn new(center: Point3, radius: f64) -> Result<Self> {
        check_finite("sphere", &[center.x, center.y, center.z, radius])?;
        if radius <= 0.0 {
            return Err(GeomError::InvalidSurface(format!(
                "sphere radius {radius} must be positive"
            )));
        }
        Ok(Self { center, radius })
    }
}

impl Surface for Sphere {
    fn value(&self, p: &Point3) -> f64 {
        (p - self.center).norm_squared() - self.radius * self.radius
    }

    fn classify_box(&self, b: &GeomBox) -> i8 {
        let local = b.to_local(&self.center);
        let dims = b.dimensions();
        let mut near = 0.0;
        let mut far = 0.0;
        for i in 0..3 {
            let h = 0.5 * dims[i];
            let c = local[i].abs();
            near += (c - h).max(0.0).powi(2);
            far += (c + h).powi(2);
        }
        by_distance(near.sqrt(), far.sqrt(), self.radius)
    }

    fn surface_type(&self) -> SurfaceKind {
        SurfaceKind::Sphere
    }

    fn parameters(&self) -> Vec<f64> {
        let c = self.center;
        vec![c.x, c.y, c.z, self.radius]
    }

    fn transform(&self, t: &Transformation) -> Box<dyn Surface> {
        Box::new(Sphere {
            center: t.apply_point(&self.center),
            radius: self.radius,
        })
    }
}

// =============================================================================
// Cylinder
// =============================================================================

/// Infinite cylinder of `radius` around the line through `point` along `axis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    /// A point on the axis.
    pub point: Point3,
    /// Unit axis direction.
    pub axis: Vec3,
    /// Radius.
    pub radius: f64,
}

impl Cylinder {
    /// Create a cylinder. The axis is normalized.
    pub fn new(point: Point3, axis: Vec3, radius: f64) -> Result<Self> {
        check_finite(
            "cylinder",
            &[point.x, point.y, point.z, axis.x, axis.y, axis.z, radius],
        )?;
        if radius <= 0.0 {
            return Err(GeomError::InvalidSurface(format!(
                "cylinder radius {radius} must be positive"
            )));
        }
        Ok(Self {
            point,
            axis: unit("cylinder axis", axis)?,
            radius,
        })
    }

    /// Distance from `p` to the axis line.
    fn axis_distance(&self, p: &Point3) -> f64 {
        let d = p - self.point;
        let along = d.dot(&self.axis);
        (d.norm_squared() - along * along).max(0.0).sqrt()
    }
}

impl Surface for Cylinder {
    fn value(&self, p: &Point3) -> f64 {
        let d = p - self.point;
        let along = d.dot(&self.axis);
        d.norm_squared() - along * along - self.radius * self.radius
    }

    fn classify_box(&self, b: &GeomBox) -> i8 {
        let angular = Tolerance::DEFAULT.angular;
        let frame = b.frame();
        if let Some(k) = (0..3).find(|&k| (frame[k].dot(&self.axis).abs() - 1.0).abs() < angular) {
            // Axis parallel to a box edge: a circle against a rectangle.
            let local = b.to_local(&self.point);
            let dims = b.dimensions();
            let mut near = 0.0;
            let mut far = 0.0;
            for i in (0..3).filter(|&i| i != k) {
                let h = 0.5 * dims[i];
                let c = local[i].abs();
                near += (c - h).max(0.0).powi(2);
                far += (c + h).powi(2);
            }
            return by_distance(near.sqrt(), far.sqrt(), self.radius);
        }
        // The inside is convex, so corners decide it.
        if b.corners().iter().all(|c| self.value(c) < 0.0) {
            return -1;
        }
        if self.axis_distance(b.center()) - b.half_diagonal() >= self.radius {
            return 1;
        }
        0
    }

    fn surface_type(&self) -> SurfaceKind {
        SurfaceKind::Cylinder
    }

    fn parameters(&self) -> Vec<f64> {
        let (p, a) = (self.point, self.axis);
        vec![p.x, p.y, p.z, a.x, a.y, a.z, self.radius]
    }

    fn transform(&self, t: &Transformation) -> Box<dyn Surface> {
        Box::new(Cylinder {
            point: t.apply_point(&self.point),
            axis: t.apply_vector(&self.axis),
            radius: self.radius,
        })
    }
}

// =============================================================================
// Cone
// =============================================================================

/// Double-sheeted cone with apex `apex`, unit `axis` and `t2 = tan^2` of the
/// half-angle: `|d|^2 - (d . axis)^2 (1 + t2) = 0` with `d = x - apex`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cone {
    /// Apex point.
    pub apex: Point3,
    /// Unit axis direction.
    pub axis: Vec3,
    /// Squared tangent of the half-angle.
    pub t2: f64,
}

impl Cone {
    /// Create a cone. `t2` must be positive.
    pub fn new(apex: Point3, axis: Vec3, t2: f64) -> Result<Self> {
        check_finite("cone", &[apex.x, apex.y, apex.z, axis.x, axis.y, axis.z, t2])?;
        if t2 <= 0.0 {
            return Err(GeomError::InvalidSurface(format!(
                "cone t2 {t2} must be positive"
            )));
        }
        Ok(Self {
            apex,
            axis: unit("cone axis", axis)?,
            t2,
        })
    }

    /// Distance from `p` to the cone surface and whether `p` is inside.
    fn surface_distance(&self, p: &Point3) -> (f64, bool) {
        let d = p - self.apex;
        let len = d.norm();
        let along = d.dot(&self.axis).abs();
        let radial = (d.norm_squared() - along * along).max(0.0).sqrt();
        let phi = radial.atan2(along);
        let theta = self.t2.sqrt().atan();
        (len * (phi - theta).abs().sin(), phi < theta)
    }
}

impl Surface for Cone {
    fn value(&self, p: &Point3) -> f64 {
        let d = p - self.apex;
        let along = d.dot(&self.axis);
        d.norm_squared() - along * along * (1.0 + self.t2)
    }

    fn classify_box(&self, b: &GeomBox) -> i8 {
        // Bounding sphere of the box against the distance to the surface.
        let (dist, inside) = self.surface_distance(b.center());
        if dist > b.half_diagonal() {
            if inside {
                -1
            } else {
                1
            }
        } else {
            0
        }
    }

    fn surface_type(&self) -> SurfaceKind {
        SurfaceKind::Cone
    }

    fn parameters(&self) -> Vec<f64> {
        let (p, a) = (self.apex, self.axis);
        vec![p.x, p.y, p.z, a.x, a.y, a.z, self.t2]
    }

    fn transform(&self, t: &Transformation) -> Box<dyn Surface> {
        Box::new(Cone {
            apex: t.apply_point(&self.apex),
            axis: t.apply_vector(&self.axis),
            t2: self.t2,
        })
    }
}

// =============================================================================
// Surface handle
// =============================================================================

/// A shared surface with its card name.
///
/// Identity is the name together with the surface kind and parameters, so a
/// transformed copy is a different surface even though it keeps the name.
/// The name alone is used for display.
#[derive(Clone)]
pub struct SurfaceRef {
    name: u32,
    kind: SurfaceKind,
    params: Arc<[u64]>,
    fingerprint: u64,
    surface: Arc<dyn Surface>,
}

impl SurfaceRef {
    /// Wrap a surface under a card name.
    pub fn new(name: u32, surface: impl Surface + 'static) -> Self {
        Self::from_arc(name, Arc::new(surface))
    }

    /// Wrap an already boxed surface.
    pub fn from_boxed(name: u32, surface: Box<dyn Surface>) -> Self {
        Self::from_arc(name, Arc::from(surface))
    }

    fn from_arc(name: u32, surface: Arc<dyn Surface>) -> Self {
        let kind = surface.surface_type();
        // -0.0 and 0.0 describe the same surface.
        let params: Arc<[u64]> = surface
            .parameters()
            .into_iter()
            .map(|v| if v == 0.0 { 0.0f64 } else { v }.to_bits())
            .collect();
        let seed = (u64::from(name) << 8) | kind as u64;
        let fingerprint = params
            .iter()
            .fold(seed ^ FNV_OFFSET, |h, &b| (h ^ b).wrapping_mul(FNV_PRIME));
        Self {
            name,
            kind,
            params,
            fingerprint,
            surface,
        }
    }

    /// Card name.
    pub fn name(&self) -> u32 {
        self.name
    }

    /// Hash of the name, kind and parameters. Equal handles share it.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// The underlying surface.
    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    /// Transformed copy under the same name. It compares equal to `self`
    /// only when the transform leaves the parameters unchanged.
    pub fn transform(&self, t: &Transformation) -> Self {
        Self::from_boxed(self.name, self.surface.transform(t))
    }

    /// See [`Surface::classify_point`].
    pub fn classify_point(&self, p: &Point3) -> i8 {
        self.surface.classify_point(p)
    }

    /// See [`Surface::classify_box`].
    pub fn classify_box(&self, b: &GeomBox) -> i8 {
        self.surface.classify_box(b)
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

impl fmt::Debug for SurfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceRef")
            .field("name", &self.name)
            .field("surface", &self.surface)
            .finish()
    }
}

impl PartialEq for SurfaceRef {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for SurfaceRef {}

impl PartialOrd for SurfaceRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SurfaceRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.params.cmp(&other.params))
    }
}

impl Hash for SurfaceRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.fingerprint);
    }
}

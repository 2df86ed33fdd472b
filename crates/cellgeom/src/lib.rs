#![warn(missing_docs)]

//! Cell geometry for radiation-transport input decks.
//!
//! Provides the [`Cell`] type: a named boolean expression over surface
//! half-spaces together with its card options. Cells can be combined,
//! transformed, filled by universes, simplified inside a region, measured
//! and bounded. The lower layers are re-exported for direct use.
//!
//! # Example
//!
//! ```
//! use cellgeom::{BoolExpr, Cell, GeomBox, Point3, SimplifySettings, Sphere, SurfaceRef};
//!
//! let ball = SurfaceRef::new(1, Sphere::new(Point3::origin(), 1.0).unwrap());
//! let far = SurfaceRef::new(2, Sphere::new(Point3::new(50.0, 0.0, 0.0), 1.0).unwrap());
//! let cell = Cell::new(
//!     10,
//!     BoolExpr::intersection([
//!         BoolExpr::halfspace(ball, false),
//!         BoolExpr::halfspace(far, true),
//!     ]),
//! );
//! let region = GeomBox::new(Point3::origin(), [4.0; 3]).unwrap();
//! let simple = cell.simplify(&region, &SimplifySettings::default()).unwrap();
//! assert_eq!(simple.geometry().complexity(), 1);
//! ```

pub use cellgeom_csg;
pub use cellgeom_geom;
pub use cellgeom_math;

pub mod cell;
pub mod config;
pub mod error;

pub use cell::{Cell, FILL, UNIVERSE};
pub use cellgeom_csg::{
    bounding_box, simplify, volume, BoolExpr, BoundsSettings, Classification, CsgError,
    Halfspace, SimplifySettings, Token, VolumeSettings,
};
pub use cellgeom_geom::{Cone, Cylinder, GeomBox, GeomError, Plane, Sphere, Surface, SurfaceRef};
pub use cellgeom_math::{Point3, Transformation, Vec3};
pub use config::{BoxSpec, GeometryConfig, GLOBAL_BOX_SIZE};
pub use error::{CellError, Result};

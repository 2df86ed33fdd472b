#![warn(missing_docs)]

//! Boxes and analytic surfaces for cellgeom.
//!
//! A [`GeomBox`] is an oriented rectangular region. A [`Surface`] answers
//! which side of it a point or a whole box lies on, and surfaces are shared
//! between expressions through named [`SurfaceRef`] handles.

pub mod error;
pub mod geom_box;
pub mod surface;

pub use error::{GeomError, Result};
pub use geom_box::GeomBox;
pub use surface::{Cone, Cylinder, Plane, Sphere, Surface, SurfaceKind, SurfaceRef};

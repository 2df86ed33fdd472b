#![warn(missing_docs)]

//! Boolean expressions over half-spaces and the algorithms that query them.
//!
//! A cell of a transport model is a [`BoolExpr`]: a normalized tree of
//! intersections and unions over [`Halfspace`] leaves. The engine answers
//! three questions about it:
//!
//! 1. **Classification**: is a box inside, outside, or crossing the cell
//!    ([`BoolExpr::classify`]), and which simpler forms are equivalent inside
//!    that box ([`classify_with_candidates`]).
//! 2. **Simplification**: the smallest forms found by bisecting ambiguous
//!    boxes and merging what each piece needs ([`simplify`]).
//! 3. **Measurement**: volume by subdivision and sampling ([`volume`]) and a
//!    tight bounding box by per-axis bisection ([`bounding_box`]).

pub mod bounds;
pub mod candidate;
pub mod classification;
pub mod classify;
pub mod error;
pub mod expr;
pub mod polish;
pub mod settings;
pub mod simplify;
pub mod volume;

pub use bounds::{bounding_box, bounding_box_with};
pub use candidate::{CandidateNode, CandidateOp};
pub use classification::Classification;
pub use classify::{classify_refined, classify_with_candidates, trim_candidates};
pub use error::{CsgError, Result};
pub use expr::{BoolExpr, ExprKind, Halfspace};
pub use polish::Token;
pub use settings::{
    BoundsSettings, SimplifySettings, VolumeSettings, DEFAULT_SAMPLE_COUNT, DEFAULT_SEED,
    MIN_BOX_VOLUME,
};
pub use simplify::{simplify, simplify_with};
pub use volume::{volume, volume_seeded, volume_with};

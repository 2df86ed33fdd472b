//! Canonical boolean expressions over half-spaces.
//!
//! A [`BoolExpr`] is an immutable, reference-counted tree. Every node is
//! normalized on construction: nested operators are flattened, constants are
//! absorbed, complementary operands collapse the node, and children are kept
//! sorted and deduplicated. Each node memoizes a structural hash chosen so
//! that `hash(e.complement()) == !hash(e)`, which makes the complementary
//! pair scan a hash lookup followed by one structural check.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use cellgeom_geom::{GeomBox, SurfaceRef};
use cellgeom_math::{Point3, Transformation};

use crate::classification::Classification;

const EMPTY_HASH: u64 = 0x9e37_79b9_7f4a_7c15;
const LEAF_SALT: u64 = 0xc2b2_ae3d_27d4_eb4f;
const AND_SEED: u64 = 0x165e_67b9_5a4f_9a1d;

/// SplitMix64 finalizer.
pub(crate) fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn and_hash(mut hashes: Vec<u64>) -> u64 {
    hashes.sort_unstable();
    hashes
        .into_iter()
        .fold(AND_SEED, |acc, h| mix(acc.rotate_left(7) ^ h))
}

fn or_hash(hashes: Vec<u64>) -> u64 {
    !and_hash(hashes.into_iter().map(|h| !h).collect())
}

/// Whether the sorted children of an `op` node contain a complementary pair:
/// two complementary children, or a child of the dual operator whose
/// operands all appear complemented among the siblings.
fn collapses(children: &[BoolExpr], op: Op) -> bool {
    let hashes: HashSet<u64> = children.iter().map(|c| c.0.hash).collect();
    let present = |e: &BoolExpr| {
        hashes.contains(&!e.0.hash) && children.binary_search(&e.complement()).is_ok()
    };
    children.iter().any(|c| {
        if present(c) {
            return true;
        }
        match (c.kind(), op) {
            (ExprKind::Or(d), Op::And) | (ExprKind::And(d), Op::Or) => d.iter().all(|x| present(x)),
            _ => false,
        }
    })
}

// =============================================================================
// Half-space
// =============================================================================

/// One side of a surface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Halfspace {
    surface: SurfaceRef,
    positive: bool,
}

impl Halfspace {
    /// Half-space on the given side of `surface`.
    pub fn new(surface: SurfaceRef, positive: bool) -> Self {
        Self { surface, positive }
    }

    /// The surface.
    pub fn surface(&self) -> &SurfaceRef {
        &self.surface
    }

    /// True for the positive side.
    pub fn is_positive(&self) -> bool {
        self.positive
    }

    /// `+1` or `-1`.
    pub fn sign(&self) -> i8 {
        if self.positive {
            1
        } else {
            -1
        }
    }

    /// The other side of the same surface.
    pub fn complement(&self) -> Self {
        Self {
            surface: self.surface.clone(),
            positive: !self.positive,
        }
    }

    /// Classify a box against this half-space.
    pub fn classify_box(&self, b: &GeomBox) -> Classification {
        Classification::from_sign(self.surface.classify_box(b) * self.sign())
    }

    /// Classify a point against this half-space.
    pub fn classify_point(&self, p: &Point3) -> Classification {
        Classification::from_sign(self.surface.classify_point(p) * self.sign())
    }

    fn structural_hash(&self) -> u64 {
        let h = mix(self.surface.fingerprint() ^ LEAF_SALT);
        if self.positive {
            h
        } else {
            !h
        }
    }
}

// =============================================================================
// Expression
// =============================================================================

/// Node contents of a [`BoolExpr`].
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// The empty set.
    Empty,
    /// All of space.
    Full,
    /// A single half-space.
    Leaf(Halfspace),
    /// Intersection of at least two children, none of them `And`.
    And(Vec<BoolExpr>),
    /// Union of at least two children, none of them `Or`.
    Or(Vec<BoolExpr>),
}

impl ExprKind {
    fn rank(&self) -> u8 {
        match self {
            ExprKind::Empty => 0,
            ExprKind::Full => 1,
            ExprKind::Leaf(_) => 2,
            ExprKind::And(_) => 3,
            ExprKind::Or(_) => 4,
        }
    }
}

#[derive(Debug)]
struct Node {
    kind: ExprKind,
    hash: u64,
    complexity: usize,
}

/// A normalized boolean expression over half-spaces.
///
/// Cloning is cheap. Equality and ordering are structural; ordering compares
/// the memoized hash first and falls back to structure, which gives the
/// canonical order used for children and for tie-breaks.
#[derive(Clone)]
pub struct BoolExpr(Arc<Node>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    And,
    Or,
}

impl BoolExpr {
    fn from_kind(kind: ExprKind) -> Self {
        let (hash, complexity) = match &kind {
            ExprKind::Empty => (EMPTY_HASH, 0),
            ExprKind::Full => (!EMPTY_HASH, 0),
            ExprKind::Leaf(h) => (h.structural_hash(), 1),
            ExprKind::And(c) => (
                and_hash(c.iter().map(|e| e.0.hash).collect()),
                c.iter().map(|e| e.0.complexity).sum(),
            ),
            ExprKind::Or(c) => (
                or_hash(c.iter().map(|e| e.0.hash).collect()),
                c.iter().map(|e| e.0.complexity).sum(),
            ),
        };
        BoolExpr(Arc::new(Node {
            kind,
            hash,
            complexity,
        }))
    }

    /// The empty set.
    pub fn empty() -> Self {
        Self::from_kind(ExprKind::Empty)
    }

    /// All of space.
    pub fn full() -> Self {
        Self::from_kind(ExprKind::Full)
    }

    /// A single half-space.
    pub fn leaf(halfspace: Halfspace) -> Self {
        Self::from_kind(ExprKind::Leaf(halfspace))
    }

    /// The half-space on the given side of `surface`.
    pub fn halfspace(surface: SurfaceRef, positive: bool) -> Self {
        Self::leaf(Halfspace::new(surface, positive))
    }

    /// Normalized intersection of any number of operands.
    pub fn intersection<I: IntoIterator<Item = BoolExpr>>(operands: I) -> Self {
        Self::combine(Op::And, operands)
    }

    /// Normalized union of any number of operands.
    pub fn union<I: IntoIterator<Item = BoolExpr>>(operands: I) -> Self {
        Self::combine(Op::Or, operands)
    }

    pub(crate) fn combine<I: IntoIterator<Item = BoolExpr>>(op: Op, operands: I) -> Self {
        let (identity, absorbing): (fn() -> Self, fn() -> Self) = match op {
            Op::And => (Self::full, Self::empty),
            Op::Or => (Self::empty, Self::full),
        };
        let mut children = Vec::new();
        for item in operands {
            match (item.kind(), op) {
                (ExprKind::And(c), Op::And) | (ExprKind::Or(c), Op::Or) => {
                    children.extend(c.iter().cloned());
                    continue;
                }
                (ExprKind::Full, Op::And) | (ExprKind::Empty, Op::Or) => continue,
                (ExprKind::Empty, Op::And) | (ExprKind::Full, Op::Or) => return absorbing(),
                _ => {}
            }
            children.push(item);
        }

        children.sort();
        children.dedup();
        if collapses(&children, op) {
            return absorbing();
        }

        match children.len() {
            0 => identity(),
            1 => children.pop().unwrap_or_else(identity),
            _ => Self::from_kind(match op {
                Op::And => ExprKind::And(children),
                Op::Or => ExprKind::Or(children),
            }),
        }
    }

    /// The complement: leaves flip sides, `And` and `Or` swap with
    /// complemented children, `Empty` and `Full` swap.
    pub fn complement(&self) -> Self {
        match self.kind() {
            ExprKind::Empty => Self::full(),
            ExprKind::Full => Self::empty(),
            ExprKind::Leaf(h) => Self::leaf(h.complement()),
            ExprKind::And(c) => Self::union(c.iter().map(BoolExpr::complement)),
            ExprKind::Or(c) => Self::intersection(c.iter().map(BoolExpr::complement)),
        }
    }

    /// Node contents.
    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    /// Children of an `And` or `Or` node; empty otherwise.
    pub fn children(&self) -> &[BoolExpr] {
        match self.kind() {
            ExprKind::And(c) | ExprKind::Or(c) => c,
            _ => &[],
        }
    }

    /// Memoized structural hash.
    pub fn structural_hash(&self) -> u64 {
        self.0.hash
    }

    /// Number of leaves.
    pub fn complexity(&self) -> usize {
        self.0.complexity
    }

    /// True for the empty set.
    pub fn is_empty(&self) -> bool {
        matches!(self.kind(), ExprKind::Empty)
    }

    /// True for all of space.
    pub fn is_full(&self) -> bool {
        matches!(self.kind(), ExprKind::Full)
    }

    /// All surfaces referenced by leaves.
    pub fn surfaces(&self) -> BTreeSet<SurfaceRef> {
        let mut out = BTreeSet::new();
        self.collect_surfaces(&mut out);
        out
    }

    fn collect_surfaces(&self, out: &mut BTreeSet<SurfaceRef>) {
        match self.kind() {
            ExprKind::Leaf(h) => {
                out.insert(h.surface().clone());
            }
            ExprKind::And(c) | ExprKind::Or(c) => c.iter().for_each(|e| e.collect_surfaces(out)),
            ExprKind::Empty | ExprKind::Full => {}
        }
    }

    /// Apply a transformation to every leaf surface.
    pub fn transform(&self, t: &Transformation) -> Self {
        match self.kind() {
            ExprKind::Empty | ExprKind::Full => self.clone(),
            ExprKind::Leaf(h) => Self::halfspace(h.surface().transform(t), h.is_positive()),
            ExprKind::And(c) => Self::intersection(c.iter().map(|e| e.transform(t))),
            ExprKind::Or(c) => Self::union(c.iter().map(|e| e.transform(t))),
        }
    }

    fn structural_cmp(&self, other: &Self) -> Ordering {
        match (self.kind(), other.kind()) {
            (ExprKind::Leaf(a), ExprKind::Leaf(b)) => a.cmp(b),
            (ExprKind::And(a), ExprKind::And(b)) | (ExprKind::Or(a), ExprKind::Or(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialEq for BoolExpr {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BoolExpr {}

impl PartialOrd for BoolExpr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BoolExpr {
    fn cmp(&self, other: &Self) -> Ordering {
        if Arc::ptr_eq(&self.0, &other.0) {
            return Ordering::Equal;
        }
        self.0
            .hash
            .cmp(&other.0.hash)
            .then_with(|| self.structural_cmp(other))
    }
}

impl Hash for BoolExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Display for BoolExpr {
    /// Cell-card syntax: juxtaposition for intersection, `(a:b)` for union,
    /// a leading `-` for the negative side.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ExprKind::Empty => f.write_str("EMPTY"),
            ExprKind::Full => f.write_str("FULL"),
            ExprKind::Leaf(h) => {
                if !h.is_positive() {
                    f.write_str("-")?;
                }
                write!(f, "{}", h.surface().name())
            }
            ExprKind::And(c) => {
                for (i, e) in c.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{e}")?;
                }
                Ok(())
            }
            ExprKind::Or(c) => {
                f.write_str("(")?;
                for (i, e) in c.iter().enumerate() {
                    if i > 0 {
                        f.write_str(":")?;
                    }
                    write!(f, "{e}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Debug for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoolExpr({self})")
    }
}

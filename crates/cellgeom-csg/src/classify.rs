//! Box and point classification of expressions.

use cellgeom_geom::GeomBox;
use cellgeom_math::Point3;

use crate::candidate::CandidateNode;
use crate::classification::Classification;
use crate::error::{CsgError, Result};
use crate::expr::{BoolExpr, ExprKind};

impl BoolExpr {
    /// Classify a box. Intersections stop at the first outside child and
    /// unions at the first inside child.
    pub fn classify(&self, b: &GeomBox) -> Classification {
        match self.kind() {
            ExprKind::Empty => Classification::Outside,
            ExprKind::Full => Classification::Inside,
            ExprKind::Leaf(h) => h.classify_box(b),
            ExprKind::And(c) => {
                let mut acc = Classification::Inside;
                for e in c {
                    acc = acc.and(e.classify(b));
                    if acc == Classification::Outside {
                        break;
                    }
                }
                acc
            }
            ExprKind::Or(c) => {
                let mut acc = Classification::Outside;
                for e in c {
                    acc = acc.or(e.classify(b));
                    if acc == Classification::Inside {
                        break;
                    }
                }
                acc
            }
        }
    }

    /// Classify a point: inside, outside, or on the boundary (ambiguous).
    pub fn classify_point(&self, p: &Point3) -> Classification {
        match self.kind() {
            ExprKind::Empty => Classification::Outside,
            ExprKind::Full => Classification::Inside,
            ExprKind::Leaf(h) => h.classify_point(p),
            ExprKind::And(c) => {
                let mut acc = Classification::Inside;
                for e in c {
                    acc = acc.and(e.classify_point(p));
                    if acc == Classification::Outside {
                        break;
                    }
                }
                acc
            }
            ExprKind::Or(c) => {
                let mut acc = Classification::Outside;
                for e in c {
                    acc = acc.or(e.classify_point(p));
                    if acc == Classification::Inside {
                        break;
                    }
                }
                acc
            }
        }
    }
}

/// Classify a box, resolving an ambiguous answer by bisection down to
/// `min_volume`.
///
/// The box is split across its largest dimension. If the first half is
/// still ambiguous the result is ambiguous; otherwise the second half must
/// agree with it.
pub fn classify_refined(expr: &BoolExpr, b: &GeomBox, min_volume: f64) -> Result<Classification> {
    if !(min_volume > 0.0 && min_volume.is_finite()) {
        return Err(CsgError::InvalidSettings(format!(
            "min_volume must be positive, got {min_volume}"
        )));
    }
    refine(expr, b, min_volume)
}

fn refine(expr: &BoolExpr, b: &GeomBox, min_volume: f64) -> Result<Classification> {
    let result = expr.classify(b);
    if !result.is_ambiguous() || b.volume() <= min_volume {
        return Ok(result);
    }
    let (b1, b2) = b.split_auto()?;
    let first = refine(expr, &b1, min_volume)?;
    if first.is_ambiguous() {
        return Ok(first);
    }
    let second = refine(expr, &b2, min_volume)?;
    Ok(if first == second {
        first
    } else {
        Classification::Ambiguous
    })
}

/// Classify a box and return up to `trim` simpler expressions that are
/// equivalent to `expr` inside it.
///
/// Children that evaluate to the identity of their operator are dropped,
/// and when one child decides an operator alone only that child is kept.
pub fn classify_with_candidates(
    expr: &BoolExpr,
    b: &GeomBox,
    trim: usize,
) -> Result<(Classification, Vec<BoolExpr>)> {
    let root = CandidateNode::number(expr);
    let (result, candidates) = root.classify_with_candidates(b, trim);
    if candidates.is_empty() {
        return Err(CsgError::InternalConsistency(format!(
            "no candidates for {expr} in a {result} box"
        )));
    }
    let exprs = candidates.iter().map(CandidateNode::to_expr).collect();
    Ok((result, trim_candidates(exprs, trim)))
}

/// Keep the `max(n, 1)` lowest-complexity expressions, ties broken by the
/// canonical order. Sets no larger than `n` are only deduplicated.
pub fn trim_candidates(mut set: Vec<BoolExpr>, n: usize) -> Vec<BoolExpr> {
    set.sort_by(|a, b| a.complexity().cmp(&b.complexity()).then_with(|| a.cmp(b)));
    set.dedup();
    set.truncate(n.max(1));
    set
}

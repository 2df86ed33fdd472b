//! Region-splitting simplification.

use cellgeom_geom::GeomBox;
use tracing::{debug, instrument, trace};

use crate::candidate::{trim_nodes, CandidateNode};
use crate::classification::Classification;
use crate::classify::trim_candidates;
use crate::error::{CsgError, Result};
use crate::expr::BoolExpr;
use crate::settings::SimplifySettings;

/// Find simpler expressions equivalent to `expr` inside `b`.
///
/// Returns at most `max(trim_size, 1)` candidates, simplest first. When the
/// whole box is inside or outside the result is `[FULL]` or `[EMPTY]`.
/// Otherwise the box is bisected across its largest dimension until each
/// piece is decided, its candidate has at most one leaf, or its volume is at
/// most `min_volume`; the forms found in the pieces are then merged.
#[instrument(skip(expr, b), fields(complexity = expr.complexity()))]
pub fn simplify(
    expr: &BoolExpr,
    b: &GeomBox,
    min_volume: f64,
    trim_size: usize,
) -> Result<Vec<BoolExpr>> {
    SimplifySettings {
        min_volume,
        trim_size,
    }
    .validate()?;

    match expr.classify(b) {
        Classification::Inside => return Ok(vec![BoolExpr::full()]),
        Classification::Outside => return Ok(vec![BoolExpr::empty()]),
        Classification::Ambiguous => {}
    }

    let root = CandidateNode::number(expr);
    let found = simplify_node(&root, b, min_volume, trim_size, 0)?;
    let exprs = found.iter().map(CandidateNode::to_expr).collect();
    let result = trim_candidates(exprs, trim_size);
    debug!(
        candidates = result.len(),
        best = result.first().map(BoolExpr::complexity),
        "simplified"
    );
    Ok(result)
}

/// [`simplify`] with parameters from a settings struct.
pub fn simplify_with(
    expr: &BoolExpr,
    b: &GeomBox,
    settings: &SimplifySettings,
) -> Result<Vec<BoolExpr>> {
    simplify(expr, b, settings.min_volume, settings.trim_size)
}

fn simplify_node(
    node: &CandidateNode,
    b: &GeomBox,
    min_volume: f64,
    trim: usize,
    depth: usize,
) -> Result<Vec<CandidateNode>> {
    let (result, candidates) = node.classify_with_candidates(b, trim);
    if candidates.is_empty() {
        return Err(CsgError::InternalConsistency(format!(
            "classification of node {} produced no candidates",
            node.id()
        )));
    }
    if !result.is_ambiguous() || b.volume() <= min_volume {
        return Ok(candidates);
    }

    let mut simple = Vec::new();
    for candidate in candidates {
        if candidate.effective_complexity() <= 1 {
            simple.push(candidate);
            continue;
        }
        let (b1, b2) = b.split_auto()?;
        trace!(depth, volume = b.volume(), "splitting ambiguous box");
        let (left, right) = rayon::join(
            || simplify_node(&candidate, &b1, min_volume, trim, depth + 1),
            || simplify_node(&candidate, &b2, min_volume, trim, depth + 1),
        );
        let (left, right) = (left?, right?);
        if left.is_empty() {
            simple.extend(right);
        } else if right.is_empty() {
            simple.extend(left);
        } else {
            for l in &left {
                for r in &right {
                    simple.push(l.merge(r)?);
                }
            }
        }
    }
    Ok(trim_nodes(simple, trim))
}

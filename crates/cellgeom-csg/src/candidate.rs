//! Tagged candidate trees used while simplifying.
//!
//! A [`CandidateNode`] mirrors a [`BoolExpr`] but carries two tags per node:
//! a stable id assigned once by [`CandidateNode::number`], and a mandatory
//! flag. Ids let candidates found in different sub-boxes be merged node by
//! node. A child is optional when its value in a box is the identity of its
//! parent operator there, so it can be dropped without changing the result.
//!
//! While a box is being classified, children that evaluate to the operator
//! identity are kept in the tree as optional children instead of being
//! removed. Merging then never mixes a sub-box form of a child into a region
//! where that form was never checked, and optional children are pruned only
//! once, after all regions have been merged.

use std::collections::BTreeMap;

use cellgeom_geom::GeomBox;

use crate::classification::Classification;
use crate::error::{CsgError, Result};
use crate::expr::{BoolExpr, ExprKind, Halfspace};

/// Node contents of a [`CandidateNode`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum CandidateOp {
    /// The empty set.
    Empty,
    /// All of space.
    Full,
    /// A single half-space.
    Leaf(Halfspace),
    /// Intersection. May hold a single child.
    And(Vec<CandidateNode>),
    /// Union. May hold a single child.
    Or(Vec<CandidateNode>),
}

/// A candidate expression node tagged with its id and mandatory flag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CandidateNode {
    op: CandidateOp,
    id: u32,
    mandatory: bool,
}

impl CandidateNode {
    /// Number the nodes of `expr` in pre-order, starting at 0 for the root.
    /// Every node starts out mandatory.
    pub fn number(expr: &BoolExpr) -> Self {
        let mut next = 0;
        Self::number_from(expr, &mut next)
    }

    fn number_from(expr: &BoolExpr, next: &mut u32) -> Self {
        let id = *next;
        *next += 1;
        let op = match expr.kind() {
            ExprKind::Empty => CandidateOp::Empty,
            ExprKind::Full => CandidateOp::Full,
            ExprKind::Leaf(h) => CandidateOp::Leaf(h.clone()),
            ExprKind::And(c) => {
                CandidateOp::And(c.iter().map(|e| Self::number_from(e, next)).collect())
            }
            ExprKind::Or(c) => {
                CandidateOp::Or(c.iter().map(|e| Self::number_from(e, next)).collect())
            }
        };
        Self {
            op,
            id,
            mandatory: true,
        }
    }

    /// Node id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Whether the node is needed by its parent.
    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Node contents.
    pub fn op(&self) -> &CandidateOp {
        &self.op
    }

    fn children(&self) -> &[CandidateNode] {
        match &self.op {
            CandidateOp::And(c) | CandidateOp::Or(c) => c,
            _ => &[],
        }
    }

    /// Number of leaves, optional ones included.
    pub fn complexity(&self) -> usize {
        match &self.op {
            CandidateOp::Empty | CandidateOp::Full => 0,
            CandidateOp::Leaf(_) => 1,
            CandidateOp::And(c) | CandidateOp::Or(c) => c.iter().map(|n| n.complexity()).sum(),
        }
    }

    /// Number of leaves reachable through mandatory children only.
    pub fn effective_complexity(&self) -> usize {
        match &self.op {
            CandidateOp::Empty | CandidateOp::Full => 0,
            CandidateOp::Leaf(_) => 1,
            CandidateOp::And(c) | CandidateOp::Or(c) => c
                .iter()
                .filter(|n| n.mandatory)
                .map(|n| n.effective_complexity())
                .sum(),
        }
    }

    /// Same node id and operator with new children, marked mandatory.
    fn rebuild(&self, mut children: Vec<CandidateNode>) -> Self {
        children.sort_by_key(|c| c.id);
        let op = match &self.op {
            CandidateOp::Or(_) => CandidateOp::Or(children),
            _ => CandidateOp::And(children),
        };
        Self {
            op,
            id: self.id,
            mandatory: true,
        }
    }

    /// Classify against a box and collect up to `trim` candidate forms that
    /// are equivalent to this node inside the box.
    pub fn classify_with_candidates(
        &self,
        b: &GeomBox,
        trim: usize,
    ) -> (Classification, Vec<CandidateNode>) {
        let (is_and, children) = match &self.op {
            CandidateOp::Empty => return (Classification::Outside, vec![self.clone()]),
            CandidateOp::Full => return (Classification::Inside, vec![self.clone()]),
            CandidateOp::Leaf(h) => {
                let mut leaf = self.clone();
                leaf.mandatory = true;
                return (h.classify_box(b), vec![leaf]);
            }
            CandidateOp::And(c) => (true, c),
            CandidateOp::Or(c) => (false, c),
        };
        let (identity, dominant) = if is_and {
            (Classification::Inside, Classification::Outside)
        } else {
            (Classification::Outside, Classification::Inside)
        };

        let results: Vec<(Classification, Vec<CandidateNode>)> = children
            .iter()
            .map(|c| c.classify_with_candidates(b, trim))
            .collect();
        let result = results.iter().fold(identity, |acc, (r, _)| {
            if is_and {
                acc.and(*r)
            } else {
                acc.or(*r)
            }
        });

        let candidates = if result == dominant {
            // Any one deciding child is enough on its own.
            results
                .iter()
                .filter(|(r, _)| *r == dominant)
                .flat_map(|(_, cands)| cands.iter())
                .map(|g| self.rebuild(vec![g.clone()]))
                .collect()
        } else {
            let sets: Vec<Vec<CandidateNode>> = results
                .into_iter()
                .map(|(r, cands)| {
                    let optional = r == identity;
                    cands
                        .into_iter()
                        .map(|mut c| {
                            if optional {
                                c.mandatory = false;
                            }
                            c
                        })
                        .collect()
                })
                .collect();
            product_trimmed(&sets, trim)
                .into_iter()
                .map(|combo| self.rebuild(combo))
                .collect()
        };
        (result, trim_nodes(candidates, trim))
    }

    /// Merge two forms of the same node found in different regions.
    ///
    /// Children are matched by id; matched pairs merge recursively and
    /// unmatched children are taken as they are. The result is mandatory if
    /// either side is.
    pub fn merge(&self, other: &CandidateNode) -> Result<CandidateNode> {
        if self.id != other.id {
            return Err(CsgError::InternalConsistency(format!(
                "cannot merge node {} with node {}",
                self.id, other.id
            )));
        }
        let mandatory = self.mandatory || other.mandatory;
        let op = match (&self.op, &other.op) {
            (CandidateOp::Empty, CandidateOp::Empty) => CandidateOp::Empty,
            (CandidateOp::Full, CandidateOp::Full) => CandidateOp::Full,
            (CandidateOp::Leaf(a), CandidateOp::Leaf(b)) if a == b => CandidateOp::Leaf(a.clone()),
            (CandidateOp::And(a), CandidateOp::And(b))
            | (CandidateOp::Or(a), CandidateOp::Or(b)) => {
                let mut by_id: BTreeMap<u32, CandidateNode> =
                    a.iter().map(|c| (c.id, c.clone())).collect();
                for c in b {
                    let merged = match by_id.remove(&c.id) {
                        Some(existing) => existing.merge(c)?,
                        None => c.clone(),
                    };
                    by_id.insert(c.id, merged);
                }
                let children = by_id.into_values().collect();
                if matches!(self.op, CandidateOp::And(_)) {
                    CandidateOp::And(children)
                } else {
                    CandidateOp::Or(children)
                }
            }
            _ => {
                return Err(CsgError::InternalConsistency(format!(
                    "node {} has different kinds in the merged regions",
                    self.id
                )))
            }
        };
        Ok(Self {
            op,
            id: self.id,
            mandatory,
        })
    }

    /// Drop optional children everywhere in the tree and normalize.
    pub fn to_expr(&self) -> BoolExpr {
        match &self.op {
            CandidateOp::Empty => BoolExpr::empty(),
            CandidateOp::Full => BoolExpr::full(),
            CandidateOp::Leaf(h) => BoolExpr::leaf(h.clone()),
            CandidateOp::And(_) => BoolExpr::intersection(self.kept_children()),
            CandidateOp::Or(_) => BoolExpr::union(self.kept_children()),
        }
    }

    fn kept_children(&self) -> Vec<BoolExpr> {
        self.children()
            .iter()
            .filter(|c| c.mandatory)
            .map(CandidateNode::to_expr)
            .collect()
    }
}

/// Sort by effective complexity then structure, keep one node per pruned
/// expression, keep `max(n, 1)`.
///
/// Nodes that differ only in optional children prune to the same expression
/// and count once.
pub(crate) fn trim_nodes(nodes: Vec<CandidateNode>, n: usize) -> Vec<CandidateNode> {
    let mut keyed: Vec<(usize, BoolExpr, CandidateNode)> = nodes
        .into_iter()
        .map(|c| (c.effective_complexity(), c.to_expr(), c))
        .collect();
    keyed.sort();
    keyed.dedup_by(|a, b| a.1 == b.1);
    keyed.truncate(n.max(1));
    keyed.into_iter().map(|(_, _, c)| c).collect()
}

/// Cartesian product of candidate sets, keeping only the `max(trim, 1)`
/// cheapest partial combinations after each factor.
fn product_trimmed(sets: &[Vec<CandidateNode>], trim: usize) -> Vec<Vec<CandidateNode>> {
    let keep = trim.max(1);
    let mut combos: Vec<(usize, Vec<CandidateNode>)> = vec![(0, Vec::new())];
    for set in sets {
        let mut next = Vec::with_capacity(combos.len() * set.len());
        for (score, combo) in &combos {
            for c in set {
                let cost = if c.mandatory {
                    c.effective_complexity()
                } else {
                    0
                };
                let mut extended = combo.clone();
                extended.push(c.clone());
                next.push((score + cost, extended));
            }
        }
        next.sort();
        next.dedup();
        next.truncate(keep);
        combos = next;
    }
    combos.into_iter().map(|(_, combo)| combo).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgeom_geom::{Plane, SurfaceRef};
    use cellgeom_math::Point3;

    fn px(name: u32, x: f64, positive: bool) -> BoolExpr {
        BoolExpr::halfspace(SurfaceRef::new(name, Plane::px(x).unwrap()), positive)
    }

    fn py(name: u32, y: f64, positive: bool) -> BoolExpr {
        BoolExpr::halfspace(SurfaceRef::new(name, Plane::py(y).unwrap()), positive)
    }

    fn cube(center: [f64; 3], side: f64) -> GeomBox {
        GeomBox::new(Point3::new(center[0], center[1], center[2]), [side; 3]).unwrap()
    }

    /// Slab 0 < x < 10.
    fn slab() -> BoolExpr {
        BoolExpr::intersection([px(1, 0.0, true), px(2, 10.0, false)])
    }

    #[test]
    fn test_numbering_is_preorder() {
        let e = BoolExpr::intersection([
            slab(),
            BoolExpr::union([py(3, 0.0, true), py(4, 5.0, false)]),
        ]);
        let root = CandidateNode::number(&e);
        assert_eq!(root.id(), 0);
        let mut ids = Vec::new();
        fn walk(n: &CandidateNode, ids: &mut Vec<u32>) {
            ids.push(n.id());
            n.children().iter().for_each(|c| walk(c, ids));
        }
        walk(&root, &mut ids);
        assert_eq!(ids, (0..ids.len() as u32).collect::<Vec<_>>());
        assert_eq!(root.to_expr(), e);
    }

    #[test]
    fn test_dominant_wraps_deciding_child() {
        let root = CandidateNode::number(&slab());
        let (r, cands) = root.classify_with_candidates(&cube([-5.0, 0.0, 0.0], 2.0), 1);
        assert_eq!(r, Classification::Outside);
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].id(), 0);
        assert_eq!(cands[0].to_expr(), px(1, 0.0, true));
    }

    #[test]
    fn test_absorbing_children_are_optional() {
        let root = CandidateNode::number(&slab());
        let (r, cands) = root.classify_with_candidates(&cube([5.0, 0.0, 0.0], 2.0), 1);
        assert_eq!(r, Classification::Inside);
        assert!(cands[0].children().iter().all(|c| !c.is_mandatory()));
        assert_eq!(cands[0].effective_complexity(), 0);
        assert!(cands[0].to_expr().is_full());
    }

    #[test]
    fn test_ambiguous_drops_identity_children() {
        let root = CandidateNode::number(&slab());
        let (r, cands) = root.classify_with_candidates(&cube([0.0, 0.0, 0.0], 2.0), 1);
        assert!(r.is_ambiguous());
        assert_eq!(cands[0].complexity(), 2);
        assert_eq!(cands[0].effective_complexity(), 1);
        assert_eq!(cands[0].to_expr(), px(1, 0.0, true));
    }

    #[test]
    fn test_merge_unions_children() {
        let root = CandidateNode::number(&slab());
        let (_, left) = root.classify_with_candidates(&cube([0.0, 0.0, 0.0], 2.0), 1);
        let (_, right) = root.classify_with_candidates(&cube([10.0, 0.0, 0.0], 2.0), 1);
        let merged = left[0].merge(&right[0]).unwrap();
        assert_eq!(merged.effective_complexity(), 2);
        assert_eq!(merged.to_expr(), slab());
    }

    #[test]
    fn test_merge_rejects_mismatched_ids() {
        let root = CandidateNode::number(&slab());
        let child = root.children()[0].clone();
        assert!(matches!(
            root.merge(&child),
            Err(CsgError::InternalConsistency(_))
        ));
    }

    #[test]
    fn test_trim_nodes_bound() {
        let root = CandidateNode::number(&slab());
        let nodes = root.children().to_vec();
        assert_eq!(trim_nodes(nodes.clone(), 0).len(), 1);
        assert_eq!(trim_nodes(nodes, 5).len(), 2);
    }

    #[test]
    fn test_trim_nodes_counts_pruned_expression_once() {
        // 0 < x < 10 and y > 0, with x < 10 optional in one node and absent
        // from the other.
        let e = BoolExpr::intersection([slab(), py(3, 0.0, true)]);
        let root = CandidateNode::number(&e);
        let mut with_optional = root.children().to_vec();
        let upper_x = with_optional
            .iter()
            .position(|c| c.to_expr() == px(2, 10.0, false))
            .unwrap();
        with_optional[upper_x].mandatory = false;
        let mut without = with_optional.clone();
        without.remove(upper_x);
        let a = root.rebuild(with_optional);
        let b = root.rebuild(without);
        assert_ne!(a, b);
        assert_eq!(a.to_expr(), b.to_expr());

        let wider = root.clone();
        let trimmed = trim_nodes(vec![a.clone(), wider.clone(), b.clone()], 2);
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed[0].to_expr(), a.to_expr());
        assert_eq!(trimmed[1], wider);
    }
}

//! Property-based tests for the expression algebra and the algorithms
//! built on it.

use proptest::prelude::*;

use cellgeom_csg::{simplify, trim_candidates, volume_seeded, BoolExpr, Classification};
use cellgeom_geom::{GeomBox, Plane, Sphere, SurfaceRef};
use cellgeom_math::{Point3, Transformation, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Fixed pool of named surfaces inside the [-5, 5]^3 test region.
fn pool() -> Vec<SurfaceRef> {
    vec![
        SurfaceRef::new(1, Plane::px(-3.0).unwrap()),
        SurfaceRef::new(2, Plane::px(2.0).unwrap()),
        SurfaceRef::new(3, Plane::py(-1.0).unwrap()),
        SurfaceRef::new(4, Plane::py(4.0).unwrap()),
        SurfaceRef::new(5, Plane::pz(0.0).unwrap()),
        SurfaceRef::new(6, Plane::new(Vec3::new(1.0, 1.0, 1.0), -1.0).unwrap()),
        SurfaceRef::new(7, Sphere::new(Point3::origin(), 3.0).unwrap()),
        SurfaceRef::new(8, Sphere::new(Point3::new(1.0, 1.0, 1.0), 2.0).unwrap()),
    ]
}

fn arb_leaf() -> impl Strategy<Value = BoolExpr> {
    (0usize..8, any::<bool>())
        .prop_map(|(i, positive)| BoolExpr::halfspace(pool()[i].clone(), positive))
}

/// Arbitrary expression tree of depth up to 3.
fn arb_expr() -> impl Strategy<Value = BoolExpr> {
    arb_leaf().prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4).prop_map(BoolExpr::intersection),
            prop::collection::vec(inner, 2..4).prop_map(BoolExpr::union),
        ]
    })
}

/// Arbitrary axis-aligned box inside [-5, 5]^3.
fn arb_box() -> impl Strategy<Value = GeomBox> {
    (
        (-4.0f64..4.0, -4.0f64..4.0, -4.0f64..4.0),
        (0.1f64..2.0, 0.1f64..2.0, 0.1f64..2.0),
    )
        .prop_map(|((x, y, z), (dx, dy, dz))| {
            GeomBox::new(Point3::new(x, y, z), [dx, dy, dz]).unwrap()
        })
}

fn region() -> GeomBox {
    GeomBox::new(Point3::origin(), [10.0; 3]).unwrap()
}

// ---------------------------------------------------------------------------
// Algebra
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn complement_is_involution(e in arb_expr()) {
        prop_assert_eq!(e.complement().complement(), e);
    }

    #[test]
    fn complement_hash_is_bitwise_not(e in arb_expr()) {
        prop_assert_eq!(e.complement().structural_hash(), !e.structural_hash());
    }

    #[test]
    fn constants_absorb(e in arb_expr()) {
        prop_assert!(BoolExpr::intersection([e.clone(), BoolExpr::empty()]).is_empty());
        prop_assert!(BoolExpr::union([e.clone(), BoolExpr::full()]).is_full());
        prop_assert_eq!(BoolExpr::intersection([e.clone(), BoolExpr::full()]), e.clone());
        prop_assert_eq!(BoolExpr::union([BoolExpr::empty(), e.clone()]), e);
    }

    #[test]
    fn complementary_operands_collapse(e in arb_expr()) {
        prop_assert!(BoolExpr::intersection([e.clone(), e.complement()]).is_empty());
        prop_assert!(BoolExpr::union([e.complement(), e]).is_full());
    }

    #[test]
    fn construction_order_does_not_matter(a in arb_expr(), b in arb_expr(), c in arb_expr()) {
        let x = BoolExpr::intersection([a.clone(), b.clone(), c.clone()]);
        let y = BoolExpr::intersection([c, a, b]);
        prop_assert_eq!(x.structural_hash(), y.structural_hash());
        prop_assert_eq!(x, y);
    }

    #[test]
    fn polish_round_trip(e in arb_expr()) {
        prop_assume!(!e.is_empty() && !e.is_full());
        prop_assert_eq!(BoolExpr::from_polish(&e.to_polish()).unwrap(), e);
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn complement_negates_box_classification(e in arb_expr(), b in arb_box()) {
        prop_assert_eq!(e.complement().classify(&b), -e.classify(&b));
    }

    #[test]
    fn decided_box_agrees_with_points(e in arb_expr(), b in arb_box(), seed in any::<u64>()) {
        let r = e.classify(&b);
        prop_assume!(!r.is_ambiguous());
        let mut rng = StdRng::seed_from_u64(seed);
        for p in b.random_points(20, &mut rng) {
            let c = e.classify_point(&p);
            prop_assert!(c == r || c == Classification::Ambiguous);
        }
    }

    #[test]
    fn transformed_copy_stays_distinct(e in arb_expr(), dx in 0.5f64..3.0, seed in any::<u64>()) {
        let moved = e.transform(&Transformation::translation(dx, 0.0, 0.0));
        let both = BoolExpr::intersection([e.clone(), moved.clone()]);
        let mut rng = StdRng::seed_from_u64(seed);
        for p in region().random_points(50, &mut rng) {
            let (a, b) = (e.classify_point(&p), moved.classify_point(&p));
            if a.is_ambiguous() || b.is_ambiguous() {
                continue;
            }
            prop_assert_eq!(both.classify_point(&p), a.and(b));
        }
    }
}

// ---------------------------------------------------------------------------
// Trimming
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn trim_keeps_simplest(set in prop::collection::vec(arb_expr(), 0..8), n in 0usize..5) {
        let kept = trim_candidates(set.clone(), n);
        prop_assert!(kept.len() <= n.max(1));
        if let Some(worst) = kept.iter().map(BoolExpr::complexity).max() {
            for e in set.iter().filter(|e| !kept.contains(e)) {
                prop_assert!(worst <= e.complexity());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Simplification and volume
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn simplify_agrees_on_points(e in arb_expr(), seed in any::<u64>()) {
        let b = region();
        let result = simplify(&e, &b, 0.5, 2).unwrap();
        prop_assert!(!result.is_empty() && result.len() <= 2);
        match e.classify(&b) {
            Classification::Inside => prop_assert_eq!(&result, &vec![BoolExpr::full()]),
            Classification::Outside => prop_assert_eq!(&result, &vec![BoolExpr::empty()]),
            Classification::Ambiguous => {}
        }
        let mut rng = StdRng::seed_from_u64(seed);
        for p in b.random_points(200, &mut rng) {
            let expected = e.classify_point(&p);
            if expected.is_ambiguous() {
                continue;
            }
            for s in &result {
                prop_assert!(s.complexity() <= e.complexity());
                prop_assert_eq!(s.classify_point(&p), expected, "{} vs {} at {:?}", s, e, p);
            }
        }
    }

    #[test]
    fn volume_is_bounded(e in arb_expr(), b in arb_box()) {
        let v = volume_seeded(&e, &b, 0.05, 50, 7).unwrap();
        prop_assert!(v >= 0.0);
        prop_assert!(v <= b.volume() * (1.0 + 1e-12));
        prop_assert_eq!(volume_seeded(&BoolExpr::empty(), &b, 0.05, 50, 7).unwrap(), 0.0);
        prop_assert_eq!(volume_seeded(&BoolExpr::full(), &b, 0.05, 50, 7).unwrap(), b.volume());
    }
}

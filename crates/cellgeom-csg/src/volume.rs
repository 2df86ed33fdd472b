//! Volume estimation by recursive subdivision and sampling.

use cellgeom_geom::GeomBox;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, instrument};

use crate::classification::Classification;
use crate::classify::classify_with_candidates;
use crate::error::{CsgError, Result};
use crate::expr::{mix, BoolExpr};
use crate::settings::{VolumeSettings, DEFAULT_SEED};

/// Volume of the part of `expr` inside `b`, sampled with the default seed.
///
/// See [`volume_seeded`].
pub fn volume(expr: &BoolExpr, b: &GeomBox, min_volume: f64, sample_count: usize) -> Result<f64> {
    volume_seeded(expr, b, min_volume, sample_count, DEFAULT_SEED)
}

/// Volume of the part of `expr` inside `b`.
///
/// Boxes inside the geometry count fully and boxes outside count zero.
/// Ambiguous boxes larger than `min_volume` are bisected and each half is
/// measured with a simplified form valid in the parent. Smaller ambiguous
/// boxes are estimated from `sample_count` uniform random points.
///
/// Every sampled box seeds its own generator from `seed` and its position in
/// the subdivision, so the estimate is reproducible whatever order the
/// halves are evaluated in.
#[instrument(skip(expr, b), fields(complexity = expr.complexity()))]
pub fn volume_seeded(
    expr: &BoolExpr,
    b: &GeomBox,
    min_volume: f64,
    sample_count: usize,
    seed: u64,
) -> Result<f64> {
    VolumeSettings {
        min_volume,
        sample_count,
        seed,
    }
    .validate()?;
    let v = volume_in(expr, b, min_volume, sample_count, seed, ROOT_KEY, 0)?;
    debug!(volume = v, box_volume = b.volume(), "volume estimated");
    Ok(v)
}

/// [`volume_seeded`] with parameters from a settings struct.
pub fn volume_with(expr: &BoolExpr, b: &GeomBox, settings: &VolumeSettings) -> Result<f64> {
    volume_seeded(
        expr,
        b,
        settings.min_volume,
        settings.sample_count,
        settings.seed,
    )
}

const ROOT_KEY: u64 = 1;

/// Key of the lower (`side` 0) or upper (`side` 1) half of the box with
/// `key` at `depth`. Keys are hashed, so they do not run out with depth.
fn child_key(key: u64, depth: u32, side: u64) -> u64 {
    mix(key ^ mix((u64::from(depth) << 1) | side))
}

/// `key` identifies the box by its subdivision route and `depth` is its
/// level below the root.
fn volume_in(
    expr: &BoolExpr,
    b: &GeomBox,
    min_volume: f64,
    sample_count: usize,
    seed: u64,
    key: u64,
    depth: u32,
) -> Result<f64> {
    let (result, candidates) = classify_with_candidates(expr, b, 1)?;
    match result {
        Classification::Inside => Ok(b.volume()),
        Classification::Outside => Ok(0.0),
        Classification::Ambiguous => {
            let geom = candidates.into_iter().next().ok_or_else(|| {
                CsgError::InternalConsistency("ambiguous box without a candidate".into())
            })?;
            if b.volume() > min_volume {
                let (b1, b2) = b.split_auto()?;
                let (k1, k2) = (child_key(key, depth, 0), child_key(key, depth, 1));
                let next = depth + 1;
                let (v1, v2) = rayon::join(
                    || volume_in(&geom, &b1, min_volume, sample_count, seed, k1, next),
                    || volume_in(&geom, &b2, min_volume, sample_count, seed, k2, next),
                );
                Ok(v1? + v2?)
            } else {
                let mut rng = StdRng::seed_from_u64(mix(seed ^ key));
                let inside = b
                    .random_points(sample_count, &mut rng)
                    .iter()
                    .filter(|p| geom.classify_point(p) == Classification::Inside)
                    .count();
                Ok(b.volume() * inside as f64 / sample_count as f64)
            }
        }
    }
}

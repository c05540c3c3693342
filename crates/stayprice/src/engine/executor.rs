//! Neighbor aggregation passes.
//!
//! ## Purpose
//!
//! This module computes [`NeighborStats`] for every target listing: the count
//! of other listings within the radius and the mean price over those with a
//! known price. It is the only place the aggregation semantics (self
//! exclusion, unpriced neighbors, invalid positions) are implemented.
//!
//! ## Design notes
//!
//! * **Query set vs search set**: Targets and candidates are separate slices,
//!   so callers choose whether rows dropped later in the pipeline still act
//!   as neighbors.
//! * **No shared mutation**: Each call works out of a local (or thread-local)
//!   scratch buffer of candidate indices; the candidate table is never
//!   touched, so concurrent passes over the same table stay race-free.
//! * **Parallelism**: The parallel pass distributes targets across cores with
//!   `rayon`, one scratch buffer per thread via `map_init`. Results are
//!   bit-identical to the sequential pass.
//!
//! ## Invariants
//!
//! * Output length equals the number of targets, in target order.
//! * A target is never its own neighbor, even at distance zero (id check).
//! * `n_nearby == 0` implies the average is `None`.
//!
//! ## Non-goals
//!
//! * This module does not choose the index strategy (see `api`).
//! * This module does not decide candidate scope (see `features`).

// Feature-gated imports
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::math::NeighborIndex;
use crate::primitives::{Listing, NeighborStats};

/// Aggregate a single target against the candidate table.
///
/// `scratch` holds candidate indices between calls so repeated invocations do
/// not reallocate.
pub fn aggregate_one(
    target: &Listing,
    candidates: &[Listing],
    index: &dyn NeighborIndex,
    radius_km: f64,
    scratch: &mut Vec<usize>,
) -> NeighborStats {
    let Some(origin) = target.coords else {
        return NeighborStats::empty();
    };

    index.query(origin, radius_km, scratch);

    let mut n_nearby = 0usize;
    let mut priced = 0usize;
    let mut price_sum = 0.0f64;
    for &i in scratch.iter() {
        let candidate = &candidates[i];
        if candidate.id == target.id {
            continue;
        }
        n_nearby += 1;
        if let Some(price) = candidate.price {
            priced += 1;
            price_sum += price;
        }
    }

    NeighborStats {
        nearby_average_price: (priced > 0).then(|| price_sum / priced as f64),
        n_nearby,
    }
}

/// Sequential pass over all targets.
pub fn aggregate_pass(
    targets: &[Listing],
    candidates: &[Listing],
    index: &dyn NeighborIndex,
    radius_km: f64,
) -> Vec<NeighborStats> {
    let mut scratch = Vec::new();
    targets
        .iter()
        .map(|target| aggregate_one(target, candidates, index, radius_km, &mut scratch))
        .collect()
}

/// Parallel pass over all targets, one scratch buffer per worker thread.
#[cfg(feature = "parallel")]
pub fn aggregate_pass_parallel(
    targets: &[Listing],
    candidates: &[Listing],
    index: &dyn NeighborIndex,
    radius_km: f64,
) -> Vec<NeighborStats> {
    targets
        .par_iter()
        .map_init(Vec::<usize>::new, |scratch, target| {
            aggregate_one(target, candidates, index, radius_km, scratch)
        })
        .collect()
}

/// Sequential fallback when the `parallel` feature is disabled.
#[cfg(not(feature = "parallel"))]
pub fn aggregate_pass_parallel(
    targets: &[Listing],
    candidates: &[Listing],
    index: &dyn NeighborIndex,
    radius_km: f64,
) -> Vec<NeighborStats> {
    aggregate_pass(targets, candidates, index, radius_km)
}

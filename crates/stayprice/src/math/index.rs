//! Radius queries over listing tables.
//!
//! ## Purpose
//!
//! This module answers "which candidate rows lie within `radius_km` of this
//! point". The executor is written against the [`NeighborIndex`] trait so the
//! lookup strategy can be swapped without touching the aggregation contract:
//! [`FullScan`] is the O(n)-per-query baseline, [`GeoGrid`] bins listings
//! into a latitude/longitude grid sized from the radius.
//!
//! ## Design notes
//!
//! * **Verified hits**: Both implementations confirm every candidate with the
//!   exact haversine distance, so an index choice never changes results.
//! * **Grid sizing**: Longitude cell width uses the widest degrees-per-km
//!   across the table's latitude band (clamped at 85°), which keeps the
//!   3×3 cell probe sufficient at any latitude in the data.
//! * **Antimeridian**: Queries also probe the cell columns of lon ± 360 so
//!   neighborhoods spanning ±180° are not split.
//!
//! ## Invariants
//!
//! * Only listings with a valid position are indexed.
//! * `query` pushes indices with `distance < radius_km`, strictly.
//! * Output order is unspecified; callers must not rely on it.

use std::collections::HashMap;

use crate::math::distance::{coords_km, KM_PER_DEG};
use crate::primitives::{Coordinates, Listing};

/// Radius lookup over a fixed candidate table.
///
/// Implementations push the indices of all candidates strictly within
/// `radius_km` of `origin` into `out` (cleared first). The target row itself
/// is *not* excluded here; self-exclusion is an id-level concern handled by
/// the executor.
pub trait NeighborIndex: Sync {
    fn query(&self, origin: Coordinates, radius_km: f64, out: &mut Vec<usize>);
}

/// The naive baseline: scan every candidate on every query.
pub struct FullScan<'a> {
    candidates: &'a [Listing],
}

impl<'a> FullScan<'a> {
    pub fn new(candidates: &'a [Listing]) -> Self {
        Self { candidates }
    }
}

impl NeighborIndex for FullScan<'_> {
    fn query(&self, origin: Coordinates, radius_km: f64, out: &mut Vec<usize>) {
        out.clear();
        for (i, candidate) in self.candidates.iter().enumerate() {
            if let Some(pos) = candidate.coords {
                if coords_km(origin, pos) < radius_km {
                    out.push(i);
                }
            }
        }
    }
}

/// Grid-binned index: cells sized so a radius query touches at most a 3×3
/// block of cells per probed longitude column.
pub struct GeoGrid<'a> {
    candidates: &'a [Listing],
    cells: HashMap<(i64, i64), Vec<usize>>,
    lat_step: f64,
    lon_step: f64,
}

impl<'a> GeoGrid<'a> {
    /// Build the grid for a fixed query radius. `radius_km` must be positive
    /// and finite (the aggregator builder validates this).
    pub fn build(candidates: &'a [Listing], radius_km: f64) -> Self {
        let lat_step = radius_km / KM_PER_DEG;

        // Widest degrees-per-km over the data's latitude band; clamped so the
        // grid stays usable for listings near the poles.
        let max_abs_lat = candidates
            .iter()
            .filter_map(|c| c.coords)
            .map(|c| c.latitude().abs())
            .fold(0.0_f64, f64::max)
            .min(85.0);
        let lon_step = radius_km / (KM_PER_DEG * max_abs_lat.to_radians().cos());

        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (i, candidate) in candidates.iter().enumerate() {
            if let Some(pos) = candidate.coords {
                cells
                    .entry(Self::cell(pos.latitude(), pos.longitude(), lat_step, lon_step))
                    .or_default()
                    .push(i);
            }
        }

        Self {
            candidates,
            cells,
            lat_step,
            lon_step,
        }
    }

    fn cell(lat: f64, lon: f64, lat_step: f64, lon_step: f64) -> (i64, i64) {
        ((lat / lat_step).floor() as i64, (lon / lon_step).floor() as i64)
    }
}

impl NeighborIndex for GeoGrid<'_> {
    fn query(&self, origin: Coordinates, radius_km: f64, out: &mut Vec<usize>) {
        out.clear();
        let (row, _) = Self::cell(origin.latitude(), origin.longitude(), self.lat_step, self.lon_step);

        // Probe columns for the raw longitude and its ±360° aliases so a
        // neighborhood straddling the antimeridian is covered.
        let mut cols: Vec<i64> = Vec::with_capacity(9);
        for lon in [
            origin.longitude(),
            origin.longitude() - 360.0,
            origin.longitude() + 360.0,
        ] {
            let col = (lon / self.lon_step).floor() as i64;
            for delta in -1..=1 {
                let c = col + delta;
                if !cols.contains(&c) {
                    cols.push(c);
                }
            }
        }

        for dr in -1..=1 {
            for &col in &cols {
                let Some(bucket) = self.cells.get(&(row + dr, col)) else {
                    continue;
                };
                for &i in bucket {
                    // Indexed entries always carry a position.
                    if let Some(pos) = self.candidates[i].coords {
                        if coords_km(origin, pos) < radius_km {
                            out.push(i);
                        }
                    }
                }
            }
        }
    }
}

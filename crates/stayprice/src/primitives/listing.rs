//! Listing records and neighbor statistics.
//!
//! ## Purpose
//!
//! This module defines the minimal view of a rental listing that the
//! geospatial core operates on (id, position, price), plus the per-listing
//! statistics it produces.
//!
//! ## Invariants
//!
//! * A `Coordinates` value is always finite and inside [-90, 90] / [-180, 180].
//! * `NeighborStats::n_nearby == 0` implies `nearby_average_price == None`.
//! * Listing ids are assumed unique upstream; uniqueness is not enforced here.

use serde::{Deserialize, Serialize};

/// A validated geographic position in degrees.
///
/// Construction is the only place coordinate validity is checked; everything
/// downstream can rely on a `Coordinates` being usable in distance math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Build a position, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// The slice of a listing row the neighbor aggregator needs.
///
/// A listing with an invalid or missing position carries `coords: None`; it
/// never participates as a neighbor candidate and aggregating it as a target
/// yields an empty result rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: u64,
    pub coords: Option<Coordinates>,
    pub price: Option<f64>,
}

impl Listing {
    /// Build a listing from raw column values, degrading bad coordinates to
    /// an unknown position.
    pub fn new(id: u64, latitude: Option<f64>, longitude: Option<f64>, price: Option<f64>) -> Self {
        let coords = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
            _ => None,
        };
        Self { id, coords, price }
    }
}

/// Per-listing output of the neighbor aggregation.
///
/// The "no neighbors" and "no priced neighbors" cases are a tagged `None`,
/// never a NaN; NaN only ever appears at the CSV boundary.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NeighborStats {
    /// Mean price over in-radius neighbors with a known price.
    pub nearby_average_price: Option<f64>,
    /// Number of in-radius neighbors with a valid position.
    pub n_nearby: usize,
}

impl NeighborStats {
    /// The result for a target with no usable neighbors.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Which rows serve as neighbor candidates.
///
/// The original pipeline scanned the entire table before any null-filtering;
/// `PricedOnly` restricts candidacy to rows that survived price parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateScope {
    /// Every listing with a valid position is a candidate.
    #[default]
    AllListings,
    /// Only listings with both a valid position and a known price.
    PricedOnly,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_reject_out_of_range() {
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(-91.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, 180.5).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_none());
        assert!(Coordinates::new(38.72, -9.14).is_some());
    }

    #[test]
    fn listing_degrades_bad_coords() {
        let l = Listing::new(1, Some(200.0), Some(0.0), Some(80.0));
        assert!(l.coords.is_none());
        assert_eq!(l.price, Some(80.0));

        let l = Listing::new(2, None, Some(0.0), None);
        assert!(l.coords.is_none());
    }

    #[test]
    fn empty_stats_invariant() {
        let s = NeighborStats::empty();
        assert_eq!(s.n_nearby, 0);
        assert!(s.nearby_average_price.is_none());
    }
}

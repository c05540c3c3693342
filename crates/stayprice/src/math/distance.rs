//! Great-circle distance on a spherical Earth.
//!
//! ## Purpose
//!
//! This module implements the haversine formula used everywhere the pipeline
//! reasons about "nearby": the neighbor index verifies every candidate with
//! it, so the accuracy of the whole aggregation reduces to this function.
//!
//! ## Design notes
//!
//! * **Generics**: Generic over `Float` so the formula is usable at `f32`
//!   precision if a caller wants the memory savings.
//! * **Clamping**: The haversine term is clamped to [0, 1] before `asin`;
//!   floating-point overshoot on antipodal or coincident points would
//!   otherwise produce NaN.
//!
//! ## Invariants
//!
//! * `haversine_km(a, b) == haversine_km(b, a)`.
//! * Zero for identical points; never NaN, never panics.
//! * Monotonic with true angular separation.

use num_traits::Float;

use crate::primitives::Coordinates;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEG: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// Great-circle distance in kilometers between two points given in degrees.
pub fn haversine_km<T: Float>(lat1: T, lon1: T, lat2: T, lon2: T) -> T {
    let r = T::from(EARTH_RADIUS_KM).unwrap();
    let two = T::one() + T::one();

    let p1 = lat1.to_radians();
    let p2 = lat2.to_radians();
    let half_dp = (p2 - p1) / two;
    let half_dl = (lon2 - lon1).to_radians() / two;

    let a = half_dp.sin().powi(2) + p1.cos() * p2.cos() * half_dl.sin().powi(2);

    // Guard against floating-point overshoot before the asin.
    let a = a.max(T::zero()).min(T::one());

    two * r * a.sqrt().asin()
}

/// Distance between two validated positions.
pub fn coords_km(a: Coordinates, b: Coordinates) -> f64 {
    haversine_km(a.latitude(), a.longitude(), b.latitude(), b.longitude())
}

//! Layer 2: Math
//!
//! ## Purpose
//!
//! This layer provides the geospatial primitives of the pipeline: the
//! great-circle distance function and the spatial index used to find
//! in-radius neighbor candidates.
//!
//! ## Architecture
//!
//! ```text
//! Layer 6: CLI (stayprice-cli)
//!   ↓
//! Layer 5: Stages (dataset, features, model)
//!   ↓
//! Layer 4: Evaluation
//!   ↓
//! Layer 3: Engine
//!   ↓
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives
//! ```

/// Haversine great-circle distance.
pub mod distance;

/// Radius queries over listing tables (full scan and grid binning).
pub mod index;

pub use distance::{haversine_km, EARTH_RADIUS_KM};
pub use index::{FullScan, GeoGrid, NeighborIndex};

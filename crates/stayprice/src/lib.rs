//! # stayprice
//!
//! Short-term rental price pipeline: clean a listings export, engineer
//! features around a geospatial neighbor-price aggregation, and train a
//! cross-validated regression on the result.
//!
//! ## Architecture
//!
//! ```text
//! Layer 6: CLI (stayprice-cli)
//!   ↓
//! Layer 5: Stages (dataset → features → model)
//!   ↓
//! Layer 4: Evaluation (metrics, k-fold CV)
//!   ↓
//! Layer 3: Engine (aggregation passes)
//!   ↓
//! Layer 2: Math (haversine, spatial index)
//!   ↓
//! Layer 1: Primitives (listings, errors)
//! ```
//!
//! The geospatial core is usable on its own:
//!
//! ```
//! use stayprice::prelude::*;
//!
//! let table = vec![
//!     Listing::new(1, Some(38.72), Some(-9.14), Some(100.0)),
//!     Listing::new(2, Some(38.72), Some(-9.14), Some(200.0)),
//!     Listing::new(3, Some(38.72), Some(-9.14), Some(300.0)),
//! ];
//!
//! let aggregator = NeighborAggregator::new().radius_km(1.5).build().unwrap();
//! let stats = aggregator.aggregate(&table, &table);
//!
//! assert_eq!(stats[0].n_nearby, 2);
//! assert_eq!(stats[0].nearby_average_price, Some(250.0));
//! ```

pub mod api;
pub mod dataset;
pub mod engine;
pub mod evaluation;
pub mod features;
pub mod math;
pub mod model;
pub mod primitives;

/// Common imports for pipeline users.
pub mod prelude {
    pub use crate::api::{IndexStrategy, NeighborAggregator, DEFAULT_RADIUS_KM};
    pub use crate::dataset::{clean, read_raw_csv, CleanRecord, RawRecord};
    pub use crate::evaluation::{k_fold_cv, CvScores};
    pub use crate::features::{build_features, FeatureConfig, FeatureTable};
    pub use crate::math::{haversine_km, EARTH_RADIUS_KM};
    pub use crate::model::{train, ModelArtifact, ModelKind, Regressor, TrainConfig};
    pub use crate::primitives::{
        CandidateScope, Coordinates, Listing, NeighborStats, PipelineError, Result,
    };
}

//! Layer 4: Evaluation
//!
//! ## Purpose
//!
//! This layer scores fitted models: regression metrics and seeded k-fold
//! cross-validation, with folds evaluated in parallel when the `parallel`
//! feature is enabled.
//!
//! ## Architecture
//!
//! ```text
//! Layer 6: CLI (stayprice-cli)
//!   ↓
//! Layer 5: Stages (dataset, features, model)
//!   ↓
//! Layer 4: Evaluation ← You are here
//!   ↓
//! Layer 3: Engine
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// K-fold cross-validation.
pub mod cv;

/// Regression metrics.
pub mod metrics;

pub use cv::{k_fold_cv, CvScores};
pub use metrics::{mse, r_squared, rmse};

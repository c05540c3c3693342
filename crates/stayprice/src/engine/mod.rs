//! Layer 3: Engine
//!
//! ## Purpose
//!
//! This layer executes the neighbor aggregation: one pass over the target
//! listings, each resolved against a read-only candidate table through a
//! spatial index.
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
//! Layer 3: Engine ← You are here
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Sequential and parallel aggregation passes.
pub mod executor;

pub use executor::{aggregate_one, aggregate_pass, aggregate_pass_parallel};

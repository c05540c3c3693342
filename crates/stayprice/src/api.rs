//! High-level API for neighbor aggregation.
//!
//! ## Purpose
//!
//! This module provides the user-facing entry point for the geospatial core:
//! a fluent builder for configuring the radius, index strategy, and execution
//! mode, and the aggregator it produces.
//!
//! ## Design notes
//!
//! * **Validated**: The radius is checked once, at `build()`; the aggregator
//!   itself is then total over its inputs.
//! * **Substitutable index**: [`IndexStrategy`] selects the lookup structure;
//!   results are identical across strategies by construction.
//! * **Defaults**: 1.5 km radius, grid index, parallel execution. This is
//!   the configuration the feature stage uses.
//!
//! ### Configuration Flow
//!
//! 1. Create a builder via [`NeighborAggregator::new`].
//! 2. Chain configuration methods (`.radius_km()`, `.index()`, `.parallel()`).
//! 3. Call `.build()` to validate and obtain the aggregator.

use crate::engine::{aggregate_one, aggregate_pass, aggregate_pass_parallel};
use crate::math::{FullScan, GeoGrid, NeighborIndex};
use crate::primitives::{Listing, NeighborStats, PipelineError, Result};

/// The radius the surrounding pipeline exposes as its only tunable knob.
pub const DEFAULT_RADIUS_KM: f64 = 1.5;

/// Candidate lookup strategy.
///
/// `Scan` is the O(n²) baseline; `Grid` bins candidates by cell and is the
/// default. Both produce identical statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexStrategy {
    Scan,
    #[default]
    Grid,
}

/// Builder for [`NeighborAggregator`].
#[derive(Debug, Clone)]
pub struct NeighborAggregatorBuilder {
    radius_km: f64,
    parallel: bool,
    strategy: IndexStrategy,
}

impl Default for NeighborAggregatorBuilder {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            parallel: true,
            strategy: IndexStrategy::default(),
        }
    }
}

impl NeighborAggregatorBuilder {
    /// Set the neighbor radius in kilometers.
    pub fn radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = radius_km;
        self
    }

    /// Set parallel execution mode.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the candidate lookup strategy.
    pub fn index(mut self, strategy: IndexStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Validate the configuration and build the aggregator.
    pub fn build(self) -> Result<NeighborAggregator> {
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(PipelineError::InvalidRadius(self.radius_km));
        }
        Ok(NeighborAggregator {
            radius_km: self.radius_km,
            parallel: self.parallel,
            strategy: self.strategy,
        })
    }
}

/// Computes, for each target listing, the count and mean price of the other
/// listings within a fixed great-circle radius.
#[derive(Debug, Clone)]
pub struct NeighborAggregator {
    radius_km: f64,
    parallel: bool,
    strategy: IndexStrategy,
}

impl NeighborAggregator {
    /// Start configuring an aggregator.
    pub fn new() -> NeighborAggregatorBuilder {
        NeighborAggregatorBuilder::default()
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Aggregate every target against the candidate table.
    ///
    /// Output is in target order and independent of candidate order. Passing
    /// the same slice as both arguments reproduces the classic "each row
    /// against the whole table" shape.
    pub fn aggregate(&self, targets: &[Listing], candidates: &[Listing]) -> Vec<NeighborStats> {
        match self.strategy {
            IndexStrategy::Scan => {
                let index = FullScan::new(candidates);
                self.run(targets, candidates, &index)
            }
            IndexStrategy::Grid => {
                let index = GeoGrid::build(candidates, self.radius_km);
                self.run(targets, candidates, &index)
            }
        }
    }

    /// Aggregate a single target; convenience for spot checks and tests.
    pub fn aggregate_one(&self, target: &Listing, candidates: &[Listing]) -> NeighborStats {
        let index = FullScan::new(candidates);
        let mut scratch = Vec::new();
        aggregate_one(target, candidates, &index, self.radius_km, &mut scratch)
    }

    fn run(
        &self,
        targets: &[Listing],
        candidates: &[Listing],
        index: &dyn NeighborIndex,
    ) -> Vec<NeighborStats> {
        if self.parallel {
            aggregate_pass_parallel(targets, candidates, index, self.radius_km)
        } else {
            aggregate_pass(targets, candidates, index, self.radius_km)
        }
    }
}

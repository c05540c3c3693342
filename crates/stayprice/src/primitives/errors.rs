//! Error type shared by all pipeline stages.
//!
//! ## Purpose
//!
//! This module defines the single error enum surfaced by the library. The
//! aggregation core itself is total over its inputs (bad coordinates degrade
//! to empty results, never errors); errors come from configuration,
//! malformed tabular data, and degenerate linear systems.

use thiserror::Error;

/// Errors produced by the stayprice pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Neighbor radius must be finite and strictly positive.
    #[error("invalid neighbor radius {0} km (must be finite and > 0)")]
    InvalidRadius(f64),

    /// Two inputs that must agree in length did not.
    #[error("mismatched input lengths: {left} vs {right}")]
    MismatchedInputs { left: usize, right: usize },

    /// An operation that needs rows was given none.
    #[error("empty table")]
    EmptyTable,

    /// A feature table is missing a column the caller asked for.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// The normal-equations system was singular or not positive definite.
    #[error("linear system is singular or not positive definite")]
    SingularSystem,

    /// Invalid training or feature configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Catch-all for malformed inputs that violate a stage contract.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

//! Layer 5c: Model training
//!
//! ## Purpose
//!
//! This stage fits a price regression on the feature table and reports
//! cross-validated scores. Model selection is an explicit registry: a
//! [`ModelKind`] enum maps each supported estimator to its constructor, so
//! configuration can never name an arbitrary symbol to instantiate.
//!
//! ## Design notes
//!
//! * **Target**: `ln(price)` by default; rows with a non-positive price are
//!   dropped (with a warning) before the log is taken.
//! * **Persistence**: Fitted parameters serialize to JSON together with the
//!   feature-name layout they were trained against, so a loaded model can
//!   refuse mismatched inputs.

/// Linear-family models (OLS, ridge).
pub mod linear;

use std::io::{Read, Write};

use log::{info, warn};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::evaluation::cv::{k_fold_cv, CvScores};
use crate::features::FeatureTable;
use crate::model::linear::LinearModel;
use crate::primitives::{PipelineError, Result};

/// A regression estimator over a numeric design matrix.
pub trait Regressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// The registry of supported estimators.
///
/// Each variant is a constructor entry; adding a model means adding a
/// variant and its arm in [`ModelKind::instantiate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum ModelKind {
    Linear,
    Ridge { alpha: f64 },
}

impl ModelKind {
    /// Construct a fresh, unfitted estimator of this kind.
    pub fn instantiate(&self) -> LinearModel {
        match self {
            ModelKind::Linear => LinearModel::ols(),
            ModelKind::Ridge { alpha } => LinearModel::ridge(*alpha),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::Ridge { .. } => "ridge",
        }
    }
}

/// Training configuration, typically deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    #[serde(flatten)]
    pub model: ModelKind,
    #[serde(default = "default_folds")]
    pub folds: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_log_target")]
    pub log_target: bool,
}

fn default_folds() -> usize {
    5
}

fn default_seed() -> u64 {
    42
}

fn default_log_target() -> bool {
    true
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Linear,
            folds: default_folds(),
            seed: default_seed(),
            log_target: default_log_target(),
        }
    }
}

/// A fitted model with everything needed to apply it later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub kind: ModelKind,
    pub log_target: bool,
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl ModelArtifact {
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Rehydrate the estimator for prediction.
    pub fn to_model(&self) -> LinearModel {
        let alpha = match self.kind {
            ModelKind::Linear => 0.0,
            ModelKind::Ridge { alpha } => alpha,
        };
        LinearModel::from_parameters(alpha, self.intercept, self.coefficients.clone())
    }
}

/// Outcome of a training run: cross-validated scores plus the final model
/// fitted on all rows.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub scores: CvScores,
    pub artifact: ModelArtifact,
}

/// Train and cross-validate on a feature table.
pub fn train(table: &FeatureTable, config: &TrainConfig) -> Result<TrainReport> {
    let (x, y, feature_names) = design_matrix(table, config.log_target)?;
    info!(
        "training {} on {} rows x {} features ({}-fold CV)",
        config.model.name(),
        x.nrows(),
        x.ncols(),
        config.folds
    );

    let scores = k_fold_cv(
        || config.model.instantiate(),
        &x,
        &y,
        config.folds,
        config.seed,
    )?;
    info!(
        "cross-validation: mean mse {:.4}, mean rmse {:.4}, mean r2 {:.4}",
        scores.mean_mse, scores.mean_rmse, scores.mean_r2
    );

    let mut model = config.model.instantiate();
    model.fit(&x, &y)?;

    Ok(TrainReport {
        scores,
        artifact: ModelArtifact {
            kind: config.model,
            log_target: config.log_target,
            feature_names,
            intercept: model.intercept(),
            coefficients: model.coefficients().to_vec(),
        },
    })
}

/// Split a feature table into the design matrix and target vector.
///
/// The target is the `price` column (log-transformed when `log_target`);
/// every other column becomes a feature. With `log_target`, rows whose price
/// is not strictly positive are dropped.
pub fn design_matrix(
    table: &FeatureTable,
    log_target: bool,
) -> Result<(Array2<f64>, Array1<f64>, Vec<String>)> {
    let price_idx = table.column_index("price")?;
    let feature_names: Vec<String> = table
        .names
        .iter()
        .filter(|n| n.as_str() != "price")
        .cloned()
        .collect();

    let keep: Vec<&Vec<f64>> = if log_target {
        let kept: Vec<&Vec<f64>> = table.rows.iter().filter(|r| r[price_idx] > 0.0).collect();
        let dropped = table.rows.len() - kept.len();
        if dropped > 0 {
            warn!("dropped {dropped} rows with non-positive price before log transform");
        }
        kept
    } else {
        table.rows.iter().collect()
    };

    if keep.is_empty() {
        return Err(PipelineError::EmptyTable);
    }

    let n = keep.len();
    let p = feature_names.len();
    let mut x = Array2::<f64>::zeros((n, p));
    let mut y = Array1::<f64>::zeros(n);
    for (i, row) in keep.iter().enumerate() {
        let price = row[price_idx];
        y[i] = if log_target { price.ln() } else { price };
        let mut col = 0;
        for (j, value) in row.iter().enumerate() {
            if j == price_idx {
                continue;
            }
            x[[i, col]] = *value;
            col += 1;
        }
    }

    // Feature layout must match the names we report alongside the model.
    debug_assert_eq!(x.ncols(), feature_names.len());
    Ok((x, y, feature_names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn synthetic_table(n: usize) -> FeatureTable {
        // price = exp(0.5 + 0.3*a - 0.1*b), so ln(price) is exactly linear.
        let names = vec!["a".to_string(), "price".to_string(), "b".to_string()];
        let mut ids = Vec::new();
        let mut rows = Vec::new();
        for i in 0..n {
            let a = (i % 11) as f64;
            let b = (i % 7) as f64;
            let price = (0.5 + 0.3 * a - 0.1 * b).exp();
            ids.push(i as u64);
            rows.push(vec![a, price, b]);
        }
        FeatureTable { ids, names, rows }
    }

    #[test]
    fn recovers_log_linear_prices() {
        let table = synthetic_table(60);
        let report = train(&table, &TrainConfig::default()).unwrap();

        assert_abs_diff_eq!(report.artifact.intercept, 0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(report.artifact.coefficients[0], 0.3, epsilon = 1e-8);
        assert_abs_diff_eq!(report.artifact.coefficients[1], -0.1, epsilon = 1e-8);
        assert!(report.scores.mean_r2 > 0.999);
        assert!(report.scores.mean_mse < 1e-10);
        assert_eq!(report.artifact.feature_names, vec!["a", "b"]);
    }

    #[test]
    fn non_positive_prices_are_dropped_for_log_target() {
        let mut table = synthetic_table(30);
        table.rows[0][1] = 0.0;
        table.rows[1][1] = -5.0;

        let (x, y, _) = design_matrix(&table, true).unwrap();
        assert_eq!(x.nrows(), 28);
        assert_eq!(y.len(), 28);

        let (x, _, _) = design_matrix(&table, false).unwrap();
        assert_eq!(x.nrows(), 30);
    }

    #[test]
    fn missing_price_column_is_an_error() {
        let table = FeatureTable {
            ids: vec![1],
            names: vec!["a".to_string()],
            rows: vec![vec![1.0]],
        };
        assert!(matches!(
            design_matrix(&table, true),
            Err(PipelineError::UnknownColumn(_))
        ));
    }

    #[test]
    fn config_parses_from_toml() {
        let cfg: TrainConfig = toml::from_str("model = \"linear\"\n").unwrap();
        assert_eq!(cfg.model, ModelKind::Linear);
        assert_eq!(cfg.folds, 5);
        assert!(cfg.log_target);

        let cfg: TrainConfig =
            toml::from_str("model = \"ridge\"\nalpha = 0.5\nfolds = 3\nseed = 7\n").unwrap();
        assert_eq!(cfg.model, ModelKind::Ridge { alpha: 0.5 });
        assert_eq!(cfg.folds, 3);
        assert_eq!(cfg.seed, 7);
    }

    #[test]
    fn artifact_round_trip() {
        let artifact = ModelArtifact {
            kind: ModelKind::Ridge { alpha: 1.0 },
            log_target: true,
            feature_names: vec!["a".to_string()],
            intercept: 0.25,
            coefficients: vec![1.5],
        };
        let mut buf = Vec::new();
        artifact.save(&mut buf).unwrap();
        let back = ModelArtifact::load(buf.as_slice()).unwrap();
        assert_eq!(back.kind, artifact.kind);
        assert_eq!(back.coefficients, artifact.coefficients);

        let model = back.to_model();
        assert_abs_diff_eq!(model.intercept(), 0.25);
    }
}

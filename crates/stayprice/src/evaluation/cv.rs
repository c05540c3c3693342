//! Seeded k-fold cross-validation.
//!
//! ## Purpose
//!
//! Scores an estimator kind by refitting it on k train/test splits of the
//! design matrix. Rows are shuffled once with a seeded RNG so runs are
//! reproducible; folds are contiguous ranges of the shuffled order, with the
//! last fold absorbing the remainder.
//!
//! ## Design notes
//!
//! * **Parallelism**: Folds are independent refits, evaluated with `rayon`
//!   when the `parallel` feature is enabled. Scores are identical either way.
//! * **Factory, not instance**: The caller passes a constructor so each fold
//!   fits a fresh estimator.
//!
//! ## Invariants
//!
//! * `2 <= folds <= n`.
//! * Every row lands in exactly one test fold.

// Feature-gated imports
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::evaluation::metrics::{mse, r_squared, rmse};
use crate::model::Regressor;
use crate::primitives::{PipelineError, Result};

/// One fold's scores: (MSE, RMSE, R²).
type FoldScore = (f64, f64, f64);

/// Per-fold and averaged cross-validation scores.
#[derive(Debug, Clone, Serialize)]
pub struct CvScores {
    pub fold_mse: Vec<f64>,
    pub fold_rmse: Vec<f64>,
    pub fold_r2: Vec<f64>,
    pub mean_mse: f64,
    pub mean_rmse: f64,
    pub mean_r2: f64,
}

impl CvScores {
    fn from_folds(folds: Vec<FoldScore>) -> Self {
        let k = folds.len() as f64;
        let mut fold_mse = Vec::with_capacity(folds.len());
        let mut fold_rmse = Vec::with_capacity(folds.len());
        let mut fold_r2 = Vec::with_capacity(folds.len());
        for (mse, rmse, r2) in folds {
            fold_mse.push(mse);
            fold_rmse.push(rmse);
            fold_r2.push(r2);
        }
        Self {
            mean_mse: fold_mse.iter().sum::<f64>() / k,
            mean_rmse: fold_rmse.iter().sum::<f64>() / k,
            mean_r2: fold_r2.iter().sum::<f64>() / k,
            fold_mse,
            fold_rmse,
            fold_r2,
        }
    }
}

/// Run k-fold cross-validation with a fresh estimator per fold.
pub fn k_fold_cv<R, F>(
    make_model: F,
    x: &Array2<f64>,
    y: &Array1<f64>,
    folds: usize,
    seed: u64,
) -> Result<CvScores>
where
    R: Regressor,
    F: Fn() -> R + Sync,
{
    let n = x.nrows();
    if n != y.len() {
        return Err(PipelineError::MismatchedInputs {
            left: n,
            right: y.len(),
        });
    }
    if folds < 2 {
        return Err(PipelineError::Config(format!(
            "cross-validation needs at least 2 folds, got {folds}"
        )));
    }
    if n < folds {
        return Err(PipelineError::Config(format!(
            "cross-validation needs at least {folds} rows, got {n}"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let fold_size = n / folds;
    let splits: Vec<(Vec<usize>, Vec<usize>)> = (0..folds)
        .map(|fold| {
            let test_start = fold * fold_size;
            let test_end = if fold == folds - 1 {
                n
            } else {
                (fold + 1) * fold_size
            };
            let test: Vec<usize> = order[test_start..test_end].to_vec();
            let train: Vec<usize> = order[..test_start]
                .iter()
                .chain(order[test_end..].iter())
                .copied()
                .collect();
            (train, test)
        })
        .collect();

    let scores = run_folds(&make_model, x, y, &splits)?;
    Ok(CvScores::from_folds(scores))
}

fn score_fold<R, F>(
    make_model: &F,
    x: &Array2<f64>,
    y: &Array1<f64>,
    train: &[usize],
    test: &[usize],
) -> Result<FoldScore>
where
    R: Regressor,
    F: Fn() -> R + Sync,
{
    let x_train = x.select(Axis(0), train);
    let y_train = y.select(Axis(0), train);
    let x_test = x.select(Axis(0), test);
    let y_test = y.select(Axis(0), test);

    let mut model = make_model();
    model.fit(&x_train, &y_train)?;
    let predicted = model.predict(&x_test)?;

    Ok((
        mse(predicted.view(), y_test.view()),
        rmse(predicted.view(), y_test.view()),
        r_squared(predicted.view(), y_test.view()),
    ))
}

#[cfg(feature = "parallel")]
fn run_folds<R, F>(
    make_model: &F,
    x: &Array2<f64>,
    y: &Array1<f64>,
    splits: &[(Vec<usize>, Vec<usize>)],
) -> Result<Vec<FoldScore>>
where
    R: Regressor,
    F: Fn() -> R + Sync,
{
    splits
        .par_iter()
        .map(|(train, test)| score_fold(make_model, x, y, train, test))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn run_folds<R, F>(
    make_model: &F,
    x: &Array2<f64>,
    y: &Array1<f64>,
    splits: &[(Vec<usize>, Vec<usize>)],
) -> Result<Vec<FoldScore>>
where
    R: Regressor,
    F: Fn() -> R + Sync,
{
    splits
        .iter()
        .map(|(train, test)| score_fold(make_model, x, y, train, test))
        .collect()
}

//! Regression metrics.

use ndarray::ArrayView1;

/// Mean squared error. Zero-length inputs yield 0.
pub fn mse(predicted: ArrayView1<'_, f64>, actual: ArrayView1<'_, f64>) -> f64 {
    let n = predicted.len();
    if n == 0 {
        return 0.0;
    }
    let sse: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a) * (p - a))
        .sum();
    sse / n as f64
}

/// Root mean squared error.
pub fn rmse(predicted: ArrayView1<'_, f64>, actual: ArrayView1<'_, f64>) -> f64 {
    mse(predicted, actual).sqrt()
}

/// Coefficient of determination. A constant target yields 0 rather than a
/// division by zero.
pub fn r_squared(predicted: ArrayView1<'_, f64>, actual: ArrayView1<'_, f64>) -> f64 {
    let n = actual.len();
    if n == 0 {
        return 0.0;
    }
    let mean = actual.sum() / n as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean) * (a - mean)).sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    let ss_res: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (a - p) * (a - p))
        .sum();
    1.0 - ss_res / ss_tot
}

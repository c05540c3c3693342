//! Linear-family regression by normal equations.
//!
//! ## Purpose
//!
//! Implements ordinary least squares and ridge regression: the Gram matrix
//! of the intercept-augmented design matrix is factored with an in-crate
//! Cholesky decomposition. The intercept is never penalized.
//!
//! ## Invariants
//!
//! * `fit` requires at least one row and matching x/y lengths.
//! * A singular or indefinite system is a typed error, not a panic or NaN.

use ndarray::{Array1, Array2};

use crate::model::Regressor;
use crate::primitives::{PipelineError, Result};

/// OLS (`alpha == 0`) or ridge (`alpha > 0`) linear model.
#[derive(Debug, Clone)]
pub struct LinearModel {
    alpha: f64,
    intercept: f64,
    coefficients: Array1<f64>,
}

impl LinearModel {
    pub fn ols() -> Self {
        Self::ridge(0.0)
    }

    pub fn ridge(alpha: f64) -> Self {
        Self {
            alpha,
            intercept: 0.0,
            coefficients: Array1::zeros(0),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// Restore a fitted model from stored parameters.
    pub fn from_parameters(alpha: f64, intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            alpha,
            intercept,
            coefficients: Array1::from_vec(coefficients),
        }
    }
}

impl Regressor for LinearModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        let p = x.ncols();
        if n != y.len() {
            return Err(PipelineError::MismatchedInputs {
                left: n,
                right: y.len(),
            });
        }
        if n == 0 {
            return Err(PipelineError::EmptyTable);
        }

        // Gram matrix and right-hand side of the intercept-augmented system
        // [1 X]^T [1 X] beta = [1 X]^T y, with the ridge penalty on every
        // diagonal entry except the intercept's.
        let dim = p + 1;
        let mut gram = Array2::<f64>::zeros((dim, dim));
        let mut rhs = Array1::<f64>::zeros(dim);

        gram[[0, 0]] = n as f64;
        for j in 0..p {
            let col = x.column(j);
            let sum: f64 = col.sum();
            gram[[0, j + 1]] = sum;
            gram[[j + 1, 0]] = sum;
        }
        for a in 0..p {
            for b in a..p {
                let dot = x.column(a).dot(&x.column(b));
                gram[[a + 1, b + 1]] = dot;
                gram[[b + 1, a + 1]] = dot;
            }
        }
        for j in 0..p {
            gram[[j + 1, j + 1]] += self.alpha;
        }

        rhs[0] = y.sum();
        for j in 0..p {
            rhs[j + 1] = x.column(j).dot(y);
        }

        let beta = cholesky_solve(gram, rhs)?;
        self.intercept = beta[0];
        self.coefficients = beta.slice(ndarray::s![1..]).to_owned();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(PipelineError::MismatchedInputs {
                left: x.ncols(),
                right: self.coefficients.len(),
            });
        }
        Ok(x.dot(&self.coefficients) + self.intercept)
    }
}

/// Solve `a * x = b` for symmetric positive definite `a`.
fn cholesky_solve(a: Array2<f64>, b: Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        // Rank deficiency shows up as a pivot at or below rounding noise.
        let tol = 1e-10 * a[[j, j]].abs().max(1.0);
        if diag <= tol || !diag.is_finite() {
            return Err(PipelineError::SingularSystem);
        }
        l[[j, j]] = diag.sqrt();

        for i in (j + 1)..n {
            let mut v = a[[i, j]];
            for k in 0..j {
                v -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = v / l[[j, j]];
        }
    }

    // Forward substitution: L z = b.
    let mut z = b;
    for i in 0..n {
        for k in 0..i {
            let prod = l[[i, k]] * z[k];
            z[i] -= prod;
        }
        z[i] /= l[[i, i]];
    }

    // Back substitution: L^T x = z.
    let mut x = z;
    for i in (0..n).rev() {
        for k in (i + 1)..n {
            let prod = l[[k, i]] * x[k];
            x[i] -= prod;
        }
        x[i] /= l[[i, i]];
    }
    Ok(x)
}

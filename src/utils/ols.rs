//! Ordinary Least Squares (OLS) regression.
//!
//! Used by the ADF regression (which needs coefficient standard errors) and
//! by the Hannan-Rissanen start values of the ARIMA estimator.

use crate::error::{AnalysisError, Result};
use std::f64::consts::PI;

/// OLS regression coefficients and their sampling statistics.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// One coefficient per design column, in column order.
    pub coefficients: Vec<f64>,
    /// Standard errors of the coefficients.
    pub std_errors: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Number of observations.
    pub nobs: usize,
}

impl OLSResult {
    pub fn num_params(&self) -> usize {
        self.coefficients.len()
    }

    /// t-ratios `coefficient / std_error`.
    pub fn t_values(&self) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(self.std_errors.iter())
            .map(|(c, se)| c / se)
            .collect()
    }

    /// Gaussian log-likelihood at the ML variance estimate `rss / n`.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * PI).ln() + (self.rss / n).ln() + 1.0)
    }

    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.num_params() as f64
    }

    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood() + self.num_params() as f64 * (self.nobs as f64).ln()
    }
}

/// Fit `y = X β` where `columns` holds the design matrix column by column.
///
/// Add an explicit column of ones for an intercept. Solves the normal
/// equations with a Cholesky factorisation.
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    let k = columns.len();

    if k == 0 {
        return Err(AnalysisError::InvalidParameter(
            "OLS needs at least one design column".to_string(),
        ));
    }
    if n <= k {
        return Err(AnalysisError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }
    for col in columns {
        if col.len() != n {
            return Err(AnalysisError::InvalidParameter(format!(
                "design column has {} rows, expected {}",
                col.len(),
                n
            )));
        }
    }

    // X'X and X'y
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for i in 0..k {
        for j in 0..=i {
            let s: f64 = columns[i].iter().zip(&columns[j]).map(|(a, b)| a * b).sum();
            xtx[i][j] = s;
            xtx[j][i] = s;
        }
        xty[i] = columns[i].iter().zip(y).map(|(a, b)| a * b).sum();
    }

    let chol = cholesky(&xtx).ok_or_else(|| {
        AnalysisError::ComputationError("OLS design matrix is singular".to_string())
    })?;
    let beta = cholesky_solve(&chol, &xty);

    let rss: f64 = (0..n)
        .map(|t| {
            let fitted: f64 = (0..k).map(|j| columns[j][t] * beta[j]).sum();
            (y[t] - fitted).powi(2)
        })
        .sum();

    let sigma2 = rss / (n - k) as f64;
    let std_errors = (0..k)
        .map(|j| {
            let mut unit = vec![0.0; k];
            unit[j] = 1.0;
            let col = cholesky_solve(&chol, &unit);
            (sigma2 * col[j]).sqrt()
        })
        .collect();

    Ok(OLSResult {
        coefficients: beta,
        std_errors,
        rss,
        nobs: n,
    })
}

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                // Relative pivot check catches numerically collinear columns
                if sum <= 1e-12 * a[i][i].abs() || sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(l)
}

/// Solve `L L' x = b`.
fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    x
}

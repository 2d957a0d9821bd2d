//! Harvey state-space form of a (seasonal) ARMA model and its Kalman filter.
//!
//! With `r = max(p*, q* + 1)` for the expanded orders `p*`, `q*`:
//!
//! ```text
//! w_t - μ = Z α_t,            Z = [1, 0, ..., 0]
//! α_{t+1} = T α_t + R ε_t,    ε_t ~ N(0, σ²)
//! ```
//!
//! `T` holds `φ*` in its first column and ones on the superdiagonal,
//! `R = [1, θ*_1, ..., θ*_{r-1}]`. Covariances are kept in units of σ², which
//! is concentrated out of the likelihood.

use std::f64::consts::PI;

const LYAPUNOV_MAX_ITER: usize = 64;
const LYAPUNOV_TOL: f64 = 1e-12;

/// Transition structure of an ARMA model in Harvey form.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpace {
    /// First column of `T` (padded `φ*`).
    phi: Vec<f64>,
    /// Disturbance loading `R` (padded `θ*` after a leading one).
    r_vec: Vec<f64>,
}

impl StateSpace {
    /// Build from expanded AR (`φ*`) and MA (`θ*`) coefficients.
    pub fn new(ar: &[f64], ma: &[f64]) -> Self {
        let dim = ar.len().max(ma.len() + 1);
        let mut phi = vec![0.0; dim];
        phi[..ar.len()].copy_from_slice(ar);
        let mut r_vec = vec![0.0; dim];
        r_vec[0] = 1.0;
        r_vec[1..=ma.len()].copy_from_slice(ma);
        Self { phi, r_vec }
    }

    pub fn dim(&self) -> usize {
        self.phi.len()
    }

    /// `T a`
    pub fn transition(&self, a: &[f64]) -> Vec<f64> {
        let r = self.dim();
        (0..r)
            .map(|i| self.phi[i] * a[0] + if i + 1 < r { a[i + 1] } else { 0.0 })
            .collect()
    }

    /// `T P T'`, exploiting the companion structure of `T`.
    fn sandwich(&self, p: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let r = self.dim();
        // M = T P
        let m: Vec<Vec<f64>> = (0..r)
            .map(|i| {
                (0..r)
                    .map(|j| self.phi[i] * p[0][j] + if i + 1 < r { p[i + 1][j] } else { 0.0 })
                    .collect()
            })
            .collect();
        // M T'
        (0..r)
            .map(|i| {
                (0..r)
                    .map(|j| self.phi[j] * m[i][0] + if j + 1 < r { m[i][j + 1] } else { 0.0 })
                    .collect()
            })
            .collect()
    }

    /// One-step covariance prediction `T P T' + R R'`.
    pub fn predict_covariance(&self, p: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let mut next = self.sandwich(p);
        for (i, row) in next.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value += self.r_vec[i] * self.r_vec[j];
            }
        }
        next
    }

    /// Stationary state covariance: the solution of `P = T P T' + R R'`.
    ///
    /// Doubling iteration `P ← P + A P A'`, `A ← A²`. Returns `None` when the
    /// iteration diverges or does not settle.
    pub fn stationary_covariance(&self) -> Option<Vec<Vec<f64>>> {
        let r = self.dim();
        let mut p: Vec<Vec<f64>> = (0..r)
            .map(|i| (0..r).map(|j| self.r_vec[i] * self.r_vec[j]).collect())
            .collect();
        let mut a: Vec<Vec<f64>> = (0..r)
            .map(|i| {
                (0..r)
                    .map(|j| {
                        if j == 0 {
                            self.phi[i]
                        } else if j == i + 1 {
                            1.0
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        for _ in 0..LYAPUNOV_MAX_ITER {
            let apa = mat_mul(&mat_mul(&a, &p), &transpose(&a));
            let scale = p.iter().flatten().fold(0.0_f64, |m, v| m.max(v.abs()));
            let change = apa.iter().flatten().fold(0.0_f64, |m, v| m.max(v.abs()));

            for (row, add) in p.iter_mut().zip(&apa) {
                for (v, d) in row.iter_mut().zip(add) {
                    *v += d;
                }
            }
            if !change.is_finite() {
                return None;
            }
            if change <= LYAPUNOV_TOL * scale.max(1.0) {
                return Some(p);
            }
            a = mat_mul(&a, &a);
        }

        None
    }
}

fn mat_mul(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = a.len();
    let m = b[0].len();
    let mut out = vec![vec![0.0; m]; n];
    for i in 0..n {
        for (k, b_row) in b.iter().enumerate() {
            let aik = a[i][k];
            if aik == 0.0 {
                continue;
            }
            for j in 0..m {
                out[i][j] += aik * b_row[j];
            }
        }
    }
    out
}

fn transpose(a: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = a.len();
    let m = a[0].len();
    (0..m).map(|j| (0..n).map(|i| a[i][j]).collect()).collect()
}

/// Output of a Kalman filter pass with σ² concentrated out.
#[derive(Debug, Clone)]
pub struct FilterOutput {
    /// Concentrated Gaussian log-likelihood.
    pub log_likelihood: f64,
    /// ML estimate of the innovation variance.
    pub sigma2: f64,
    /// One-step-ahead prediction errors (`NaN` at missing observations).
    pub innovations: Vec<f64>,
    /// Innovation variances in units of σ² (`NaN` at missing observations).
    pub innovation_variances: Vec<f64>,
    /// Number of observations that entered the likelihood.
    pub nobs: usize,
    /// Filtered state `a_{n|n}` after the last observation.
    pub state: Vec<f64>,
    /// Filtered state covariance `P_{n|n}` in units of σ².
    pub covariance: Vec<Vec<f64>>,
}

/// Run the Kalman filter on `values - mean`.
///
/// Returns `None` if the stationary initialisation fails, an innovation
/// variance is not positive, or the likelihood is not finite.
pub fn kalman_filter(model: &StateSpace, values: &[f64], mean: f64) -> Option<FilterOutput> {
    let r = model.dim();
    let mut a = vec![0.0; r];
    let mut p = model.stationary_covariance()?;

    let n = values.len();
    let mut innovations = vec![f64::NAN; n];
    let mut variances = vec![f64::NAN; n];
    let mut sum_scaled_sq = 0.0;
    let mut sum_log_f = 0.0;
    let mut nobs = 0usize;

    for (t, &y) in values.iter().enumerate() {
        if t > 0 {
            a = model.transition(&a);
            p = model.predict_covariance(&p);
        }
        if y.is_nan() {
            continue;
        }

        let f = p[0][0];
        if !(f > 0.0) || !f.is_finite() {
            return None;
        }
        let v = y - mean - a[0];
        innovations[t] = v;
        variances[t] = f;
        sum_scaled_sq += v * v / f;
        sum_log_f += f.ln();
        nobs += 1;

        // a += P[:,0] v / F ;  P -= P[:,0] P[0,:] / F
        let gain: Vec<f64> = (0..r).map(|i| p[i][0] / f).collect();
        let p_row0 = p[0].clone();
        for i in 0..r {
            a[i] += gain[i] * v;
            for j in 0..r {
                p[i][j] -= gain[i] * p_row0[j];
            }
        }
    }

    if nobs == 0 {
        return None;
    }

    let sigma2 = sum_scaled_sq / nobs as f64;
    let log_likelihood =
        -0.5 * nobs as f64 * ((2.0 * PI).ln() + sigma2.ln() + 1.0) - 0.5 * sum_log_f;
    if !log_likelihood.is_finite() {
        return None;
    }

    Some(FilterOutput {
        log_likelihood,
        sigma2,
        innovations,
        innovation_variances: variances,
        nobs,
        state: a,
        covariance: p,
    })
}

//! Augmented Dickey-Fuller unit-root test.
//!
//! Regression with a constant and no trend:
//!
//! ```text
//! Δy_t = α + β·y_{t-1} + Σ_{i=1..k} γ_i·Δy_{t-i} + ε_t
//! ```
//!
//! The null hypothesis is a unit root (β = 0); rejecting it indicates a
//! stationary series. p-values come from the MacKinnon (1994) response
//! surface and critical values from the MacKinnon (2010) finite-sample table,
//! both for the constant-only, single-series case.

use crate::core::TimeSeries;
use crate::error::{AnalysisError, Result};
use crate::utils::{cdf_normal, ols_fit, quantile_normal, OLSResult};

/// Significance level behind [`StationarityResult::is_stationary`].
pub const STATIONARITY_ALPHA: f64 = 0.05;

// MacKinnon (1994) p-value surface, constant only, one series.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 3.8269e-02];
const TAU_LARGE_P: [f64; 4] = [1.7339, 9.3202e-01, -1.2745e-01, -1.0368e-02];

// MacKinnon (2010) critical values, constant only: c0 + c1/n + c2/n^2 + c3/n^3.
const CRIT_1PCT: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CRIT_5PCT: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.040];
const CRIT_10PCT: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

/// Rule for choosing the number of lagged differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LagSelection {
    /// Minimise AIC over `0..=max_lag` on a common sample.
    #[default]
    Aic,
    /// Minimise BIC over `0..=max_lag` on a common sample.
    Bic,
    /// Drop lags from `max_lag` down until the last one is significant at 5%.
    TStat,
    /// Always use `max_lag`.
    Fixed,
}

/// Configuration for the ADF test.
#[derive(Debug, Clone, Default)]
pub struct AdfConfig {
    /// Largest lag considered; `None` uses `ceil(12 * (n/100)^(1/4))`.
    pub max_lag: Option<usize>,
    pub selection: LagSelection,
}

impl AdfConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = Some(max_lag);
        self
    }

    pub fn with_selection(mut self, selection: LagSelection) -> Self {
        self.selection = selection;
        self
    }
}

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

/// Result of a stationarity test.
#[derive(Debug, Clone, PartialEq)]
pub struct StationarityResult {
    /// t-ratio of the lagged level coefficient.
    pub statistic: f64,
    /// MacKinnon approximate p-value in [0, 1].
    pub p_value: f64,
    pub critical_values: CriticalValues,
    /// Number of lagged differences in the final regression.
    pub used_lag: usize,
    /// Observations in the final regression.
    pub nobs: usize,
    /// Best information criterion value (`Aic`/`Bic` selection only).
    pub ic_best: Option<f64>,
}

impl StationarityResult {
    /// Unit root rejected at [`STATIONARITY_ALPHA`].
    pub fn is_stationary(&self) -> bool {
        self.is_stationary_at(STATIONARITY_ALPHA)
    }

    pub fn is_stationary_at(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Runs the ADF test on prepared series.
#[derive(Debug, Clone, Default)]
pub struct StationarityTester {
    config: AdfConfig,
}

impl StationarityTester {
    pub fn new(config: AdfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdfConfig {
        &self.config
    }

    /// Test a series; missing values are dropped first.
    pub fn test(&self, series: &TimeSeries) -> Result<StationarityResult> {
        adf_test(&series.dropna(), &self.config)
    }
}

/// Default maximum lag `ceil(12 * (n/100)^(1/4))`, capped at `n/2 - 2`.
pub fn default_max_lag(n: usize) -> usize {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    schwert.min((n / 2).saturating_sub(2))
}

/// Augmented Dickey-Fuller test on raw values (no missing values allowed).
pub fn adf_test(values: &[f64], config: &AdfConfig) -> Result<StationarityResult> {
    let n = values.len();
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::InvalidSeries(
            "ADF test needs finite values; drop missing values first".to_string(),
        ));
    }
    if n / 2 < 2 {
        return Err(AnalysisError::InsufficientData { needed: 4, got: n });
    }

    let lag_cap = n / 2 - 2;
    let max_lag = match config.max_lag {
        None => default_max_lag(n),
        Some(lag) if lag > lag_cap => {
            return Err(AnalysisError::InsufficientData {
                needed: 2 * (lag + 2),
                got: n,
            })
        }
        Some(lag) => lag,
    };
    if n < max_lag + 2 {
        return Err(AnalysisError::InsufficientData {
            needed: max_lag + 2,
            got: n,
        });
    }

    let diff: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let (used_lag, ic_best) = match config.selection {
        LagSelection::Fixed => (max_lag, None),
        LagSelection::Aic => {
            let (lag, ic) = select_by_criterion(values, &diff, max_lag, OLSResult::aic)?;
            (lag, Some(ic))
        }
        LagSelection::Bic => {
            let (lag, ic) = select_by_criterion(values, &diff, max_lag, OLSResult::bic)?;
            (lag, Some(ic))
        }
        LagSelection::TStat => (select_by_t_stat(values, &diff, max_lag)?, None),
    };
    log::debug!(
        "ADF lag selection {:?}: using {} of at most {} lags",
        config.selection,
        used_lag,
        max_lag
    );

    // Final regression on the full sample available for the chosen lag
    let (y, columns) = adf_design(values, &diff, used_lag, used_lag);
    let fit = ols_fit(&y, &columns)?;
    let statistic = fit.t_values()[1];
    if !statistic.is_finite() {
        return Err(AnalysisError::ComputationError(
            "ADF regression is degenerate (perfect fit)".to_string(),
        ));
    }

    let nobs = y.len();
    Ok(StationarityResult {
        statistic,
        p_value: mackinnon_p_value(statistic),
        critical_values: mackinnon_critical_values(nobs),
        used_lag,
        nobs,
        ic_best,
    })
}

/// Regression rows `start..diff.len()` with columns
/// `[1, y_{t-1}, Δy_{t-1}, ..., Δy_{t-lag}]`.
fn adf_design(values: &[f64], diff: &[f64], lag: usize, start: usize) -> (Vec<f64>, Vec<Vec<f64>>) {
    let rows = start..diff.len();
    let y: Vec<f64> = diff[rows.clone()].to_vec();

    let mut columns = Vec::with_capacity(lag + 2);
    columns.push(vec![1.0; y.len()]);
    columns.push(rows.clone().map(|j| values[j]).collect());
    for i in 1..=lag {
        columns.push(rows.clone().map(|j| diff[j - i]).collect());
    }
    (y, columns)
}

/// Smallest-criterion lag on the common sample `max_lag..`; ties keep the
/// smaller lag. Candidates whose regression cannot be fitted are skipped.
fn select_by_criterion(
    values: &[f64],
    diff: &[f64],
    max_lag: usize,
    criterion: fn(&OLSResult) -> f64,
) -> Result<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    let mut last_error = None;
    for lag in 0..=max_lag {
        let (y, columns) = adf_design(values, diff, lag, max_lag);
        let ic = match ols_fit(&y, &columns) {
            Ok(fit) => criterion(&fit),
            Err(e) => {
                log::debug!("ADF lag {} skipped: {}", lag, e);
                last_error = Some(e);
                continue;
            }
        };
        if ic.is_finite() && best.map_or(true, |(_, b)| ic < b) {
            best = Some((lag, ic));
        }
    }
    best.ok_or_else(|| {
        last_error.unwrap_or_else(|| {
            AnalysisError::ComputationError("no ADF lag candidate could be fitted".to_string())
        })
    })
}

/// General-to-specific selection on the common sample. Lags whose
/// regression cannot be fitted are dropped like insignificant ones.
fn select_by_t_stat(values: &[f64], diff: &[f64], max_lag: usize) -> Result<usize> {
    let threshold = quantile_normal(0.95);
    for lag in (1..=max_lag).rev() {
        let (y, columns) = adf_design(values, diff, lag, max_lag);
        let Ok(fit) = ols_fit(&y, &columns) else {
            log::debug!("ADF lag {} skipped: singular regression", lag);
            continue;
        };
        let last_t = fit.t_values()[lag + 1];
        if last_t.is_finite() && last_t.abs() >= threshold {
            return Ok(lag);
        }
    }
    Ok(0)
}

/// MacKinnon (1994) approximate p-value for the constant-only ADF statistic.
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }
    let coefs: &[f64] = if statistic <= TAU_STAR {
        &TAU_SMALL_P
    } else {
        &TAU_LARGE_P
    };
    cdf_normal(polyval(coefs, statistic)).clamp(0.0, 1.0)
}

/// MacKinnon (2010) critical values for a regression on `nobs` observations.
pub fn mackinnon_critical_values(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs as f64;
    CriticalValues {
        cv_1pct: polyval(&CRIT_1PCT, inv),
        cv_5pct: polyval(&CRIT_5PCT, inv),
        cv_10pct: polyval(&CRIT_10PCT, inv),
    }
}

/// `c[0] + c[1] x + c[2] x^2 + ...`
fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

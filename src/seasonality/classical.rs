//! Classical additive decomposition.
//!
//! The series is split into
//! - Trend: centred moving average over one period, extended linearly to the
//!   ends of the series
//! - Seasonal: the mean detrended value of each phase, centred to zero mean
//! - Residual: what remains after removing trend and seasonal

use crate::core::{interpolate_series, TimeSeries};
use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Utc};

/// Result of a classical additive decomposition.
///
/// All component vectors have the length of the input and are aligned to its
/// timestamps. `trend + seasonal + residual == observed` at every observed
/// point; the residual is `NaN` where the observation is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionResult {
    pub timestamps: Vec<DateTime<Utc>>,
    pub observed: Vec<f64>,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
    /// Seasonal period used.
    pub period: usize,
    /// Zero-mean seasonal effect of each phase `0..period`.
    pub seasonal_figure: Vec<f64>,
}

impl DecompositionResult {
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Observed values with the seasonal component removed.
    pub fn deseasonalized(&self) -> Vec<f64> {
        self.observed
            .iter()
            .zip(&self.seasonal)
            .map(|(y, s)| y - s)
            .collect()
    }

    /// Seasonal strength in [0, 1]: `1 - Var(R) / Var(S + R)`.
    pub fn seasonal_strength(&self) -> f64 {
        strength(&self.seasonal, &self.residual)
    }

    /// Trend strength in [0, 1]: `1 - Var(R) / Var(T + R)`.
    pub fn trend_strength(&self) -> f64 {
        strength(&self.trend, &self.residual)
    }
}

fn strength(component: &[f64], residual: &[f64]) -> f64 {
    let (r, cr): (Vec<f64>, Vec<f64>) = component
        .iter()
        .zip(residual)
        .filter(|(_, r)| !r.is_nan())
        .map(|(c, r)| (*r, c + r))
        .unzip();

    let var_cr = population_variance(&cr);
    if var_cr < 1e-10 {
        return 0.0;
    }
    (1.0 - population_variance(&r) / var_cr).max(0.0)
}

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// Additive moving-average decomposition with a fixed seasonal period.
#[derive(Debug, Clone)]
pub struct Decomposer {
    period: usize,
}

impl Decomposer {
    /// Create a decomposer for the given seasonal period (must be ≥ 2).
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Decompose a series.
    ///
    /// # Errors
    /// - `InvalidParameter` if the period is below 2 or cannot be doubled.
    /// - `InsufficientData` if the series is shorter than two periods.
    /// - Frequency errors when the series has no regular spacing.
    pub fn decompose(&self, series: &TimeSeries) -> Result<DecompositionResult> {
        let period = self.period;
        if period < 2 {
            return Err(AnalysisError::InvalidParameter(format!(
                "seasonal period must be at least 2, got {}",
                period
            )));
        }

        let needed = period.checked_mul(2).ok_or_else(|| {
            AnalysisError::InvalidParameter(format!("seasonal period {} is too large", period))
        })?;
        let n = series.len();
        if n < needed {
            return Err(AnalysisError::InsufficientData { needed, got: n });
        }
        series.require_frequency()?;

        let observed = series.values().to_vec();
        if observed.iter().filter(|v| !v.is_nan()).count() < 2 {
            return Err(AnalysisError::InvalidSeries(
                "need at least 2 observed values to decompose".to_string(),
            ));
        }
        if series.has_missing_values() {
            log::debug!(
                "interpolating {} missing value(s) before decomposition",
                series.missing_count()
            );
        }
        let filled = interpolate_series(&observed, true);

        let trend = centred_trend(&filled, period);
        let seasonal_figure = seasonal_figure(&observed, &filled, &trend, period);

        let seasonal: Vec<f64> = (0..n).map(|i| seasonal_figure[i % period]).collect();
        let residual: Vec<f64> = (0..n)
            .map(|i| observed[i] - trend[i] - seasonal[i])
            .collect();

        Ok(DecompositionResult {
            timestamps: series.timestamps().to_vec(),
            observed,
            trend,
            seasonal,
            residual,
            period,
            seasonal_figure,
        })
    }
}

/// Centred moving average, linearly extended over the undefined ends.
///
/// Even periods use the 2×period filter `[0.5, 1, ..., 1, 0.5] / period`.
fn centred_trend(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] = 0.5 / period as f64;
        w[period] = 0.5 / period as f64;
        w
    } else {
        vec![1.0 / period as f64; period]
    };
    let half = weights.len() / 2;

    let mut trend = vec![f64::NAN; n];
    for (i, slot) in trend.iter_mut().enumerate().take(n - half).skip(half) {
        *slot = weights
            .iter()
            .enumerate()
            .map(|(j, w)| w * values[i - half + j])
            .sum();
    }

    extrapolate_ends(&mut trend, half, n - half - 1, period - 1);
    trend
}

/// Fill `trend[..front]` and `trend[back+1..]` from straight lines fitted to
/// up to `npoints` defined values at each end (`[front, front+npoints)` and
/// `[back-npoints, back)`).
fn extrapolate_ends(trend: &mut [f64], front: usize, back: usize, npoints: usize) {
    let n = trend.len();

    let front_last = (front + npoints).min(back);
    let (slope, intercept) = line_fit(trend, front, front_last.max(front + 1));
    for (i, slot) in trend.iter_mut().enumerate().take(front) {
        *slot = intercept + slope * i as f64;
    }

    let back_first = back.saturating_sub(npoints).max(front);
    let (slope, intercept) = line_fit(trend, back_first, back.max(back_first + 1));
    for (i, slot) in trend.iter_mut().enumerate().take(n).skip(back + 1) {
        *slot = intercept + slope * i as f64;
    }
}

/// Least-squares line through `(i, values[i])` for `i` in `start..end`.
///
/// A single point gives a horizontal line.
fn line_fit(values: &[f64], start: usize, end: usize) -> (f64, f64) {
    let count = (end - start) as f64;
    let x_mean = (start..end).map(|i| i as f64).sum::<f64>() / count;
    let y_mean = values[start..end].iter().sum::<f64>() / count;

    let sxx: f64 = (start..end).map(|i| (i as f64 - x_mean).powi(2)).sum();
    if sxx == 0.0 {
        return (0.0, y_mean);
    }
    let sxy: f64 = (start..end)
        .map(|i| (i as f64 - x_mean) * (values[i] - y_mean))
        .sum();
    let slope = sxy / sxx;
    (slope, y_mean - slope * x_mean)
}

/// Per-phase mean of the detrended observations, centred to zero mean.
fn seasonal_figure(observed: &[f64], filled: &[f64], trend: &[f64], period: usize) -> Vec<f64> {
    let mut figure: Vec<f64> = (0..period)
        .map(|phase| {
            let detrended: Vec<f64> = (phase..observed.len())
                .step_by(period)
                .filter(|&i| !observed[i].is_nan())
                .map(|i| observed[i] - trend[i])
                .collect();

            if detrended.is_empty() {
                // Phase never observed: fall back to the interpolated values
                let fallback: Vec<f64> = (phase..filled.len())
                    .step_by(period)
                    .map(|i| filled[i] - trend[i])
                    .collect();
                fallback.iter().sum::<f64>() / fallback.len() as f64
            } else {
                detrended.iter().sum::<f64>() / detrended.len() as f64
            }
        })
        .collect();

    let centre = figure.iter().sum::<f64>() / period as f64;
    for f in &mut figure {
        *f -= centre;
    }
    figure
}

//! Fitted ARIMA model.

use crate::core::TimeSeries;
use crate::error::Result;
use crate::models::arima::estimate::Coefficients;
use crate::models::arima::spec::ModelSpec;
use crate::models::arima::state_space::{FilterOutput, StateSpace};
use crate::validation::{ljung_box, LjungBoxResult};

/// An estimated (seasonal) ARIMA model.
///
/// Produced by [`ArimaEstimator::fit`](crate::models::arima::ArimaEstimator::fit).
/// Residuals and fitted values live on the working scale, i.e. the
/// training series after seasonal and regular differencing.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub(crate) spec: ModelSpec,
    pub(crate) series: TimeSeries,
    pub(crate) working: Vec<f64>,
    pub(crate) coefficients: Coefficients,
    pub(crate) include_mean: bool,
    pub(crate) sigma2: f64,
    pub(crate) log_likelihood: f64,
    pub(crate) nobs: usize,
    pub(crate) iterations: usize,
    pub(crate) converged: bool,
    pub(crate) residuals: Vec<f64>,
    pub(crate) standardized_residuals: Vec<f64>,
    /// `a_{n|n}`
    pub(crate) filtered_state: Vec<f64>,
    /// `P_{n|n}` in units of σ²
    pub(crate) filtered_covariance: Vec<Vec<f64>>,
}

impl FittedModel {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_filter(
        spec: ModelSpec,
        series: TimeSeries,
        working: Vec<f64>,
        coefficients: Coefficients,
        include_mean: bool,
        output: FilterOutput,
        iterations: usize,
        converged: bool,
    ) -> Self {
        let sigma = output.sigma2.sqrt();
        let standardized_residuals = output
            .innovations
            .iter()
            .zip(&output.innovation_variances)
            .map(|(v, f)| v / (f.sqrt() * sigma))
            .collect();

        Self {
            spec,
            series,
            working,
            coefficients,
            include_mean,
            sigma2: output.sigma2,
            log_likelihood: output.log_likelihood,
            nobs: output.nobs,
            iterations,
            converged,
            residuals: output.innovations,
            standardized_residuals,
            filtered_state: output.state,
            filtered_covariance: output.covariance,
        }
    }

    pub fn spec(&self) -> ModelSpec {
        self.spec
    }

    /// The training series.
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// The differenced series the ARMA part was estimated on.
    pub fn working_series(&self) -> &[f64] {
        &self.working
    }

    pub fn ar(&self) -> &[f64] {
        &self.coefficients.ar
    }

    pub fn ma(&self) -> &[f64] {
        &self.coefficients.ma
    }

    pub fn seasonal_ar(&self) -> &[f64] {
        &self.coefficients.seasonal_ar
    }

    pub fn seasonal_ma(&self) -> &[f64] {
        &self.coefficients.seasonal_ma
    }

    /// Mean of the working series, zero when not estimated.
    pub fn mean(&self) -> f64 {
        self.coefficients.mean
    }

    pub fn include_mean(&self) -> bool {
        self.include_mean
    }

    /// Innovation variance σ².
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Observations that entered the likelihood.
    pub fn nobs(&self) -> usize {
        self.nobs
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// One-step-ahead prediction errors on the working scale (`NaN` where
    /// the working series is missing).
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Residuals divided by their prediction standard deviation.
    pub fn standardized_residuals(&self) -> &[f64] {
        &self.standardized_residuals
    }

    /// One-step-ahead predictions of the working series.
    pub fn fitted_values(&self) -> Vec<f64> {
        self.working
            .iter()
            .zip(&self.residuals)
            .map(|(y, e)| y - e)
            .collect()
    }

    /// Filtered state after the last observation.
    pub fn filtered_state(&self) -> &[f64] {
        &self.filtered_state
    }

    /// Filtered state covariance after the last observation.
    pub fn state_covariance(&self) -> Vec<Vec<f64>> {
        self.filtered_covariance
            .iter()
            .map(|row| row.iter().map(|v| v * self.sigma2).collect())
            .collect()
    }

    /// Estimated parameters including σ².
    pub fn num_params(&self) -> usize {
        self.spec.num_coefficients() + usize::from(self.include_mean) + 1
    }

    /// Akaike Information Criterion
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood + 2.0 * self.num_params() as f64
    }

    /// Corrected AIC; infinite when `nobs <= k + 1`.
    pub fn aicc(&self) -> f64 {
        let k = self.num_params() as f64;
        let n = self.nobs as f64;
        if n - k - 1.0 <= 0.0 {
            return f64::INFINITY;
        }
        self.aic() + 2.0 * k * (k + 1.0) / (n - k - 1.0)
    }

    /// Bayesian Information Criterion
    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood + self.num_params() as f64 * (self.nobs as f64).ln()
    }

    /// Ljung-Box test on the standardized residuals, with degrees of freedom
    /// reduced by the number of ARMA coefficients.
    pub fn ljung_box(&self, lags: usize) -> Result<LjungBoxResult> {
        ljung_box(
            &self.standardized_residuals,
            lags,
            self.spec.num_coefficients(),
        )
    }

    pub(crate) fn state_space(&self) -> StateSpace {
        self.coefficients.state_space(self.spec.period())
    }
}

//! Estimator and Forecaster traits defining the common interface for models.

use crate::core::{ForecastResult, TimeSeries};
use crate::error::Result;

/// Turns a series into a fitted model.
///
/// Estimation is a pure function of its inputs: fitting the same series
/// twice yields identical models.
pub trait Estimator {
    /// The fitted model type.
    type Model: Forecaster;

    /// Fit the model to the time series data.
    fn fit(&self, series: &TimeSeries) -> Result<Self::Model>;

    /// Get the model name.
    fn name(&self) -> String;
}

/// Common interface for fitted models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster: Send + Sync {
    /// Generate predictions with prediction intervals at `level`.
    fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult>;

    /// Get the residuals of the fit.
    fn residuals(&self) -> &[f64];

    /// Get the model name.
    fn name(&self) -> String;
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use anofox_tsa::core::TimeSeries;
/// use anofox_tsa::models::arima::{ArimaEstimator, ModelSpec};
/// use anofox_tsa::models::{BoxedForecaster, Estimator};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps = (0..30).map(|i| base + Duration::days(i)).collect();
/// let values = (0..30).map(|i| (i as f64).sqrt() + ((i * 3) % 4) as f64).collect();
/// let series = TimeSeries::new(timestamps, values).unwrap();
///
/// let estimator = ArimaEstimator::new(ModelSpec::new(0, 1, 0).unwrap());
/// let model: BoxedForecaster = Box::new(estimator.fit(&series).unwrap());
/// assert_eq!(model.name(), "ARIMA(0,1,0)");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

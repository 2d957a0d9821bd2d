//! Forecasting models.

mod traits;

pub mod arima;

pub use arima::{ArimaConfig, ArimaEstimator, FittedModel, ModelSpec};
pub use traits::{BoxedForecaster, Estimator, Forecaster};

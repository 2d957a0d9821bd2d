//! ARIMA and SARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - Order specifications (p, d, q)(P, D, Q)\[s\] with practical bounds
//! - Exact maximum-likelihood estimation through a state-space Kalman filter
//! - Multi-step forecasts with prediction intervals on the original scale
//!
//! # Example
//! ```
//! use anofox_tsa::core::TimeSeries;
//! use anofox_tsa::models::arima::{ArimaConfig, ArimaEstimator, ModelSpec};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let timestamps = (0..48).map(|i| base + Duration::days(i)).collect();
//! let values = (0..48usize)
//!     .map(|i| 50.0 + i as f64 + [3.0, -1.0, -4.0, 2.0][i % 4] + ((i * 7) % 5) as f64 * 0.3)
//!     .collect();
//! let series = TimeSeries::new(timestamps, values).unwrap();
//!
//! let spec = ModelSpec::new(0, 1, 1).unwrap().with_seasonal(0, 1, 0, 4).unwrap();
//! let model = ArimaEstimator::new(spec)
//!     .with_config(ArimaConfig::new().nelder_mead())
//!     .fit(&series)
//!     .unwrap();
//! let forecast = model.forecast(4, 0.9).unwrap();
//! assert_eq!(forecast.horizon(), 4);
//! ```

mod diff;
mod estimate;
mod forecast;
mod model;
mod polynomial;
mod simulate;
mod spec;
mod state_space;
mod transform;

pub use diff::{
    difference, differencing_polynomial, integrate, integration_weights, seasonal_difference,
    seasonal_integrate, undifference,
};
pub use estimate::{ArimaConfig, ArimaEstimator};
pub use forecast::DEFAULT_CONFIDENCE_LEVEL;
pub use model::FittedModel;
pub use polynomial::{expand_ar, expand_ma, is_invertible, is_stationary};
pub use simulate::simulate_arma;
pub use spec::{
    ModelSpec, SeasonalOrder, MAX_ARMA_ORDER, MAX_DIFFERENCING, MAX_PERIOD, MAX_SEASONAL_ORDER,
};
pub use state_space::{kalman_filter, FilterOutput, StateSpace};
pub use transform::{BlockKind, PacfTransform, ParameterTransform, RejectInfeasible};

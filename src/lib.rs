//! # anofox-tsa
//!
//! Univariate time series analysis.
//!
//! Provides series preparation with frequency inference, classical additive
//! decomposition, the augmented Dickey-Fuller stationarity test, and
//! ARIMA/SARIMA estimation by exact state-space maximum likelihood with
//! forecasting and prediction intervals.
//!
//! ```
//! use anofox_tsa::prelude::*;
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let observations = (0..60).map(|i| {
//!     let value = 20.0 + 0.5 * i as f64 + [2.0, -1.0, 0.5, -1.5][i % 4] + ((i * 7) % 3) as f64;
//!     (base + Duration::days(i as i64), value)
//! });
//! let series = SeriesPreparer::new().prepare(observations).unwrap();
//!
//! let decomposition = Decomposer::new(4).decompose(&series).unwrap();
//! assert_eq!(decomposition.len(), 60);
//!
//! let adf = StationarityTester::default().test(&series).unwrap();
//! println!("ADF p-value {:.3}", adf.p_value);
//!
//! let model = ArimaEstimator::new(ModelSpec::new(1, 1, 0).unwrap()).fit(&series).unwrap();
//! let forecast = model.forecast(7, DEFAULT_CONFIDENCE_LEVEL).unwrap();
//! assert_eq!(forecast.horizon(), 7);
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod models;
pub mod seasonality;
pub mod utils;
pub mod validation;

pub use error::{AnalysisError, Result};

pub mod prelude {
    pub use crate::core::{ForecastResult, Frequency, SeriesPreparer, TimeSeries};
    pub use crate::error::{AnalysisError, Result};
    pub use crate::models::arima::{
        ArimaConfig, ArimaEstimator, FittedModel, ModelSpec, DEFAULT_CONFIDENCE_LEVEL,
    };
    pub use crate::models::{Estimator, Forecaster};
    pub use crate::seasonality::{Decomposer, DecompositionResult};
    pub use crate::utils::quantile_normal;
    pub use crate::validation::{AdfConfig, StationarityResult, StationarityTester};
}

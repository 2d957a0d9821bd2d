//! Statistical tests: unit-root stationarity and residual diagnostics.
//!
//! # Example
//!
//! ```
//! use anofox_tsa::validation::{adf_test, ljung_box, AdfConfig};
//!
//! let series: Vec<f64> = (0..100).map(|i| ((i * 37) % 17) as f64 - 8.0).collect();
//! let adf = adf_test(&series, &AdfConfig::default()).unwrap();
//! println!("ADF statistic {:.3}, p-value {:.3}", adf.statistic, adf.p_value);
//!
//! let lb = ljung_box(&series, 10, 0).unwrap();
//! println!("Ljung-Box Q = {:.3}", lb.statistic);
//! ```

pub mod stationarity;

pub use residual_tests::{ljung_box, LjungBoxResult};
pub use stationarity::{
    adf_test, default_max_lag, mackinnon_critical_values, mackinnon_p_value, AdfConfig,
    CriticalValues, LagSelection, StationarityResult, StationarityTester, STATIONARITY_ALPHA,
};

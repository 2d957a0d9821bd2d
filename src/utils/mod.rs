//! Numerical utilities shared by the analysis modules.

pub mod ols;
pub mod optimization;
pub mod stats;

pub use ols::{ols_fit, OLSResult};
pub use optimization::{
    bfgs, nelder_mead, BfgsConfig, NelderMeadConfig, OptimizationResult, Optimizer,
};
pub use stats::{autocovariance, cdf_normal, mean, quantile_normal, variance};

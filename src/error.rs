//! Error types for the anofox-tsa library.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while preparing, decomposing, testing or modelling a series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Malformed or too-short input series.
    #[error("invalid series: {0}")]
    InvalidSeries(String),

    /// Series too short for the requested period, lag or model order.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The optimizer did not reach a feasible (stationary and invertible) solution.
    #[error("estimation did not converge: {0}")]
    Convergence(String),

    /// Forecast horizon must be positive.
    #[error("invalid forecast horizon {0}: must be at least 1")]
    InvalidHorizon(i64),

    /// Model orders out of range.
    #[error("invalid model specification: {0}")]
    InvalidModelSpec(String),

    /// Several timestamp spacings are equally common.
    #[error("ambiguous frequency: {0}")]
    AmbiguousFrequency(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

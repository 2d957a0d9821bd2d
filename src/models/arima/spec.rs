//! ARIMA and SARIMA order specifications.

use crate::error::{AnalysisError, Result};
use std::fmt;

/// Largest non-seasonal AR or MA order accepted.
pub const MAX_ARMA_ORDER: usize = 10;
/// Largest non-seasonal differencing order accepted.
pub const MAX_DIFFERENCING: usize = 5;
/// Largest seasonal AR, differencing or MA order accepted.
pub const MAX_SEASONAL_ORDER: usize = 5;
/// Largest seasonal period accepted.
pub const MAX_PERIOD: usize = 365;

/// Seasonal part (P, D, Q)\[s\] of a SARIMA model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonalOrder {
    /// Seasonal AR order (P)
    pub p: usize,
    /// Seasonal differencing order (D)
    pub d: usize,
    /// Seasonal MA order (Q)
    pub q: usize,
    /// Seasonal period (s)
    pub period: usize,
}

/// Validated ARIMA(p, d, q) or SARIMA(p, d, q)(P, D, Q)\[s\] orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
    seasonal: Option<SeasonalOrder>,
}

impl ModelSpec {
    /// Non-seasonal ARIMA(p, d, q).
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        if p > MAX_ARMA_ORDER || q > MAX_ARMA_ORDER {
            return Err(AnalysisError::InvalidModelSpec(format!(
                "AR and MA orders must not exceed {}, got p={}, q={}",
                MAX_ARMA_ORDER, p, q
            )));
        }
        if d > MAX_DIFFERENCING {
            return Err(AnalysisError::InvalidModelSpec(format!(
                "differencing order must not exceed {}, got d={}",
                MAX_DIFFERENCING, d
            )));
        }
        Ok(Self {
            p,
            d,
            q,
            seasonal: None,
        })
    }

    /// Add a seasonal part (P, D, Q)\[s\].
    pub fn with_seasonal(self, p: usize, d: usize, q: usize, period: usize) -> Result<Self> {
        if p > MAX_SEASONAL_ORDER || d > MAX_SEASONAL_ORDER || q > MAX_SEASONAL_ORDER {
            return Err(AnalysisError::InvalidModelSpec(format!(
                "seasonal orders must not exceed {}, got P={}, D={}, Q={}",
                MAX_SEASONAL_ORDER, p, d, q
            )));
        }
        if period == 0 || period > MAX_PERIOD {
            return Err(AnalysisError::InvalidModelSpec(format!(
                "seasonal period must be in 1..={}, got {}",
                MAX_PERIOD, period
            )));
        }
        Ok(Self {
            seasonal: Some(SeasonalOrder { p, d, q, period }),
            ..self
        })
    }

    /// Build from signed orders as received at an untyped boundary.
    pub fn from_orders(order: (i64, i64, i64), seasonal: Option<(i64, i64, i64, i64)>) -> Result<Self> {
        let (p, d, q) = order;
        let spec = Self::new(to_order(p, "p")?, to_order(d, "d")?, to_order(q, "q")?)?;
        match seasonal {
            None => Ok(spec),
            Some((sp, sd, sq, s)) => spec.with_seasonal(
                to_order(sp, "P")?,
                to_order(sd, "D")?,
                to_order(sq, "Q")?,
                to_order(s, "s")?,
            ),
        }
    }

    pub fn seasonal(&self) -> Option<SeasonalOrder> {
        self.seasonal
    }

    /// Seasonal period, or 0 for a non-seasonal model.
    pub fn period(&self) -> usize {
        self.seasonal.map_or(0, |s| s.period)
    }

    pub fn seasonal_p(&self) -> usize {
        self.seasonal.map_or(0, |s| s.p)
    }

    pub fn seasonal_d(&self) -> usize {
        self.seasonal.map_or(0, |s| s.d)
    }

    pub fn seasonal_q(&self) -> usize {
        self.seasonal.map_or(0, |s| s.q)
    }

    /// Order of the expanded AR polynomial, `p + s·P`.
    pub fn expanded_ar_order(&self) -> usize {
        self.p + self.period() * self.seasonal_p()
    }

    /// Order of the expanded MA polynomial, `q + s·Q`.
    pub fn expanded_ma_order(&self) -> usize {
        self.q + self.period() * self.seasonal_q()
    }

    /// Observations consumed by differencing, `d + s·D`.
    pub fn differencing_loss(&self) -> usize {
        self.d + self.period() * self.seasonal_d()
    }

    /// Number of ARMA coefficients (p + q + P + Q).
    pub fn num_coefficients(&self) -> usize {
        self.p + self.q + self.seasonal_p() + self.seasonal_q()
    }

    /// Smallest series length that can be estimated.
    ///
    /// Estimation requires `n > p + q + P·s + Q·s + d + D·s + 1`.
    pub fn min_observations(&self) -> usize {
        self.expanded_ar_order() + self.expanded_ma_order() + self.differencing_loss() + 2
    }
}

fn to_order(value: i64, name: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        AnalysisError::InvalidModelSpec(format!("order {} must be non-negative, got {}", name, value))
    })
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)?;
        if let Some(s) = self.seasonal {
            write!(f, "({},{},{})[{}]", s.p, s.d, s.q, s.period)?;
        }
        Ok(())
    }
}

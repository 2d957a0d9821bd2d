//! Parameter transforms that keep ARMA polynomials admissible.
//!
//! The optimiser works on unconstrained coordinates. A [`ParameterTransform`]
//! maps each polynomial block between those coordinates and its model
//! coefficients and decides which coefficient blocks are feasible
//! (stationary AR, invertible MA).

use crate::models::arima::polynomial::{from_pacf, is_invertible, is_stationary, step_down};
use std::fmt::Debug;

/// Kind of polynomial block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Autoregressive block, must be stationary.
    Ar,
    /// Moving-average block, must be invertible.
    Ma,
}

/// Strategy for enforcing stationarity and invertibility during estimation.
pub trait ParameterTransform: Debug + Send + Sync {
    /// Map optimiser coordinates to coefficients.
    fn constrain(&self, kind: BlockKind, unconstrained: &[f64]) -> Vec<f64>;

    /// Map coefficients to optimiser coordinates; `None` if infeasible.
    fn unconstrain(&self, kind: BlockKind, coefficients: &[f64]) -> Option<Vec<f64>>;

    /// Whether a coefficient block may be evaluated.
    fn is_feasible(&self, kind: BlockKind, coefficients: &[f64]) -> bool {
        match kind {
            BlockKind::Ar => is_stationary(coefficients),
            BlockKind::Ma => is_invertible(coefficients),
        }
    }

    fn name(&self) -> &'static str;
}

/// Maps ℝ^k onto the admissible region through partial autocorrelations.
///
/// Each coordinate `u` becomes a partial autocorrelation `u / sqrt(1 + u²)`
/// and the Durbin-Levinson recursion turns those into coefficients. MA
/// blocks are the negated image so that they land on invertible polynomials.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacfTransform;

impl ParameterTransform for PacfTransform {
    fn constrain(&self, kind: BlockKind, unconstrained: &[f64]) -> Vec<f64> {
        let pacf: Vec<f64> = unconstrained
            .iter()
            .map(|u| u / (1.0 + u * u).sqrt())
            .collect();
        let phi = from_pacf(&pacf);
        match kind {
            BlockKind::Ar => phi,
            BlockKind::Ma => phi.into_iter().map(|c| -c).collect(),
        }
    }

    fn unconstrain(&self, kind: BlockKind, coefficients: &[f64]) -> Option<Vec<f64>> {
        let phi: Vec<f64> = match kind {
            BlockKind::Ar => coefficients.to_vec(),
            BlockKind::Ma => coefficients.iter().map(|c| -c).collect(),
        };
        let pacf = step_down(&phi)?;
        Some(pacf.iter().map(|a| a / (1.0 - a * a).sqrt()).collect())
    }

    fn name(&self) -> &'static str {
        "pacf"
    }
}

/// Identity parameterisation; inadmissible candidates are rejected by the
/// objective instead of being mapped away.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectInfeasible;

impl ParameterTransform for RejectInfeasible {
    fn constrain(&self, _kind: BlockKind, unconstrained: &[f64]) -> Vec<f64> {
        unconstrained.to_vec()
    }

    fn unconstrain(&self, kind: BlockKind, coefficients: &[f64]) -> Option<Vec<f64>> {
        self.is_feasible(kind, coefficients)
            .then(|| coefficients.to_vec())
    }

    fn name(&self) -> &'static str {
        "reject-infeasible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pacf_transform_always_feasible() {
        let transform = PacfTransform;
        for u in [[-50.0, 3.0, 0.2], [0.0, 0.0, 0.0], [7.5, -7.5, 40.0]] {
            let ar = transform.constrain(BlockKind::Ar, &u);
            assert!(transform.is_feasible(BlockKind::Ar, &ar));
            let ma = transform.constrain(BlockKind::Ma, &u);
            assert!(transform.is_feasible(BlockKind::Ma, &ma));
        }
    }

    #[test]
    fn pacf_transform_round_trip() {
        let transform = PacfTransform;
        let ar = vec![0.5, -0.2];
        let u = transform.unconstrain(BlockKind::Ar, &ar).unwrap();
        let back = transform.constrain(BlockKind::Ar, &u);
        for (a, b) in ar.iter().zip(&back) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }

        let ma = vec![0.4];
        let u = transform.unconstrain(BlockKind::Ma, &ma).unwrap();
        assert_relative_eq!(transform.constrain(BlockKind::Ma, &u)[0], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn pacf_transform_rejects_infeasible_start() {
        assert!(PacfTransform.unconstrain(BlockKind::Ar, &[1.2]).is_none());
        assert!(PacfTransform.unconstrain(BlockKind::Ma, &[-1.0]).is_none());
    }

    #[test]
    fn reject_infeasible_is_identity_on_admissible_blocks() {
        let transform = RejectInfeasible;
        assert_eq!(transform.constrain(BlockKind::Ar, &[0.3, 0.1]), vec![0.3, 0.1]);
        assert_eq!(transform.unconstrain(BlockKind::Ma, &[0.5]), Some(vec![0.5]));
        assert!(transform.unconstrain(BlockKind::Ar, &[0.7, 0.3]).is_none());
        assert!(!transform.is_feasible(BlockKind::Ma, &[1.5, 0.5]));
    }
}

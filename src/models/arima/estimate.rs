//! Exact maximum-likelihood estimation of (seasonal) ARIMA models.

use crate::core::{interpolate_series, TimeSeries};
use crate::error::{AnalysisError, Result};
use crate::models::arima::diff::{difference, seasonal_difference};
use crate::models::arima::model::FittedModel;
use crate::models::arima::polynomial::{durbin_levinson, expand_ar, expand_ma};
use crate::models::arima::spec::ModelSpec;
use crate::models::arima::state_space::{kalman_filter, FilterOutput, StateSpace};
use crate::models::arima::transform::{BlockKind, PacfTransform, ParameterTransform};
use crate::models::Estimator;
use crate::utils::optimization::{NelderMeadConfig, Optimizer};
use crate::utils::{autocovariance, ols_fit};
use std::sync::Arc;

/// Estimation settings.
#[derive(Debug, Clone)]
pub struct ArimaConfig {
    /// Estimate a mean for the working series; `None` estimates it only when
    /// the model has no differencing.
    pub include_mean: Option<bool>,
    /// Minimiser for the negative log-likelihood.
    pub optimizer: Optimizer,
    /// Constraint strategy for the ARMA polynomials.
    pub transform: Arc<dyn ParameterTransform>,
}

impl Default for ArimaConfig {
    fn default() -> Self {
        Self {
            include_mean: None,
            optimizer: Optimizer::default(),
            transform: Arc::new(PacfTransform),
        }
    }
}

impl ArimaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the mean term on or off.
    pub fn with_mean(mut self, include: bool) -> Self {
        self.include_mean = Some(include);
        self
    }

    pub fn with_optimizer(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Use Nelder-Mead with its default settings.
    pub fn nelder_mead(self) -> Self {
        self.with_optimizer(Optimizer::NelderMead(NelderMeadConfig::default()))
    }

    pub fn with_transform<T: ParameterTransform + 'static>(mut self, transform: T) -> Self {
        self.transform = Arc::new(transform);
        self
    }

    /// Set the iteration cap of the current optimiser.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        match &mut self.optimizer {
            Optimizer::Bfgs(c) => c.max_iter = max_iter,
            Optimizer::NelderMead(c) => c.max_iter = max_iter,
        }
        self
    }

    /// Set the convergence tolerance of the current optimiser.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        match &mut self.optimizer {
            Optimizer::Bfgs(c) => c.tolerance = tolerance,
            Optimizer::NelderMead(c) => c.tolerance = tolerance,
        }
        self
    }
}

/// Model coefficients in natural units.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Coefficients {
    pub mean: f64,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

impl Coefficients {
    fn zeros(spec: &ModelSpec, mean: f64) -> Self {
        Self {
            mean,
            ar: vec![0.0; spec.p],
            ma: vec![0.0; spec.q],
            seasonal_ar: vec![0.0; spec.seasonal_p()],
            seasonal_ma: vec![0.0; spec.seasonal_q()],
        }
    }

    fn blocks(&self) -> [(BlockKind, &[f64]); 4] {
        [
            (BlockKind::Ar, self.ar.as_slice()),
            (BlockKind::Ma, self.ma.as_slice()),
            (BlockKind::Ar, self.seasonal_ar.as_slice()),
            (BlockKind::Ma, self.seasonal_ma.as_slice()),
        ]
    }

    pub fn state_space(&self, period: usize) -> StateSpace {
        StateSpace::new(
            &expand_ar(&self.ar, &self.seasonal_ar, period),
            &expand_ma(&self.ma, &self.seasonal_ma, period),
        )
    }
}

/// Packs coefficients into the optimiser's unconstrained vector and back.
struct ParameterLayout<'a> {
    spec: ModelSpec,
    include_mean: bool,
    transform: &'a dyn ParameterTransform,
}

impl ParameterLayout<'_> {
    fn pack(&self, coefs: &Coefficients) -> Option<Vec<f64>> {
        let mut x = Vec::new();
        if self.include_mean {
            x.push(coefs.mean);
        }
        for (kind, block) in coefs.blocks() {
            x.extend(self.transform.unconstrain(kind, block)?);
        }
        Some(x)
    }

    fn unpack(&self, x: &[f64]) -> Coefficients {
        let mut offset = 0;
        let mean = if self.include_mean {
            offset = 1;
            x[0]
        } else {
            0.0
        };

        let mut take = |kind: BlockKind, len: usize| {
            let block = self.transform.constrain(kind, &x[offset..offset + len]);
            offset += len;
            block
        };
        let ar = take(BlockKind::Ar, self.spec.p);
        let ma = take(BlockKind::Ma, self.spec.q);
        let seasonal_ar = take(BlockKind::Ar, self.spec.seasonal_p());
        let seasonal_ma = take(BlockKind::Ma, self.spec.seasonal_q());

        Coefficients {
            mean,
            ar,
            ma,
            seasonal_ar,
            seasonal_ma,
        }
    }

    fn is_feasible(&self, coefs: &Coefficients) -> bool {
        coefs.mean.is_finite()
            && coefs
                .blocks()
                .iter()
                .all(|(kind, block)| self.transform.is_feasible(*kind, block))
    }
}

/// Estimates ARIMA / SARIMA models by exact Gaussian maximum likelihood.
///
/// # Example
/// ```
/// use anofox_tsa::core::TimeSeries;
/// use anofox_tsa::models::arima::{ArimaEstimator, ModelSpec};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps = (0..60).map(|i| base + Duration::days(i)).collect();
/// let values = (0..60).map(|i| 10.0 + ((i * 7) % 5) as f64).collect();
/// let series = TimeSeries::new(timestamps, values).unwrap();
///
/// let model = ArimaEstimator::new(ModelSpec::new(1, 0, 0).unwrap())
///     .fit(&series)
///     .unwrap();
/// let forecast = model.forecast(3, 0.95).unwrap();
/// assert_eq!(forecast.horizon(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ArimaEstimator {
    spec: ModelSpec,
    config: ArimaConfig,
}

impl ArimaEstimator {
    pub fn new(spec: ModelSpec) -> Self {
        Self {
            spec,
            config: ArimaConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ArimaConfig) -> Self {
        self.config = config;
        self
    }

    pub fn spec(&self) -> ModelSpec {
        self.spec
    }

    pub fn config(&self) -> &ArimaConfig {
        &self.config
    }

    /// Fit the model to a series.
    ///
    /// # Errors
    /// - `InsufficientData` if `n <= p + q + P·s + Q·s + d + D·s + 1`.
    /// - `InvalidSeries` if too few observations survive differencing.
    /// - `Convergence` if no admissible parameters give a finite likelihood.
    pub fn fit(&self, series: &TimeSeries) -> Result<FittedModel> {
        let spec = self.spec;
        let n = series.len();
        if n < spec.min_observations() {
            return Err(AnalysisError::InsufficientData {
                needed: spec.min_observations(),
                got: n,
            });
        }

        let working = difference(
            &seasonal_difference(series.values(), spec.seasonal_d(), spec.period()),
            spec.d,
        );
        let observed: Vec<f64> = working.iter().copied().filter(|v| !v.is_nan()).collect();
        if observed.len() < 2 {
            return Err(AnalysisError::InvalidSeries(format!(
                "only {} observed value(s) remain after differencing",
                observed.len()
            )));
        }

        let include_mean = self
            .config
            .include_mean
            .unwrap_or(spec.differencing_loss() == 0);
        let start_mean = if include_mean {
            observed.iter().sum::<f64>() / observed.len() as f64
        } else {
            0.0
        };

        let layout = ParameterLayout {
            spec,
            include_mean,
            transform: self.config.transform.as_ref(),
        };
        let start = start_values(&working, &spec, start_mean, &layout);
        let x0 = layout
            .pack(&start)
            .or_else(|| layout.pack(&Coefficients::zeros(&spec, start_mean)))
            .ok_or_else(|| {
                AnalysisError::Convergence("no admissible starting point".to_string())
            })?;

        let evaluate = |coefs: &Coefficients| -> Option<FilterOutput> {
            if !layout.is_feasible(coefs) {
                return None;
            }
            kalman_filter(&coefs.state_space(spec.period()), &working, coefs.mean)
        };
        let objective = |x: &[f64]| match evaluate(&layout.unpack(x)) {
            Some(out) => -out.log_likelihood / out.nobs as f64,
            None => f64::INFINITY,
        };

        log::debug!(
            "fitting {} with {} parameter(s) by {} ({} transform)",
            spec,
            x0.len(),
            self.config.optimizer.name(),
            self.config.transform.name()
        );
        let result = self.config.optimizer.minimize(objective, &x0);

        if !result.optimal_value.is_finite() {
            return Err(AnalysisError::Convergence(format!(
                "no admissible parameters with a finite likelihood for {}",
                spec
            )));
        }
        if result.converged {
            log::debug!("{} converged after {} iteration(s)", spec, result.iterations);
        } else {
            log::warn!(
                "{} did not converge within {} iterations; using the best point found",
                spec,
                self.config.optimizer.max_iter()
            );
        }

        let coefs = layout.unpack(&result.optimal_point);
        let output = evaluate(&coefs).ok_or_else(|| {
            AnalysisError::Convergence(format!("likelihood not finite at the optimum of {}", spec))
        })?;

        Ok(FittedModel::from_filter(
            spec,
            series.clone(),
            working,
            coefs,
            include_mean,
            output,
            result.iterations,
            result.converged,
        ))
    }
}

impl Estimator for ArimaEstimator {
    type Model = FittedModel;

    fn fit(&self, series: &TimeSeries) -> Result<FittedModel> {
        ArimaEstimator::fit(self, series)
    }

    fn name(&self) -> String {
        self.spec.to_string()
    }
}

/// Hannan-Rissanen start values, falling back to zeros per inadmissible block.
fn start_values(
    working: &[f64],
    spec: &ModelSpec,
    mean: f64,
    layout: &ParameterLayout<'_>,
) -> Coefficients {
    let zeros = Coefficients::zeros(spec, mean);
    let Some(mut coefs) = hannan_rissanen(working, spec, mean) else {
        if spec.num_coefficients() > 0 {
            log::warn!("Hannan-Rissanen start failed for {}; starting from zeros", spec);
        }
        return zeros;
    };

    let admissible = |kind: BlockKind, block: &[f64]| {
        block.iter().all(|c| c.is_finite()) && layout.transform.unconstrain(kind, block).is_some()
    };
    let replace = |kind: BlockKind, block: &mut Vec<f64>, name: &str| {
        if !admissible(kind, block) {
            log::warn!("inadmissible {} start values for {}; using zeros", name, spec);
            block.iter_mut().for_each(|c| *c = 0.0);
        }
    };
    replace(BlockKind::Ar, &mut coefs.ar, "AR");
    replace(BlockKind::Ma, &mut coefs.ma, "MA");
    replace(BlockKind::Ar, &mut coefs.seasonal_ar, "seasonal AR");
    replace(BlockKind::Ma, &mut coefs.seasonal_ma, "seasonal MA");
    coefs
}

/// Two-stage regression start for ARMA coefficients.
///
/// A long autoregression (Yule-Walker by Durbin-Levinson) estimates the
/// innovations; the working series is then regressed on its own lags
/// (1..p, s..Ps) and on lagged innovations (1..q, s..Qs).
pub(crate) fn hannan_rissanen(working: &[f64], spec: &ModelSpec, mean: f64) -> Option<Coefficients> {
    let (p, q, sp, sq) = (spec.p, spec.q, spec.seasonal_p(), spec.seasonal_q());
    let s = spec.period().max(1);
    if p + q + sp + sq == 0 {
        return Some(Coefficients::zeros(spec, mean));
    }

    let x: Vec<f64> = interpolate_series(working, true)
        .iter()
        .map(|v| v - mean)
        .collect();
    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let n = x.len();
    let ar_lag = p.max(sp * s);
    let ma_lag = q.max(sq * s);

    // Stage 1: innovations from a long autoregression
    let (innovations, burn_in) = if ma_lag > 0 {
        let long = (((n as f64).ln().powi(2)).floor() as usize).max(2 * ar_lag.max(ma_lag));
        if long + ar_lag.max(ma_lag) >= n / 2 {
            return None;
        }
        let gamma: Vec<f64> = (0..=long).map(|k| autocovariance(&x, k)).collect();
        let (phi, _) = durbin_levinson(&gamma, long)?;
        let e: Vec<f64> = (0..n)
            .map(|t| {
                if t < long {
                    f64::NAN
                } else {
                    x[t] - (1..=long).map(|j| phi[j - 1] * x[t - j]).sum::<f64>()
                }
            })
            .collect();
        (e, long)
    } else {
        (vec![], 0)
    };

    // Stage 2: regression on lagged values and lagged innovations
    let first = burn_in + ar_lag.max(ma_lag);
    let rows = first..n;
    let mut columns: Vec<Vec<f64>> = Vec::new();
    for i in 1..=p {
        columns.push(rows.clone().map(|t| x[t - i]).collect());
    }
    for j in 1..=sp {
        columns.push(rows.clone().map(|t| x[t - j * s]).collect());
    }
    for i in 1..=q {
        columns.push(rows.clone().map(|t| innovations[t - i]).collect());
    }
    for j in 1..=sq {
        columns.push(rows.clone().map(|t| innovations[t - j * s]).collect());
    }
    let y: Vec<f64> = rows.map(|t| x[t]).collect();

    let fit = ols_fit(&y, &columns).ok()?;
    let mut beta = fit.coefficients.into_iter();
    let mut take = |len: usize| -> Vec<f64> { beta.by_ref().take(len).collect() };

    Some(Coefficients {
        mean,
        ar: take(p),
        seasonal_ar: take(sp),
        ma: take(q),
        seasonal_ma: take(sq),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arima::simulate::simulate_arma;
    use crate::models::arima::transform::RejectInfeasible;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        TimeSeries::new(timestamps, values).unwrap()
    }

    fn ar1_series(phi: f64, n: usize, seed: u64) -> TimeSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        make_series(simulate_arma(&[phi], &[], n, 1.0, &mut rng))
    }

    #[test]
    fn arima_ar1_recovers_coefficient() {
        let series = ar1_series(0.7, 500, 42);
        let model = ArimaEstimator::new(ModelSpec::new(1, 0, 0).unwrap())
            .fit(&series)
            .unwrap();

        assert!((model.ar()[0] - 0.7).abs() < 0.1);
        assert!(model.include_mean());
        assert!(model.mean().abs() < 0.5);
        assert!((model.sigma2() - 1.0).abs() < 0.2);
        assert!(model.converged());
    }

    #[test]
    fn arima_ma1_recovers_coefficient() {
        let mut rng = StdRng::seed_from_u64(7);
        let series = make_series(simulate_arma(&[], &[0.5], 600, 1.0, &mut rng));

        let model = ArimaEstimator::new(ModelSpec::new(0, 0, 1).unwrap())
            .fit(&series)
            .unwrap();
        assert!((model.ma()[0] - 0.5).abs() < 0.12);
    }

    #[test]
    fn arima_hannan_rissanen_start_near_truth() {
        let mut rng = StdRng::seed_from_u64(3);
        let values = simulate_arma(&[0.6], &[0.3], 800, 1.0, &mut rng);
        let spec = ModelSpec::new(1, 0, 1).unwrap();

        let start = hannan_rissanen(&values, &spec, 0.0).unwrap();
        assert!((start.ar[0] - 0.6).abs() < 0.2);
        assert!((start.ma[0] - 0.3).abs() < 0.2);
    }

    #[test]
    fn arima_differenced_model_has_no_mean_by_default() {
        let series = ar1_series(0.3, 200, 11);
        let cumulative: Vec<f64> = series
            .values()
            .iter()
            .scan(0.0, |acc, v| {
                *acc += v;
                Some(*acc)
            })
            .collect();

        let model = ArimaEstimator::new(ModelSpec::new(1, 1, 0).unwrap())
            .fit(&make_series(cumulative))
            .unwrap();
        assert!(!model.include_mean());
        assert_eq!(model.mean(), 0.0);
        assert_eq!(model.residuals().len(), 199);
    }

    #[test]
    fn arima_mean_override() {
        let series = ar1_series(0.5, 150, 5);
        let model = ArimaEstimator::new(ModelSpec::new(1, 0, 0).unwrap())
            .with_config(ArimaConfig::new().with_mean(false))
            .fit(&series)
            .unwrap();
        assert!(!model.include_mean());
        assert_eq!(model.mean(), 0.0);
    }

    #[test]
    fn arima_optimizers_and_transforms_agree() {
        let series = ar1_series(0.6, 300, 21);
        let spec = ModelSpec::new(1, 0, 0).unwrap();

        let bfgs = ArimaEstimator::new(spec).fit(&series).unwrap();
        let nm = ArimaEstimator::new(spec)
            .with_config(ArimaConfig::new().nelder_mead().with_tolerance(1e-10))
            .fit(&series)
            .unwrap();
        let reject = ArimaEstimator::new(spec)
            .with_config(ArimaConfig::new().with_transform(RejectInfeasible))
            .fit(&series)
            .unwrap();

        assert_relative_eq!(bfgs.ar()[0], nm.ar()[0], epsilon = 1e-3);
        assert_relative_eq!(bfgs.ar()[0], reject.ar()[0], epsilon = 1e-3);
        assert_relative_eq!(bfgs.log_likelihood(), reject.log_likelihood(), epsilon = 1e-4);
    }

    #[test]
    fn arima_fit_is_deterministic() {
        let series = ar1_series(0.4, 120, 8);
        let estimator = ArimaEstimator::new(ModelSpec::new(1, 0, 1).unwrap());
        let a = estimator.fit(&series).unwrap();
        let b = estimator.fit(&series).unwrap();
        assert_eq!(a.ar(), b.ar());
        assert_eq!(a.ma(), b.ma());
        assert_eq!(a.log_likelihood(), b.log_likelihood());
    }

    #[test]
    fn arima_seasonal_fit() {
        let mut rng = StdRng::seed_from_u64(17);
        let noise = simulate_arma(&[], &[], 120, 0.5, &mut rng);
        let values: Vec<f64> = (0..120)
            .map(|t| 20.0 + 5.0 * ((t % 4) as f64) + noise[t])
            .collect();

        let spec = ModelSpec::new(1, 0, 0)
            .unwrap()
            .with_seasonal(0, 1, 1, 4)
            .unwrap();
        let model = ArimaEstimator::new(spec).fit(&make_series(values)).unwrap();

        assert_eq!(model.seasonal_ma().len(), 1);
        assert!(model.seasonal_ma()[0] < 0.0);
        assert!(model.sigma2().is_finite());
    }

    #[test]
    fn arima_handles_missing_values() {
        let series = ar1_series(0.7, 200, 13);
        let mut values = series.values().to_vec();
        values[50] = f64::NAN;
        values[120] = f64::NAN;

        let model = ArimaEstimator::new(ModelSpec::new(1, 0, 0).unwrap())
            .fit(&make_series(values))
            .unwrap();
        assert_eq!(model.nobs(), 198);
        assert!(model.residuals()[50].is_nan());
        assert!((model.ar()[0] - 0.7).abs() < 0.15);
    }

    #[test]
    fn arima_rejects_short_series() {
        let spec = ModelSpec::new(2, 1, 2).unwrap();
        // needs n > 2 + 2 + 1 + 1 = 6
        let result = ArimaEstimator::new(spec).fit(&make_series(vec![1.0, 2.0, 1.5, 2.5, 2.0, 3.0]));
        assert!(matches!(
            result,
            Err(AnalysisError::InsufficientData { needed: 7, got: 6 })
        ));
    }

    #[test]
    fn arima_constant_series_does_not_converge() {
        let result = ArimaEstimator::new(ModelSpec::new(1, 0, 0).unwrap())
            .fit(&make_series(vec![3.0; 40]));
        assert!(matches!(result, Err(AnalysisError::Convergence(_))));
    }

    #[test]
    fn arima_white_noise_model_without_parameters() {
        let series = ar1_series(0.0, 100, 2);
        let model = ArimaEstimator::new(ModelSpec::new(0, 1, 0).unwrap())
            .fit(&series)
            .unwrap();
        assert!(model.ar().is_empty());
        assert_eq!(model.iterations(), 0);
        assert!(model.converged());
    }
}

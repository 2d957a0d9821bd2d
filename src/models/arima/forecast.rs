//! Multi-step forecasts with prediction intervals.

use crate::core::{ForecastPoint, ForecastResult};
use crate::error::{AnalysisError, Result};
use crate::models::arima::diff::{integrate, integration_weights, seasonal_difference, seasonal_integrate};
use crate::models::arima::model::FittedModel;
use crate::models::Forecaster;
use crate::utils::quantile_normal;

/// Confidence level used when none is given.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Working-scale forecast: means and the error covariance across steps.
#[derive(Debug, Clone)]
pub(crate) struct WorkingForecast {
    pub means: Vec<f64>,
    /// `cov[i][j]` is the covariance of the step-`i` and step-`j` errors.
    pub cov: Vec<Vec<f64>>,
}

impl FittedModel {
    /// Forecast `horizon` steps past the end of the training series.
    ///
    /// # Errors
    /// - `InvalidHorizon` when `horizon == 0`.
    /// - `InvalidParameter` when `level` is not in (0, 1).
    /// - `InvalidSeries` when the values that seed re-integration are missing.
    /// - Frequency errors of the training series.
    pub fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(AnalysisError::InvalidHorizon(0));
        }
        if !(level > 0.0 && level < 1.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {}",
                level
            )));
        }

        let frequency = self.series.require_frequency()?;
        let last = self
            .series
            .last_timestamp()
            .ok_or_else(|| AnalysisError::InvalidSeries("empty training series".to_string()))?;

        let y = self.series.values();
        let loss = self.spec.differencing_loss();
        if y[y.len().saturating_sub(loss)..].iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidSeries(format!(
                "the last {} value(s) must be observed to integrate the forecast",
                loss
            )));
        }

        let working = self.working_forecast(horizon);
        let (d, seasonal_d, period) = (self.spec.d, self.spec.seasonal_d(), self.spec.period());

        let seasonal_history = seasonal_difference(y, seasonal_d, period);
        let partial = integrate(&working.means, &seasonal_history, d);
        let points = seasonal_integrate(&partial, y, seasonal_d, period);

        let weights = integration_weights(d, seasonal_d, period, horizon);
        let z = quantile_normal((1.0 + level) / 2.0);

        let mut result = Vec::with_capacity(horizon);
        for (h, point) in points.into_iter().enumerate() {
            let mut variance = 0.0;
            for k in 0..=h {
                for l in 0..=h {
                    variance += weights[k] * weights[l] * working.cov[h - k][h - l];
                }
            }
            let half_width = z * variance.max(0.0).sqrt();
            let steps = u32::try_from(h + 1).map_err(|_| AnalysisError::InvalidHorizon(horizon as i64))?;

            result.push(ForecastPoint {
                timestamp: frequency.advance(last, steps)?,
                point,
                lower: point - half_width,
                upper: point + half_width,
            });
        }

        log::debug!("{} forecast {} step(s) at level {}", self.spec, horizon, level);
        Ok(ForecastResult::new(result, level))
    }

    /// [`forecast`](Self::forecast) for a signed horizon as received at an
    /// untyped boundary; non-positive horizons are `InvalidHorizon`.
    pub fn forecast_signed(&self, horizon: i64, level: f64) -> Result<ForecastResult> {
        match usize::try_from(horizon) {
            Ok(h) if h > 0 => self.forecast(h, level),
            _ => Err(AnalysisError::InvalidHorizon(horizon)),
        }
    }

    /// Project the filtered state `horizon` steps ahead.
    pub(crate) fn working_forecast(&self, horizon: usize) -> WorkingForecast {
        let model = self.state_space();
        let mut a = model.transition(&self.filtered_state);
        let mut p = model.predict_covariance(&self.filtered_covariance);

        let mut means = Vec::with_capacity(horizon);
        let mut columns = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            means.push(self.coefficients.mean + a[0]);
            columns.push(p.iter().map(|row| row[0]).collect::<Vec<f64>>());
            a = model.transition(&a);
            p = model.predict_covariance(&p);
        }

        // Cov(e_j, e_i) = Z T^{j-i} P_i Z' for j >= i
        let mut cov = vec![vec![0.0; horizon]; horizon];
        for (i, column) in columns.into_iter().enumerate() {
            let mut propagated = column;
            for j in i..horizon {
                let value = propagated[0] * self.sigma2;
                cov[i][j] = value;
                cov[j][i] = value;
                propagated = model.transition(&propagated);
            }
        }

        WorkingForecast { means, cov }
    }
}

impl Forecaster for FittedModel {
    fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        FittedModel::forecast(self, horizon, level)
    }

    fn residuals(&self) -> &[f64] {
        FittedModel::residuals(self)
    }

    fn name(&self) -> String {
        self.spec.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Frequency, TimeSeries};
    use crate::models::arima::simulate::simulate_arma;
    use crate::models::arima::{ArimaConfig, ArimaEstimator, ModelSpec};
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn daily(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        TimeSeries::new(timestamps, values).unwrap()
    }

    fn random_walk(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        simulate_arma(&[], &[], n, 1.0, &mut rng)
            .into_iter()
            .scan(100.0, |level, e| {
                *level += e;
                Some(*level)
            })
            .collect()
    }

    #[test]
    fn ar1_one_step_is_phi_times_last_value() {
        let mut rng = StdRng::seed_from_u64(4);
        let series = daily(simulate_arma(&[0.6], &[], 300, 1.0, &mut rng));
        let model = ArimaEstimator::new(ModelSpec::new(1, 0, 0).unwrap())
            .with_config(ArimaConfig::new().with_mean(false))
            .fit(&series)
            .unwrap();

        let forecast = model.forecast(3, 0.95).unwrap();
        let last = *series.values().last().unwrap();
        let phi = model.ar()[0];
        assert_relative_eq!(forecast.point()[0], phi * last, epsilon = 1e-10);
        assert_relative_eq!(forecast.point()[2], phi.powi(3) * last, epsilon = 1e-10);

        // One-step variance is σ²
        let width = forecast.points()[0].width();
        assert_relative_eq!(width, 2.0 * 1.959964 * model.sigma2().sqrt(), epsilon = 1e-4);
    }

    #[test]
    fn random_walk_forecast_is_flat_with_growing_intervals() {
        let values = random_walk(150, 12);
        let last = *values.last().unwrap();
        let model = ArimaEstimator::new(ModelSpec::new(0, 1, 0).unwrap())
            .fit(&daily(values))
            .unwrap();

        let forecast = model.forecast(10, 0.9).unwrap();
        let sigma = model.sigma2().sqrt();
        let z = quantile_normal(0.95);
        for (h, point) in forecast.iter().enumerate() {
            assert_relative_eq!(point.point, last, epsilon = 1e-10);
            assert_relative_eq!(point.width(), 2.0 * z * sigma * ((h + 1) as f64).sqrt(), epsilon = 1e-8);
        }
    }

    #[test]
    fn timestamps_follow_the_series_frequency() {
        let base = Utc.with_ymd_and_hms(2021, 1, 31, 0, 0, 0).unwrap();
        let month_end = Frequency::Months {
            months: 1,
            month_end: true,
        };
        let timestamps: Vec<_> = (0..36)
            .map(|k| month_end.advance(base, k).unwrap())
            .collect();
        let series = TimeSeries::new(timestamps, random_walk(36, 3)).unwrap();

        let model = ArimaEstimator::new(ModelSpec::new(0, 1, 0).unwrap())
            .fit(&series)
            .unwrap();
        let forecast = model.forecast(2, 0.95).unwrap();

        let stamps = forecast.timestamps();
        assert_eq!(stamps[0], Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap());
        assert_eq!(stamps[1], Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn seasonal_random_walk_repeats_last_season() {
        let mut rng = StdRng::seed_from_u64(8);
        let noise = simulate_arma(&[], &[], 48, 0.1, &mut rng);
        let values: Vec<f64> = (0..48)
            .map(|t| [5.0, 9.0, 2.0, 7.0][t % 4] + noise[t])
            .collect();
        let spec = ModelSpec::new(0, 0, 0).unwrap().with_seasonal(0, 1, 0, 4).unwrap();
        let model = ArimaEstimator::new(spec).fit(&daily(values.clone())).unwrap();

        let forecast = model.forecast(8, 0.95).unwrap();
        for h in 0..8 {
            assert_relative_eq!(forecast.point()[h], values[44 + h % 4], epsilon = 1e-10);
        }
        // Second season carries twice the variance of the first
        let w1 = forecast.points()[0].width();
        let w2 = forecast.points()[4].width();
        assert_relative_eq!(w2 / w1, 2f64.sqrt(), epsilon = 1e-8);
    }

    #[test]
    fn rejects_bad_horizon_and_level() {
        let model = ArimaEstimator::new(ModelSpec::new(0, 1, 0).unwrap())
            .fit(&daily(random_walk(30, 1)))
            .unwrap();

        assert_eq!(model.forecast(0, 0.95), Err(AnalysisError::InvalidHorizon(0)));
        assert_eq!(model.forecast_signed(-3, 0.95), Err(AnalysisError::InvalidHorizon(-3)));
        assert!(matches!(model.forecast(5, 1.0), Err(AnalysisError::InvalidParameter(_))));
        assert!(matches!(model.forecast(5, 0.0), Err(AnalysisError::InvalidParameter(_))));
        assert_eq!(model.forecast_signed(4, 0.8).unwrap().horizon(), 4);
    }

    #[test]
    fn missing_seed_value_is_rejected() {
        let mut values = random_walk(40, 6);
        values[39] = f64::NAN;
        let model = ArimaEstimator::new(ModelSpec::new(0, 1, 0).unwrap())
            .fit(&daily(values))
            .unwrap();
        assert!(matches!(model.forecast(3, 0.95), Err(AnalysisError::InvalidSeries(_))));
    }

    #[test]
    fn wider_level_gives_wider_interval() {
        let model = ArimaEstimator::new(ModelSpec::new(0, 1, 0).unwrap())
            .fit(&daily(random_walk(60, 2)))
            .unwrap();
        let narrow = model.forecast(1, 0.8).unwrap();
        let wide = model.forecast(1, 0.99).unwrap();
        assert!(wide.points()[0].width() > narrow.points()[0].width());
        assert_eq!(wide.level(), 0.99);
    }
}

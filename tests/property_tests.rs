//! Property-based tests for decomposition, stationarity testing, differencing
//! and forecasting.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated time series data.

use anofox_tsa::core::TimeSeries;
use anofox_tsa::models::arima::{difference, undifference, ArimaEstimator, ModelSpec};
use anofox_tsa::seasonality::Decomposer;
use anofox_tsa::validation::StationarityTester;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

/// Create a TimeSeries from a vector of values.
fn make_ts(values: &[f64]) -> TimeSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let timestamps: Vec<_> = (0..values.len())
        .map(|i| base + Duration::hours(i as i64))
        .collect();
    TimeSeries::new(timestamps, values.to_vec()).unwrap()
}

/// Strategy for generating valid time series values.
/// Adds small variation to avoid all-constant series.
fn valid_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(1.0..1000.0_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.001;
            }
            v
        })
    })
}

/// Strategy for generating random walks.
fn random_walk_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(-5.0..5.0_f64, len).prop_map(|steps| {
            steps
                .iter()
                .scan(100.0, |level, s| {
                    *level += s;
                    Some(*level)
                })
                .collect()
        })
    })
}

// =============================================================================
// Property: Decomposition components reconstruct the observed series
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn decomposition_reconstructs_observed(
        values in valid_values_strategy(30, 120),
        period in 2usize..13
    ) {
        let result = Decomposer::new(period).decompose(&make_ts(&values)).unwrap();

        for i in 0..values.len() {
            let rebuilt = result.trend[i] + result.seasonal[i] + result.residual[i];
            prop_assert!((rebuilt - values[i]).abs() < 1e-8 * values[i].abs().max(1.0));
        }
    }

    #[test]
    fn seasonal_component_sums_to_zero_over_any_period(
        values in valid_values_strategy(30, 120),
        period in 2usize..13,
        start in 0usize..10
    ) {
        let result = Decomposer::new(period).decompose(&make_ts(&values)).unwrap();
        let window = &result.seasonal[start..start + period];
        let total: f64 = window.iter().sum();
        prop_assert!(total.abs() < 1e-8 * values.iter().fold(1.0_f64, |m, v| m.max(v.abs())));
    }
}

// =============================================================================
// Property: Stationarity testing is a pure function
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn stationarity_test_is_idempotent(values in valid_values_strategy(30, 150)) {
        let series = make_ts(&values);
        let tester = StationarityTester::default();

        let first = tester.test(&series).unwrap();
        let second = tester.test(&series).unwrap();

        prop_assert_eq!(first.statistic.to_bits(), second.statistic.to_bits());
        prop_assert_eq!(first.p_value.to_bits(), second.p_value.to_bits());
        prop_assert_eq!(first.used_lag, second.used_lag);
        prop_assert!((0.0..=1.0).contains(&first.p_value));
    }
}

// =============================================================================
// Property: Differencing round-trip
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn differencing_round_trip(
        values in valid_values_strategy(10, 60),
        d in 0usize..4
    ) {
        let rebuilt = undifference(&difference(&values, d), &values[..d]);

        prop_assert_eq!(rebuilt.len(), values.len());
        for (a, b) in rebuilt.iter().zip(&values) {
            prop_assert!((a - b).abs() < 1e-7 * b.abs().max(1.0));
        }
    }
}

// =============================================================================
// Property: Random-walk forecast intervals widen with the horizon
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(25))]

    #[test]
    fn random_walk_interval_width_non_decreasing(
        values in random_walk_strategy(20, 80),
        horizon in 1usize..15
    ) {
        let model = ArimaEstimator::new(ModelSpec::new(0, 1, 0).unwrap())
            .fit(&make_ts(&values))
            .unwrap();
        let forecast = model.forecast(horizon, 0.95).unwrap();

        prop_assert_eq!(forecast.horizon(), horizon);
        let widths: Vec<f64> = forecast.iter().map(|p| p.width()).collect();
        for w in widths.windows(2) {
            prop_assert!(w[1] >= w[0] - 1e-12);
        }
    }
}

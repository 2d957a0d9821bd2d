//! Differencing and integration utilities for ARIMA models.
//!
//! Missing values (`NaN`) propagate through differencing.

use crate::models::arima::polynomial::multiply;

/// Apply differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
///
/// # Returns
/// The differenced series, `d` values shorter than the input.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return vec![];
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing `(1 - B^period)^d`.
///
/// # Returns
/// The seasonally differenced series, `d * period` values shorter.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return vec![];
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Integrate (reverse differencing) values that continue a differenced series.
///
/// # Arguments
/// * `differenced` - Future values on the `d`-times differenced scale
/// * `original` - The undifferenced history they continue
/// * `d` - Differencing order used
///
/// # Returns
/// The continuation of `original`.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        // Last value of the history at this differencing level
        let init_value = difference(original, level).last().copied().unwrap_or(0.0);

        let mut cumsum = init_value;
        for value in result.iter_mut() {
            cumsum += *value;
            *value = cumsum;
        }
    }

    result
}

/// Reverse seasonal differencing `(1 - B^period)^d` for values that continue
/// `original`.
pub fn seasonal_integrate(differenced: &[f64], original: &[f64], d: usize, period: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();
    if period == 0 {
        return result;
    }

    for level in (0..d).rev() {
        let mut extended = seasonal_difference(original, level, period);
        let start = extended.len();
        for &value in &result {
            let lagged = extended
                .len()
                .checked_sub(period)
                .map_or(0.0, |i| extended[i]);
            extended.push(value + lagged);
        }
        result = extended.split_off(start);
    }

    result
}

/// Rebuild a series from its `d`-th difference and its first `d` values.
///
/// `undifference(&difference(y, d), &y[..d]) == y` up to rounding.
pub fn undifference(differenced: &[f64], head: &[f64]) -> Vec<f64> {
    let d = head.len();
    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        let seed = difference(&head[..=level], level)[0];
        let mut rebuilt = Vec::with_capacity(result.len() + 1);
        rebuilt.push(seed);
        let mut cumsum = seed;
        for value in &result {
            cumsum += value;
            rebuilt.push(cumsum);
        }
        result = rebuilt;
    }

    result
}

/// Coefficients of `(1 - B)^d (1 - B^period)^seasonal_d`, constant term first.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = multiply(&poly, &seasonal);
        }
    }
    poly
}

/// First `count` coefficients of `1 / ((1 - B)^d (1 - B^period)^seasonal_d)`.
///
/// These weights map working-scale forecast errors onto the original scale.
pub fn integration_weights(d: usize, seasonal_d: usize, period: usize, count: usize) -> Vec<f64> {
    let poly = differencing_polynomial(d, seasonal_d, period);
    let mut weights = Vec::with_capacity(count);
    for k in 0..count {
        if k == 0 {
            weights.push(1.0);
            continue;
        }
        let w: f64 = (1..poly.len().min(k + 1))
            .map(|j| -poly[j] * weights[k - j])
            .sum();
        weights.push(w);
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn difference_orders() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 0), series);
        assert_eq!(difference(&series, 1), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
        assert!(difference(&[1.0], 1).is_empty());
    }

    #[test]
    fn difference_propagates_missing() {
        let result = difference(&[1.0, f64::NAN, 3.0, 4.0], 1);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_eq!(result[2], 1.0);
    }

    #[test]
    fn seasonal_difference_basic() {
        // Quarterly data: each quarter up by 10 year on year
        let series = vec![100.0, 120.0, 80.0, 90.0, 110.0, 130.0, 90.0, 100.0];
        assert_eq!(seasonal_difference(&series, 1, 4), vec![10.0; 4]);
        assert_eq!(seasonal_difference(&series, 0, 4), series);
        assert!(seasonal_difference(&series, 2, 4).is_empty());
    }

    #[test]
    fn integrate_continues_history() {
        let original = vec![10.0, 12.0, 15.0, 19.0, 24.0];
        let integrated = integrate(&[6.0, 7.0], &original, 1);
        assert_relative_eq!(integrated[0], 30.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 37.0, epsilon = 1e-10);
    }

    #[test]
    fn integrate_order_2_continues_quadratic() {
        // Squares: second difference is constant 2
        let original: Vec<f64> = (0..6).map(|i| (i * i) as f64).collect();
        let integrated = integrate(&[2.0, 2.0], &original, 2);
        assert_relative_eq!(integrated[0], 36.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 49.0, epsilon = 1e-10);
    }

    #[test]
    fn seasonal_integrate_continues_pattern() {
        let original = vec![100.0, 120.0, 80.0, 90.0, 110.0, 130.0, 90.0, 100.0];
        let future = seasonal_integrate(&[10.0, 10.0, 10.0, 10.0, 10.0], &original, 1, 4);
        assert_eq!(future, vec![120.0, 140.0, 100.0, 110.0, 130.0]);
    }

    #[test]
    fn seasonal_integrate_order_2() {
        let original: Vec<f64> = (0..12).map(|i| ((i % 3) * 10 + i * i) as f64).collect();
        let mut full = original.clone();
        full.extend((12..15).map(|i| ((i % 3) * 10 + i * i) as f64));

        let dd = seasonal_difference(&full, 2, 3);
        let future_diff = &dd[dd.len() - 3..];
        let rebuilt = seasonal_integrate(future_diff, &original, 2, 3);
        for (a, b) in rebuilt.iter().zip(&full[12..]) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn undifference_round_trip() {
        let series = vec![3.0, -1.0, 4.0, 1.5, 9.0, 2.6, 5.0];
        for d in 0..4 {
            let rebuilt = undifference(&difference(&series, d), &series[..d]);
            assert_eq!(rebuilt.len(), series.len());
            for (a, b) in rebuilt.iter().zip(&series) {
                assert_relative_eq!(a, b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn differencing_polynomial_products() {
        assert_eq!(differencing_polynomial(0, 0, 12), vec![1.0]);
        assert_eq!(differencing_polynomial(2, 0, 12), vec![1.0, -2.0, 1.0]);
        // (1 - B)(1 - B^2) = 1 - B - B^2 + B^3
        assert_eq!(differencing_polynomial(1, 1, 2), vec![1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn integration_weights_for_random_walk_and_double_difference() {
        assert_eq!(integration_weights(1, 0, 0, 4), vec![1.0; 4]);
        assert_eq!(integration_weights(2, 0, 0, 4), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(integration_weights(0, 1, 3, 7), vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(integration_weights(0, 0, 0, 3), vec![1.0, 0.0, 0.0]);
    }
}

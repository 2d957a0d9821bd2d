//! Forecast result structure for holding predictions.

use chrono::{DateTime, Utc};

/// One future step: timestamp, point estimate and interval bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastPoint {
    /// Width of the prediction interval.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Out-of-sample forecast with symmetric prediction intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
    level: f64,
}

impl ForecastResult {
    pub(crate) fn new(points: Vec<ForecastPoint>, level: f64) -> Self {
        Self { points, level }
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Confidence level of the intervals, e.g. 0.95.
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    /// Point predictions.
    pub fn point(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.point).collect()
    }

    /// Lower interval bounds.
    pub fn lower(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lower).collect()
    }

    /// Upper interval bounds.
    pub fn upper(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.upper).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn forecast_result_exposes_columns() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = vec![
            ForecastPoint {
                timestamp: base + Duration::days(1),
                point: 2.0,
                lower: 1.0,
                upper: 3.0,
            },
            ForecastPoint {
                timestamp: base + Duration::days(2),
                point: 3.0,
                lower: 1.5,
                upper: 4.5,
            },
        ];
        let forecast = ForecastResult::new(points, 0.95);

        assert_eq!(forecast.horizon(), 2);
        assert!(!forecast.is_empty());
        assert_eq!(forecast.point(), vec![2.0, 3.0]);
        assert_eq!(forecast.lower(), vec![1.0, 1.5]);
        assert_eq!(forecast.upper(), vec![3.0, 4.5]);
        assert_eq!(forecast.points()[1].width(), 3.0);
        assert_eq!(forecast.timestamps()[0], base + Duration::days(1));
        assert_eq!(forecast.level(), 0.95);
    }
}

//! TimeSeries data structure for representing temporal data.

use crate::core::Frequency;
use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Utc};

/// A univariate time series with strictly increasing timestamps.
///
/// Missing observations are stored as `NaN`; any non-finite input value is
/// normalised to `NaN` on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    frequency: Option<Frequency>,
    label: Option<String>,
}

impl TimeSeries {
    /// Create a series, validating ordering and inferring the frequency.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(AnalysisError::InvalidSeries(format!(
                "{} timestamps but {} values",
                timestamps.len(),
                values.len()
            )));
        }

        // Validate timestamps are strictly increasing
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(AnalysisError::InvalidSeries(format!(
                    "timestamps must be strictly increasing (position {})",
                    i
                )));
            }
        }

        let values = values
            .into_iter()
            .map(|v| if v.is_finite() { v } else { f64::NAN })
            .collect();
        let frequency = Frequency::infer(&timestamps).ok();

        Ok(Self {
            timestamps,
            values,
            frequency,
            label: None,
        })
    }

    /// Override the inferred frequency.
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Attach a display label (typically the value column name).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get values (`NaN` marks a missing observation).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Frequency, if one could be inferred or was set explicitly.
    pub fn frequency(&self) -> Option<Frequency> {
        self.frequency
    }

    /// Frequency for operations that cannot proceed without one.
    ///
    /// Re-runs inference when none is stored so the caller sees why it failed.
    pub fn require_frequency(&self) -> Result<Frequency> {
        match self.frequency {
            Some(freq) => Ok(freq),
            None => Frequency::infer(&self.timestamps).map_err(|e| match e {
                AnalysisError::InsufficientData { got, .. } => AnalysisError::InvalidSeries(
                    format!("cannot infer a frequency from {} timestamp(s)", got),
                ),
                other => other,
            }),
        }
    }

    /// Check if series has missing values.
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| v.is_nan())
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Non-missing values in order, for routines that ignore gaps.
    pub fn dropna(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| !v.is_nan()).collect()
    }

    /// Extract a slice of the time series.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end || end > self.len() {
            return Err(AnalysisError::InvalidParameter(format!(
                "slice {}..{} out of range for series of length {}",
                start,
                end,
                self.len()
            )));
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            frequency: self.frequency,
            label: self.label.clone(),
        })
    }

    /// Return a copy with linear interpolation for missing values.
    pub fn interpolated(&self, fill_edges: bool) -> TimeSeries {
        TimeSeries {
            timestamps: self.timestamps.clone(),
            values: interpolate_series(&self.values, fill_edges),
            frequency: self.frequency,
            label: self.label.clone(),
        }
    }
}

/// Linear interpolation for a series with NaN values.
pub(crate) fn interpolate_series(values: &[f64], fill_edges: bool) -> Vec<f64> {
    let mut result = values.to_vec();
    let n = result.len();

    let mut i = 0;
    while i < n {
        if !result[i].is_nan() {
            i += 1;
            continue;
        }

        let start = i;
        while i < n && result[i].is_nan() {
            i += 1;
        }
        let end = i;

        let left = if start > 0 {
            Some(result[start - 1])
        } else {
            None
        };
        let right = if end < n { Some(result[end]) } else { None };

        match (left, right) {
            (Some(l), Some(r)) => {
                let segments = (end - start + 1) as f64;
                for (j, idx) in (start..end).enumerate() {
                    let t = (j + 1) as f64 / segments;
                    result[idx] = l + t * (r - l);
                }
            }
            (Some(l), None) if fill_edges => result[start..end].fill(l),
            (None, Some(r)) if fill_edges => result[start..end].fill(r),
            _ => {}
        }
    }

    result
}

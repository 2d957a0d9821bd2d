//! Input validation and normalisation at the boundary with the caller.
//!
//! The presentation layer hands over either raw `(timestamp, value)` pairs or
//! a small table with caller-named columns. The preparer sorts, resolves
//! duplicate timestamps (last occurrence wins), marks non-finite values as
//! missing and infers the sampling frequency.

use crate::core::{Frequency, TimeSeries};
use crate::error::{AnalysisError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Minimum number of observations a prepared series must keep.
pub const MIN_OBSERVATIONS: usize = 2;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// A single column of tabular input.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Timestamps(Vec<DateTime<Utc>>),
    Text(Vec<String>),
    Numeric(Vec<f64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Timestamps(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Numeric(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Named columns as delivered by the caller's loader.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<(String, Column)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a column.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        let name = name.into();
        self.columns.retain(|(n, _)| *n != name);
        self.columns.push((name, column));
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// Builds a validated [`TimeSeries`] from caller data.
#[derive(Debug, Clone, Default)]
pub struct SeriesPreparer {
    label: Option<String>,
    frequency: Option<Frequency>,
}

impl SeriesPreparer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label to attach to the prepared series.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Use a known frequency instead of inferring one.
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Prepare raw `(timestamp, value)` observations in any order.
    pub fn prepare<I>(&self, observations: I) -> Result<TimeSeries>
    where
        I: IntoIterator<Item = (DateTime<Utc>, f64)>,
    {
        let mut rows: Vec<(DateTime<Utc>, f64)> = observations.into_iter().collect();
        let received = rows.len();

        // Stable sort keeps input order among equal timestamps
        rows.sort_by_key(|(ts, _)| *ts);

        let mut deduped: Vec<(DateTime<Utc>, f64)> = Vec::with_capacity(rows.len());
        for (ts, value) in rows {
            match deduped.last_mut() {
                Some(last) if last.0 == ts => last.1 = value,
                _ => deduped.push((ts, value)),
            }
        }

        if deduped.len() < received {
            log::debug!(
                "dropped {} duplicate timestamp(s), keeping the last occurrence",
                received - deduped.len()
            );
        }

        let observed = deduped.iter().filter(|(_, v)| v.is_finite()).count();
        if deduped.len() < MIN_OBSERVATIONS || observed < MIN_OBSERVATIONS {
            return Err(AnalysisError::InvalidSeries(format!(
                "need at least {} observations with values, got {}",
                MIN_OBSERVATIONS, observed
            )));
        }

        let (timestamps, values): (Vec<_>, Vec<_>) = deduped.into_iter().unzip();
        let mut series = TimeSeries::new(timestamps, values)?;

        if let Some(freq) = self.frequency {
            series = series.with_frequency(freq);
        } else if series.frequency().is_none() {
            log::debug!("no regular frequency could be inferred from the timestamps");
        }
        if let Some(label) = &self.label {
            series = series.with_label(label.clone());
        }

        Ok(series)
    }

    /// Prepare a series from two caller-named columns of a table.
    pub fn prepare_table(
        &self,
        table: &Table,
        date_column: &str,
        value_column: &str,
    ) -> Result<TimeSeries> {
        let dates = table.column(date_column).ok_or_else(|| unknown_column(table, date_column))?;
        let values = table
            .column(value_column)
            .ok_or_else(|| unknown_column(table, value_column))?;

        if dates.len() != values.len() {
            return Err(AnalysisError::InvalidSeries(format!(
                "column '{}' has {} rows but '{}' has {}",
                date_column,
                dates.len(),
                value_column,
                values.len()
            )));
        }

        let timestamps = timestamp_column(dates, date_column)?;
        let numbers = value_column_values(values, value_column)?;

        let preparer = match &self.label {
            Some(_) => self.clone(),
            None => self.clone().with_label(value_column),
        };
        preparer.prepare(timestamps.into_iter().zip(numbers))
    }
}

fn unknown_column(table: &Table, name: &str) -> AnalysisError {
    AnalysisError::InvalidSeries(format!(
        "unknown column '{}' (available: {})",
        name,
        table.column_names().join(", ")
    ))
}

fn timestamp_column(column: &Column, name: &str) -> Result<Vec<DateTime<Utc>>> {
    match column {
        Column::Timestamps(ts) => Ok(ts.clone()),
        Column::Text(cells) => cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                parse_timestamp(cell).ok_or_else(|| {
                    AnalysisError::InvalidSeries(format!(
                        "column '{}' row {}: cannot parse '{}' as a date",
                        name, row, cell
                    ))
                })
            })
            .collect(),
        Column::Numeric(_) => Err(AnalysisError::InvalidSeries(format!(
            "column '{}' is numeric, expected dates",
            name
        ))),
    }
}

fn value_column_values(column: &Column, name: &str) -> Result<Vec<f64>> {
    match column {
        Column::Numeric(values) => Ok(values.clone()),
        Column::Text(cells) => cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                let trimmed = cell.trim();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") {
                    return Ok(f64::NAN);
                }
                trimmed.parse::<f64>().map_err(|_| {
                    AnalysisError::InvalidSeries(format!(
                        "column '{}' row {}: '{}' is not numeric",
                        name, row, cell
                    ))
                })
            })
            .collect(),
        Column::Timestamps(_) => Err(AnalysisError::InvalidSeries(format!(
            "column '{}' holds dates, expected numbers",
            name
        ))),
    }
}

/// Parse the date formats commonly found in exported spreadsheets.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    // Year-month, e.g. "2024-03"
    NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

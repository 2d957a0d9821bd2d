//! Sampling frequency inferred from timestamp spacing.

use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use std::collections::HashMap;
use std::fmt;

/// Regular step between consecutive observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// Constant elapsed time, e.g. hourly, daily or weekly data.
    Fixed(Duration),
    /// Whole calendar months (1 = monthly, 3 = quarterly, 12 = yearly).
    ///
    /// With `month_end` set every step lands on the last day of the month.
    Months { months: u32, month_end: bool },
}

impl Frequency {
    /// Hourly spacing.
    pub fn hourly() -> Self {
        Frequency::Fixed(Duration::hours(1))
    }

    /// Daily spacing.
    pub fn daily() -> Self {
        Frequency::Fixed(Duration::days(1))
    }

    /// Weekly spacing.
    pub fn weekly() -> Self {
        Frequency::Fixed(Duration::weeks(1))
    }

    /// Monthly spacing anchored on the day of month of the series.
    pub fn monthly() -> Self {
        Frequency::Months {
            months: 1,
            month_end: false,
        }
    }

    /// Quarterly spacing.
    pub fn quarterly() -> Self {
        Frequency::Months {
            months: 3,
            month_end: false,
        }
    }

    /// Yearly spacing.
    pub fn yearly() -> Self {
        Frequency::Months {
            months: 12,
            month_end: false,
        }
    }

    /// Move `timestamp` forward by `steps` periods.
    pub fn advance(&self, timestamp: DateTime<Utc>, steps: u32) -> Result<DateTime<Utc>> {
        let overflow = || {
            AnalysisError::InvalidParameter(format!(
                "advancing {} by {} steps of {} overflows the calendar",
                timestamp, steps, self
            ))
        };

        match *self {
            Frequency::Fixed(step) => {
                let steps = i32::try_from(steps).map_err(|_| overflow())?;
                let offset = step.checked_mul(steps).ok_or_else(overflow)?;
                timestamp.checked_add_signed(offset).ok_or_else(overflow)
            }
            Frequency::Months { months, month_end } => {
                let total = months.checked_mul(steps).ok_or_else(overflow)?;
                if !month_end {
                    return timestamp
                        .checked_add_months(Months::new(total))
                        .ok_or_else(overflow);
                }
                let first = NaiveDate::from_ymd_opt(timestamp.year(), timestamp.month(), 1)
                    .ok_or_else(overflow)?;
                let last_day = first
                    .checked_add_months(Months::new(total + 1))
                    .and_then(|d| d.pred_opt())
                    .ok_or_else(overflow)?;
                Ok(last_day.and_time(timestamp.time()).and_utc())
            }
        }
    }

    /// Infer the frequency from strictly increasing timestamps.
    ///
    /// Month-aligned timestamps (same day of month and time of day, or all
    /// month ends) yield [`Frequency::Months`] with the modal month step;
    /// anything else yields [`Frequency::Fixed`] with the modal spacing.
    /// Two or more equally common spacings are reported as
    /// [`AnalysisError::AmbiguousFrequency`].
    pub fn infer(timestamps: &[DateTime<Utc>]) -> Result<Self> {
        if timestamps.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                needed: 2,
                got: timestamps.len(),
            });
        }

        if let Some(freq) = infer_calendar_months(timestamps)? {
            log::debug!("inferred calendar frequency {}", freq);
            return Ok(freq);
        }

        let deltas: Vec<i64> = timestamps
            .windows(2)
            .map(|w| (w[1] - w[0]).num_seconds())
            .collect();
        let modal = unique_mode(&deltas, |secs| {
            Frequency::Fixed(Duration::seconds(secs)).to_string()
        })?;

        if modal <= 0 {
            return Err(AnalysisError::InvalidSeries(
                "timestamps must be strictly increasing".to_string(),
            ));
        }

        let freq = Frequency::Fixed(Duration::seconds(modal));
        log::debug!("inferred fixed frequency {}", freq);
        Ok(freq)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Frequency::Fixed(step) => {
                let secs = step.num_seconds();
                if secs != 0 && secs % 86_400 == 0 {
                    write!(f, "{}D", secs / 86_400)
                } else if secs != 0 && secs % 3_600 == 0 {
                    write!(f, "{}h", secs / 3_600)
                } else if secs != 0 && secs % 60 == 0 {
                    write!(f, "{}min", secs / 60)
                } else {
                    write!(f, "{}s", secs)
                }
            }
            Frequency::Months { months, month_end } => {
                write!(f, "{}M{}", months, if month_end { "E" } else { "S" })
            }
        }
    }
}

fn is_month_end(ts: &DateTime<Utc>) -> bool {
    ts.date_naive()
        .succ_opt()
        .map(|next| next.month() != ts.month())
        .unwrap_or(true)
}

fn month_index(ts: &DateTime<Utc>) -> i64 {
    ts.year() as i64 * 12 + ts.month0() as i64
}

/// Month step when every consecutive pair is calendar-month aligned.
fn infer_calendar_months(timestamps: &[DateTime<Utc>]) -> Result<Option<Frequency>> {
    let all_month_end = timestamps.iter().all(is_month_end);
    let mut steps = Vec::with_capacity(timestamps.len() - 1);

    for w in timestamps.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        let aligned = a.time() == b.time() && (a.day() == b.day() || all_month_end);
        let step = month_index(b) - month_index(a);
        if !aligned || step < 1 {
            return Ok(None);
        }
        steps.push(step);
    }

    let months = unique_mode(&steps, |m| format!("{}M", m))?;
    Ok(Some(Frequency::Months {
        months: months as u32,
        month_end: all_month_end,
    }))
}

/// Most common value; ties are an ambiguity error.
fn unique_mode(values: &[i64], describe: impl Fn(i64) -> String) -> Result<i64> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &v in values {
        *counts.entry(v).or_insert(0) += 1;
    }

    let best = counts.values().copied().max().ok_or_else(|| {
        AnalysisError::InvalidSeries("no timestamp spacing to infer a frequency from".to_string())
    })?;

    let mut tied: Vec<i64> = counts
        .iter()
        .filter(|(_, &c)| c == best)
        .map(|(&v, _)| v)
        .collect();
    tied.sort_unstable();

    if tied.len() > 1 {
        let names: Vec<String> = tied.into_iter().map(describe).collect();
        return Err(AnalysisError::AmbiguousFrequency(format!(
            "spacings {} each occur {} times",
            names.join(", "),
            best
        )));
    }

    Ok(tied[0])
}

//! Core data structures: series, frequency, input preparation and forecasts.

mod forecast;
mod frequency;
pub mod preparer;
mod time_series;

pub use forecast::{ForecastPoint, ForecastResult};
pub use frequency::Frequency;
pub use preparer::{Column, SeriesPreparer, Table};
pub use time_series::TimeSeries;
pub(crate) use time_series::interpolate_series;

//! Train/test splitting for held-out evaluation

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};

/// A time-ordered partition of a series
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Everything before the held-out window
    pub train: TimeSeries,
    /// The last `period` records
    pub test: TimeSeries,
}

/// Hold out the last `period` records of `series`.
///
/// Requires `0 < period < series.len()`. Order is preserved; nothing is shuffled.
pub fn split(series: &TimeSeries, period: usize) -> Result<Split> {
    let len = series.len();
    if period == 0 || period >= len {
        return Err(ForecastError::InvalidHorizon { period, len });
    }

    let boundary = len - period;
    Ok(Split {
        train: series.slice(0..boundary)?,
        test: series.slice(boundary..len)?,
    })
}

//! Lagged-target feature rows shared by the tree ensembles

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};

/// Fewest training records a lag-based strategy accepts
pub(crate) const MIN_RECORDS: usize = 3;

/// Number of lags to use, leaving at least two thirds of the rows for fitting
pub(crate) fn lag_count(len: usize, max_lags: usize) -> usize {
    max_lags.min(len / 3).max(1)
}

/// Feature row `[y(t-1), .., y(t-lags), regressors(t)..]`; `history` ends at `t-1`
pub(crate) fn feature_row(history: &[f64], lags: usize, regressors: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(lags + regressors.len());
    row.extend(history.iter().rev().take(lags));
    row.extend_from_slice(regressors);
    row
}

/// Supervised rows for every record that has a full lag window
pub(crate) fn design(series: &TimeSeries, lags: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let targets = series.targets();
    let records = series.records();

    (lags..records.len())
        .map(|t| {
            (
                feature_row(&targets[..t], lags, &records[t].regressors),
                targets[t],
            )
        })
        .unzip()
}

/// Roll a one-step model forward `horizon` times, feeding predictions back as lags.
///
/// Regressors are held at their last observed values.
pub(crate) fn recursive_forecast<F>(
    train: &TimeSeries,
    lags: usize,
    horizon: usize,
    mut predict: F,
) -> Result<Vec<f64>>
where
    F: FnMut(&[f64]) -> Result<f64>,
{
    let mut history = train.targets();
    let regressors = train
        .records()
        .last()
        .map(|r| r.regressors.clone())
        .ok_or_else(|| ForecastError::DataAccess("Training series is empty".to_string()))?;

    let mut forecast = Vec::new();
    for _ in 0..horizon {
        let row = feature_row(&history, lags, &regressors);
        let value = predict(&row)?;
        history.push(value);
        forecast.push(value);
    }
    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        TimeSeries::from_values(timestamps, values.to_vec()).unwrap()
    }

    #[test]
    fn test_lag_count_bounds() {
        assert_eq!(lag_count(3, 7), 1);
        assert_eq!(lag_count(12, 7), 4);
        assert_eq!(lag_count(100, 7), 7);
        assert_eq!(lag_count(100, 0), 1);
    }

    #[test]
    fn test_design_rows_are_most_recent_first() {
        let (x, y) = design(&series(&[1.0, 2.0, 3.0, 4.0]), 2);

        assert_eq!(x, vec![vec![2.0, 1.0], vec![3.0, 2.0]]);
        assert_eq!(y, vec![3.0, 4.0]);
    }

    #[test]
    fn test_recursive_forecast_feeds_back_predictions() {
        // Persistence model: next value equals the most recent lag plus one
        let out = recursive_forecast(&series(&[1.0, 2.0, 3.0]), 1, 3, |row| Ok(row[0] + 1.0)).unwrap();
        assert_eq!(out, vec![4.0, 5.0, 6.0]);
    }
}

//! # forecast_bench
//!
//! `forecast_bench` bundles the forecasting workspace: numeric kernels from
//! [`series_math`] and the strategies, evaluation harness and data access of
//! [`forecast_eval`].
//!
//! ## Example
//!
//! ```
//! use chrono::{Duration, NaiveDate};
//! use forecast_bench::{split, TimeSeries};
//!
//! let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let timestamps = (0..10).map(|d| start + Duration::days(d)).collect();
//! let values = (0..10).map(|d| d as f64).collect();
//! let series = TimeSeries::from_values(timestamps, values).unwrap();
//!
//! let held_out = split(&series, 3).unwrap();
//! assert_eq!(held_out.train.len(), 7);
//! assert_eq!(held_out.test.len(), 3);
//! ```

pub use forecast_eval;
pub use series_math;

pub use forecast_eval::{
    split, CsvStore, EvaluationHarness, EvaluationReport, ForecastDispatcher, ForecastError,
    ForecastPoint, ForecastResult, MemoryStore, SeriesLoader, SeriesSpec, Split, Store,
    StrategyAdapter, StrategyConfig, StrategyKind, StrategyOutcome, StrategyRegistry, TimeSeries,
    NO_RECOMMENDATION,
};

/// Names of the built-in strategies in declaration order.
///
/// # Examples
///
/// ```
/// assert_eq!(forecast_bench::strategy_names(), vec!["s1", "s2", "s3"]);
/// ```
pub fn strategy_names() -> Vec<&'static str> {
    StrategyKind::ALL.iter().map(|kind| kind.name()).collect()
}

//! Error types for the forecast_eval crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the forecast_eval crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Table or column missing, or the read/write against the store failed
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Horizon not usable for a series of this length
    #[error("Invalid horizon: period {period} is not valid for a series of length {len}")]
    InvalidHorizon { period: usize, len: usize },

    /// Horizon beyond the configured limit for production forecasts
    #[error("Invalid horizon: period {period} exceeds the maximum of {max}")]
    HorizonTooLong { period: usize, max: usize },

    /// An explicit strategy selection named no strategies
    #[error("At least one strategy must be selected")]
    EmptySelection,

    /// A strategy could not be fitted to its training data
    #[error("Strategy '{strategy}' failed to fit: {reason}")]
    StrategyFit { strategy: String, reason: String },

    /// A fitted strategy could not produce its projection
    #[error("Strategy '{strategy}' failed to predict: {reason}")]
    StrategyPredict { strategy: String, reason: String },

    /// A strategy did not finish inside the configured budget
    #[error("Strategy '{strategy}' timed out after {seconds:.1}s")]
    StrategyTimeout { strategy: String, seconds: f64 },

    /// Actual and predicted sequences cannot be compared
    #[error("Score input mismatch: {actual} actual values vs {predicted} predicted values")]
    ScoreInputMismatch { actual: usize, predicted: usize },

    /// Requested strategy is not in the registry
    #[error("Unknown strategy '{0}'")]
    UnknownStrategy(String),

    /// Strategy configuration could not be read
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForecastError {
    /// True when the caller supplied bad input (bad table, column, horizon or strategy)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ForecastError::DataAccess(_)
                | ForecastError::InvalidHorizon { .. }
                | ForecastError::HorizonTooLong { .. }
                | ForecastError::EmptySelection
                | ForecastError::UnknownStrategy(_)
        )
    }

    pub(crate) fn fit(strategy: &str, reason: impl ToString) -> Self {
        ForecastError::StrategyFit {
            strategy: strategy.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn predict(strategy: &str, reason: impl ToString) -> Self {
        ForecastError::StrategyPredict {
            strategy: strategy.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::DataAccess(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::DataAccess(err.to_string())
    }
}

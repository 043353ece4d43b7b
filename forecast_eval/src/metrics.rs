//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};

/// Root-mean-squared error between time-aligned `actual` and `predicted` values
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ScoreInputMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }

    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;

    Ok(mse.sqrt())
}

//! Gradient-boosted regression trees

use super::features::{design, lag_count, recursive_forecast, MIN_RECORDS};
use super::{ForecastResult, StrategyAdapter, StrategyInput};
use crate::config::BoostingParams;
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use series_math::{RegressionTree, TreeParams};

const NAME: &str = "s3";

/// Squared-loss boosting of shallow trees over lagged features.
///
/// Growth hints are ignored.
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    params: BoostingParams,
}

struct BoostedModel {
    base: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl BoostedModel {
    fn predict(&self, row: &[f64]) -> Result<f64> {
        let mut value = self.base;
        for tree in &self.trees {
            value += self.learning_rate * tree.predict(row).map_err(|e| ForecastError::predict(NAME, e))?;
        }
        Ok(value)
    }
}

impl GradientBoosting {
    pub fn new(params: BoostingParams) -> Self {
        Self { params }
    }

    fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<BoostedModel> {
        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: None,
        };
        // Every feature is considered, so the rng is never drawn from
        let mut rng = StdRng::seed_from_u64(0);

        let base = y.iter().sum::<f64>() / y.len() as f64;
        let mut fitted = vec![base; y.len()];
        let mut trees = Vec::with_capacity(self.params.n_rounds);

        for _ in 0..self.params.n_rounds {
            let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(t, f)| t - f).collect();
            if residuals.iter().all(|r| r.abs() < 1e-12) {
                break;
            }

            let tree = RegressionTree::fit(x, &residuals, &tree_params, &mut rng)
                .map_err(|e| ForecastError::fit(NAME, e))?;
            for (value, row) in fitted.iter_mut().zip(x) {
                *value += self.params.learning_rate
                    * tree.predict(row).map_err(|e| ForecastError::fit(NAME, e))?;
            }
            trees.push(tree);
        }

        Ok(BoostedModel {
            base,
            learning_rate: self.params.learning_rate,
            trees,
        })
    }
}

impl StrategyAdapter for GradientBoosting {
    fn name(&self) -> &str {
        NAME
    }

    fn forecast(&self, train: &TimeSeries, input: &StrategyInput) -> Result<ForecastResult> {
        if train.len() < MIN_RECORDS {
            return Err(ForecastError::fit(
                NAME,
                format!(
                    "Need at least {} records, got {}",
                    MIN_RECORDS,
                    train.len()
                ),
            ));
        }
        if !(self.params.learning_rate > 0.0 && self.params.learning_rate <= 1.0) {
            return Err(ForecastError::fit(NAME, "Learning rate must be in (0, 1]"));
        }

        let lags = lag_count(train.len(), self.params.max_lags);
        let (x, y) = design(train, lags);
        let model = self.fit(&x, &y)?;

        let values = recursive_forecast(train, lags, input.period, |row| model.predict(row))?;

        let timestamps = train
            .future_timestamps(input.period)
            .map_err(|e| ForecastError::predict(NAME, e))?;
        ForecastResult::from_values(NAME, timestamps, values, input.period)
    }
}

//! Random forest over lagged target and regressor features

use super::features::{design, lag_count, recursive_forecast, MIN_RECORDS};
use super::{ForecastResult, StrategyAdapter, StrategyInput};
use crate::config::ForestParams;
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use series_math::{RegressionTree, TreeParams};

const NAME: &str = "s2";

/// Bagged regression trees with per-split feature subsampling.
///
/// Deterministic for a fixed seed. Future regressor values are held at their
/// last observation; growth hints are ignored.
#[derive(Debug, Clone)]
pub struct RandomForest {
    params: ForestParams,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }

    fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<Vec<RegressionTree>> {
        let n_features = x.first().map_or(0, Vec::len);
        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: Some(n_features.div_ceil(3).max(1)),
        };

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut trees = Vec::with_capacity(self.params.n_trees);
        for _ in 0..self.params.n_trees {
            let (bx, by): (Vec<Vec<f64>>, Vec<f64>) = (0..x.len())
                .map(|_| {
                    let i = rng.gen_range(0..x.len());
                    (x[i].clone(), y[i])
                })
                .unzip();

            let tree = RegressionTree::fit(&bx, &by, &tree_params, &mut rng)
                .map_err(|e| ForecastError::fit(NAME, e))?;
            trees.push(tree);
        }
        Ok(trees)
    }
}

impl StrategyAdapter for RandomForest {
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
        if self.params.n_trees == 0 {
            return Err(ForecastError::fit(NAME, "Forest must contain at least one tree"));
        }

        let lags = lag_count(train.len(), self.params.max_lags);
        let (x, y) = design(train, lags);
        let trees = self.fit(&x, &y)?;

        let values = recursive_forecast(train, lags, input.period, |row| {
            let mut total = 0.0;
            for tree in &trees {
                total += tree.predict(row).map_err(|e| ForecastError::predict(NAME, e))?;
            }
            Ok(total / trees.len() as f64)
        })?;

        let timestamps = train
            .future_timestamps(input.period)
            .map_err(|e| ForecastError::predict(NAME, e))?;
        ForecastResult::from_values(NAME, timestamps, values, input.period)
    }
}

//! Tunable parameters for the built-in strategies

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of the growth/seasonality curve (s1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParams {
    /// Fourier order of the weekly component (sub-weekly cadences only)
    pub weekly_order: usize,
    /// Fourier order of the yearly component (at least two years of data)
    pub yearly_order: usize,
    /// Ridge penalty on the design matrix
    pub ridge: f64,
    /// Width of the uncertainty band in residual standard deviations
    pub interval_z: f64,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            weekly_order: 3,
            yearly_order: 6,
            ridge: 1e-6,
            interval_z: 1.96,
        }
    }
}

/// Parameters of the random forest (s2)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Upper bound on lagged target features
    pub max_lags: usize,
    /// Seed for bootstrap and feature sampling
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 6,
            min_samples_leaf: 2,
            max_lags: 7,
            seed: 42,
        }
    }
}

/// Parameters of the gradient-boosted trees (s3)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Upper bound on lagged target features
    pub max_lags: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 2,
            max_lags: 7,
        }
    }
}

/// Longest horizon a single forecast may request
pub const DEFAULT_MAX_HORIZON: usize = 10_000;

/// Configuration for every registered strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub growth: GrowthParams,
    pub forest: ForestParams,
    pub boosting: BoostingParams,
    /// Upper bound on `period` for production forecasts
    pub max_horizon: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            growth: GrowthParams::default(),
            forest: ForestParams::default(),
            boosting: BoostingParams::default(),
            max_horizon: DEFAULT_MAX_HORIZON,
        }
    }
}

impl StrategyConfig {
    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ForecastError::Config(e.to_string()))
    }

    /// Read a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

//! Forecasting strategies and the adapter contract they share

use crate::config::StrategyConfig;
use crate::data::{TimeSeries, TIMESTAMP_FORMAT};
use crate::error::{ForecastError, Result};
use crate::store::Store;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod boosting;
mod features;
pub mod forest;
pub mod growth;

pub use boosting::GradientBoosting;
pub use forest::RandomForest;
pub use growth::GrowthCurve;

/// One projected step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    #[serde(serialize_with = "serialize_timestamp")]
    pub ds: NaiveDateTime,
    pub yhat: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yhat_lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yhat_upper: Option<f64>,
}

impl ForecastPoint {
    pub fn new(ds: NaiveDateTime, yhat: f64) -> Self {
        Self {
            ds,
            yhat,
            yhat_lower: None,
            yhat_upper: None,
        }
    }

    pub fn with_interval(mut self, lower: f64, upper: f64) -> Self {
        self.yhat_lower = Some(lower);
        self.yhat_upper = Some(upper);
        self
    }
}

fn serialize_timestamp<S: Serializer>(ds: &NaiveDateTime, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(&ds.format(TIMESTAMP_FORMAT))
}

/// Forecast produced by exactly one strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    strategy: String,
    points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Create a new forecast result; `points` must cover exactly `horizon` steps
    pub fn new(strategy: &str, points: Vec<ForecastPoint>, horizon: usize) -> Result<Self> {
        if points.len() != horizon {
            return Err(ForecastError::predict(
                strategy,
                format!(
                    "Forecast length ({}) doesn't match horizon ({})",
                    points.len(),
                    horizon
                ),
            ));
        }

        Ok(Self {
            strategy: strategy.to_string(),
            points,
        })
    }

    /// Pair timestamps with point predictions
    pub fn from_values(
        strategy: &str,
        timestamps: Vec<NaiveDateTime>,
        values: Vec<f64>,
        horizon: usize,
    ) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::predict(
                strategy,
                format!(
                    "Got {} timestamps for {} predicted values",
                    timestamps.len(),
                    values.len()
                ),
            ));
        }

        let points = timestamps
            .into_iter()
            .zip(values)
            .map(|(ds, yhat)| ForecastPoint::new(ds, yhat))
            .collect();
        Self::new(strategy, points, horizon)
    }

    /// Name of the strategy that produced this forecast
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Point predictions in time order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.yhat).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Everything besides the training series that a strategy may consult
#[derive(Clone)]
pub struct StrategyInput {
    /// Store used for staging by strategies that read their data by table name
    pub store: Arc<dyn Store>,
    /// Growth hints; only the growth curve interprets them
    pub growth_rates: Vec<f64>,
    /// Number of steps to project
    pub period: usize,
}

impl StrategyInput {
    pub fn new(store: Arc<dyn Store>, growth_rates: Vec<f64>, period: usize) -> Self {
        Self {
            store,
            growth_rates,
            period,
        }
    }
}

/// Uniform contract over every forecasting strategy
pub trait StrategyAdapter: Send + Sync {
    /// Registry name of the strategy
    fn name(&self) -> &str;

    /// Fit on `train` and project `input.period` steps past its last record
    fn forecast(&self, train: &TimeSeries, input: &StrategyInput) -> Result<ForecastResult>;
}

/// The closed set of built-in strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Growth curve with seasonality and regressors
    S1,
    /// Random forest over lagged features
    S2,
    /// Gradient-boosted trees over lagged features
    S3,
}

impl StrategyKind {
    /// Declaration order; also the evaluation and tie-break order
    pub const ALL: [StrategyKind; 3] = [StrategyKind::S1, StrategyKind::S2, StrategyKind::S3];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::S1 => "s1",
            StrategyKind::S2 => "s2",
            StrategyKind::S3 => "s3",
        }
    }

    /// Instantiate the adapter for this strategy
    pub fn build(&self, config: &StrategyConfig) -> Arc<dyn StrategyAdapter> {
        match self {
            StrategyKind::S1 => Arc::new(GrowthCurve::new(config.growth.clone())),
            StrategyKind::S2 => Arc::new(RandomForest::new(config.forest.clone())),
            StrategyKind::S3 => Arc::new(GradientBoosting::new(config.boosting.clone())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s1" | "prophet" => Ok(StrategyKind::S1),
            "s2" | "random_forest" => Ok(StrategyKind::S2),
            "s3" | "xgboost" => Ok(StrategyKind::S3),
            _ => Err(ForecastError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Fixed lookup table of adapters, shared by the dispatcher and the harness
#[derive(Clone)]
pub struct StrategyRegistry {
    adapters: Vec<Arc<dyn StrategyAdapter>>,
}

impl StrategyRegistry {
    /// The built-in strategies in declaration order
    pub fn standard(config: &StrategyConfig) -> Self {
        Self {
            adapters: StrategyKind::ALL.iter().map(|kind| kind.build(config)).collect(),
        }
    }

    /// A registry over arbitrary adapters; their order is the declaration order
    pub fn from_adapters(adapters: Vec<Arc<dyn StrategyAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn adapters(&self) -> &[Arc<dyn StrategyAdapter>] {
        &self.adapters
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Look up an adapter by name or by one of the built-in aliases
    pub fn get(&self, name: &str) -> Result<Arc<dyn StrategyAdapter>> {
        let canonical = match self.adapters.iter().find(|a| a.name() == name) {
            Some(adapter) => return Ok(Arc::clone(adapter)),
            None => StrategyKind::from_str(name)?,
        };

        self.adapters
            .iter()
            .find(|a| a.name() == canonical.name())
            .cloned()
            .ok_or_else(|| ForecastError::UnknownStrategy(name.to_string()))
    }

    /// Adapters named in `names`, kept in declaration order; `names` must not be empty
    pub fn select(&self, names: &[String]) -> Result<Vec<Arc<dyn StrategyAdapter>>> {
        if names.is_empty() {
            return Err(ForecastError::EmptySelection);
        }

        let wanted = names
            .iter()
            .map(|name| self.get(name).map(|a| a.name().to_string()))
            .collect::<Result<Vec<_>>>()?;

        Ok(self
            .adapters
            .iter()
            .filter(|a| wanted.iter().any(|w| w == a.name()))
            .cloned()
            .collect())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::standard(&StrategyConfig::default())
    }
}

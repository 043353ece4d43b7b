//! Held-out evaluation of every registered strategy
//!
//! The harness splits a series, runs each strategy on the training prefix,
//! scores the projection against the held-out suffix and recommends the
//! strategy with the lowest RMSE. A failing strategy never stops the others:
//! its error, panic or timeout is recorded in the report as a failure marker.

use crate::data::{SeriesSpec, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::loader::SeriesLoader;
use crate::metrics::rmse;
use crate::split::split;
use crate::store::Store;
use crate::strategies::{ForecastResult, StrategyAdapter, StrategyInput, StrategyRegistry};
use indexmap::IndexMap;
use serde::Serialize;
use std::any::Any;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Recommended strategy when no strategy produced a score
pub const NO_RECOMMENDATION: &str = "none";

/// What happened to one strategy during evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StrategyOutcome {
    /// RMSE over the held-out window
    Scored(f64),
    /// Why the strategy produced no score
    Failed(String),
}

impl StrategyOutcome {
    pub fn score(&self) -> Option<f64> {
        match self {
            StrategyOutcome::Scored(score) => Some(*score),
            StrategyOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            StrategyOutcome::Scored(_) => None,
            StrategyOutcome::Failed(reason) => Some(reason),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StrategyOutcome::Failed(_))
    }
}

/// Per-strategy outcomes in declaration order plus the recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    #[serde(rename = "rmse_scores")]
    outcomes: IndexMap<String, StrategyOutcome>,
    #[serde(rename = "recommended_model")]
    recommended: String,
}

impl EvaluationReport {
    /// Recommend the lowest score; the earliest strategy wins a tie
    pub fn from_outcomes(outcomes: IndexMap<String, StrategyOutcome>) -> Self {
        let mut best: Option<(&str, f64)> = None;
        for (name, outcome) in &outcomes {
            if let Some(score) = outcome.score() {
                if best.map_or(true, |(_, current)| score < current) {
                    best = Some((name.as_str(), score));
                }
            }
        }

        let recommended = best
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| NO_RECOMMENDATION.to_string());

        Self {
            outcomes,
            recommended,
        }
    }

    pub fn outcomes(&self) -> &IndexMap<String, StrategyOutcome> {
        &self.outcomes
    }

    pub fn outcome(&self, strategy: &str) -> Option<&StrategyOutcome> {
        self.outcomes.get(strategy)
    }

    /// Recommended strategy name, or [`NO_RECOMMENDATION`]
    pub fn recommended_model(&self) -> &str {
        &self.recommended
    }

    /// Recommended strategy name, if any strategy succeeded
    pub fn recommendation(&self) -> Option<&str> {
        Some(self.recommended.as_str()).filter(|name| *name != NO_RECOMMENDATION)
    }
}

/// Runs strategies against a train/test split and ranks them
pub struct EvaluationHarness {
    registry: StrategyRegistry,
    store: Arc<dyn Store>,
    timeout: Option<Duration>,
}

impl EvaluationHarness {
    pub fn new(registry: StrategyRegistry, store: Arc<dyn Store>) -> Self {
        Self {
            registry,
            store,
            timeout: None,
        }
    }

    /// Give up on a strategy that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Load the series described by `spec` and evaluate it
    pub fn evaluate_table(
        &self,
        spec: &SeriesSpec,
        period: usize,
        growth_rates: &[f64],
        strategies: Option<&[String]>,
    ) -> Result<EvaluationReport> {
        let adapters = self.adapters(strategies)?;
        let series = SeriesLoader::new(self.store.as_ref()).load(spec)?;
        self.run(&series, period, growth_rates, adapters)
    }

    /// Hold out the last `period` records and score every selected strategy.
    ///
    /// `strategies` restricts the run to the named strategies; they still run
    /// in declaration order. Only input validation can fail: strategy errors
    /// become failure markers in the report.
    pub fn evaluate(
        &self,
        series: &TimeSeries,
        period: usize,
        growth_rates: &[f64],
        strategies: Option<&[String]>,
    ) -> Result<EvaluationReport> {
        let adapters = self.adapters(strategies)?;
        self.run(series, period, growth_rates, adapters)
    }

    fn adapters(&self, strategies: Option<&[String]>) -> Result<Vec<Arc<dyn StrategyAdapter>>> {
        match strategies {
            Some(names) => self.registry.select(names),
            None => Ok(self.registry.adapters().to_vec()),
        }
    }

    fn run(
        &self,
        series: &TimeSeries,
        period: usize,
        growth_rates: &[f64],
        adapters: Vec<Arc<dyn StrategyAdapter>>,
    ) -> Result<EvaluationReport> {
        let split = split(series, period)?;
        let actual = split.test.targets();
        let train = Arc::new(split.train);
        let input = StrategyInput::new(Arc::clone(&self.store), growth_rates.to_vec(), period);

        tracing::info!(
            train = train.len(),
            test = actual.len(),
            strategies = adapters.len(),
            "evaluating strategies"
        );

        let mut outcomes = IndexMap::with_capacity(adapters.len());
        for adapter in adapters {
            let name = adapter.name().to_string();
            let outcome = match self
                .invoke(adapter, Arc::clone(&train), input.clone())
                .and_then(|result| score(&actual, &result))
            {
                Ok(value) => {
                    tracing::info!(strategy = %name, rmse = value, "strategy scored");
                    StrategyOutcome::Scored(value)
                }
                Err(err) => {
                    tracing::warn!(strategy = %name, error = %err, "strategy failed");
                    StrategyOutcome::Failed(err.to_string())
                }
            };
            outcomes.insert(name, outcome);
        }

        let report = EvaluationReport::from_outcomes(outcomes);
        tracing::info!(recommended = %report.recommended_model(), "evaluation finished");
        Ok(report)
    }

    /// Run one adapter on its own thread so a panic or a stall stays contained
    fn invoke(
        &self,
        adapter: Arc<dyn StrategyAdapter>,
        train: Arc<TimeSeries>,
        input: StrategyInput,
    ) -> Result<ForecastResult> {
        let name = adapter.name().to_string();
        let (tx, rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name(format!("strategy-{}", name))
            .spawn(move || {
                // The receiver is gone if the strategy already timed out
                let _ = tx.send(adapter.forecast(&train, &input));
            })?;

        let received = match self.timeout {
            Some(limit) => rx.recv_timeout(limit),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(result) => {
                let _ = worker.join();
                result
            }
            Err(RecvTimeoutError::Timeout) => Err(ForecastError::StrategyTimeout {
                strategy: name,
                seconds: self.timeout.map_or(0.0, |t| t.as_secs_f64()),
            }),
            Err(RecvTimeoutError::Disconnected) => {
                let reason = match worker.join() {
                    Err(payload) => panic_message(payload.as_ref()),
                    Ok(()) => "worker exited without a result".to_string(),
                };
                Err(ForecastError::StrategyPredict {
                    strategy: name,
                    reason: format!("strategy panicked: {}", reason),
                })
            }
        }
    }
}

fn score(actual: &[f64], result: &ForecastResult) -> Result<f64> {
    let value = rmse(actual, &result.values())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ForecastError::StrategyPredict {
            strategy: result.strategy().to_string(),
            reason: "forecast produced a non-finite score".to_string(),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

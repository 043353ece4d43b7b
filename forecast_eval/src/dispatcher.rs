//! Production forecasting through a single named strategy

use crate::config::DEFAULT_MAX_HORIZON;
use crate::data::{SeriesSpec, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::loader::SeriesLoader;
use crate::store::Store;
use crate::strategies::{ForecastResult, StrategyAdapter, StrategyInput, StrategyRegistry};
use std::sync::Arc;

/// Routes a forecast request to exactly one strategy, trained on the full series
pub struct ForecastDispatcher {
    registry: StrategyRegistry,
    store: Arc<dyn Store>,
    max_horizon: usize,
}

impl ForecastDispatcher {
    pub fn new(registry: StrategyRegistry, store: Arc<dyn Store>) -> Self {
        Self {
            registry,
            store,
            max_horizon: DEFAULT_MAX_HORIZON,
        }
    }

    /// Reject requests for more than `max_horizon` steps
    pub fn with_max_horizon(mut self, max_horizon: usize) -> Self {
        self.max_horizon = max_horizon;
        self
    }

    pub fn max_horizon(&self) -> usize {
        self.max_horizon
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Load the series behind `spec` and forecast `period` steps with `model_name`.
    ///
    /// The strategy is resolved before the store is touched, so an unknown
    /// name fails fast with `UnknownStrategy`.
    pub fn dispatch(
        &self,
        spec: &SeriesSpec,
        model_name: &str,
        period: usize,
        growth_rates: &[f64],
    ) -> Result<ForecastResult> {
        let adapter = self.registry.get(model_name)?;
        let series = SeriesLoader::new(self.store.as_ref()).load(spec)?;
        self.forecast_with(adapter.as_ref(), &series, period, growth_rates)
    }

    /// Forecast an already loaded series with `model_name`
    pub fn dispatch_series(
        &self,
        series: &TimeSeries,
        model_name: &str,
        period: usize,
        growth_rates: &[f64],
    ) -> Result<ForecastResult> {
        let adapter = self.registry.get(model_name)?;
        self.forecast_with(adapter.as_ref(), series, period, growth_rates)
    }

    fn forecast_with(
        &self,
        adapter: &dyn StrategyAdapter,
        series: &TimeSeries,
        period: usize,
        growth_rates: &[f64],
    ) -> Result<ForecastResult> {
        if period == 0 || series.is_empty() {
            return Err(ForecastError::InvalidHorizon {
                period,
                len: series.len(),
            });
        }
        if period > self.max_horizon {
            return Err(ForecastError::HorizonTooLong {
                period,
                max: self.max_horizon,
            });
        }

        tracing::info!(strategy = adapter.name(), records = series.len(), period, "dispatching forecast");
        let input = StrategyInput::new(Arc::clone(&self.store), growth_rates.to_vec(), period);
        adapter.forecast(series, &input)
    }
}

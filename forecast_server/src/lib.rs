//! # forecast_server
//!
//! HTTP API over `forecast_eval`: table introspection, single-strategy
//! forecasts and train/test evaluation of every strategy.

use axum::{
    routing::{get, post},
    Router,
};
use forecast_eval::{
    CsvStore, EvaluationHarness, ForecastDispatcher, Store, StrategyConfig, StrategyRegistry,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod routes;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub dispatcher: Arc<ForecastDispatcher>,
    pub harness: Arc<EvaluationHarness>,
}

impl AppState {
    /// Dispatcher and harness over one store, sharing the same strategy setup
    pub fn new(
        store: Arc<dyn Store>,
        strategies: &StrategyConfig,
        timeout: Option<Duration>,
    ) -> Self {
        let dispatcher = ForecastDispatcher::new(StrategyRegistry::standard(strategies), store.clone())
            .with_max_horizon(strategies.max_horizon);
        let mut harness = EvaluationHarness::new(StrategyRegistry::standard(strategies), store.clone());
        if let Some(timeout) = timeout {
            harness = harness.with_timeout(timeout);
        }

        Self {
            store,
            dispatcher: Arc::new(dispatcher),
            harness: Arc::new(harness),
        }
    }

    /// State backed by the CSV directory named in `config`
    pub fn from_config(config: &ServerConfig) -> forecast_eval::Result<Self> {
        let store = CsvStore::open(&config.data_dir)?;
        Ok(Self::new(
            Arc::new(store),
            &config.strategies,
            config.strategy_timeout,
        ))
    }
}

/// Build the router with CORS and request tracing
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/tables", get(routes::tables))
        .route("/columns", get(routes::columns))
        .route("/strategies", get(routes::strategies))
        .route("/forecast", post(routes::forecast))
        .route("/evaluate", post(routes::evaluate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

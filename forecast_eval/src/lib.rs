//! # Forecast Eval
//!
//! Time series forecasting with interchangeable strategies and a held-out
//! evaluation harness that recommends the best one.
//!
//! ## Features
//!
//! - Series loading from a [`Store`] with schema-checked identifiers
//! - Three built-in strategies behind one adapter contract:
//!   - `s1`: growth curve with seasonality and regressors (staged by table name)
//!   - `s2`: random forest over lagged features
//!   - `s3`: gradient-boosted trees over lagged features
//! - Deterministic train/test splitting and RMSE scoring
//! - An evaluation harness where a failing strategy is reported, never fatal
//!
//! ## Quick Start
//!
//! ```no_run
//! use forecast_eval::{CsvStore, EvaluationHarness, SeriesSpec, StrategyRegistry};
//! use std::sync::Arc;
//!
//! let store = Arc::new(CsvStore::open("data")?);
//! let harness = EvaluationHarness::new(StrategyRegistry::default(), store);
//!
//! let spec = SeriesSpec::new("sales", "ds", "y");
//! let report = harness.evaluate_table(&spec, 7, &[], None)?;
//! println!("best strategy: {}", report.recommended_model());
//! # Ok::<(), forecast_eval::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod dispatcher;
pub mod error;
pub mod harness;
pub mod loader;
pub mod metrics;
pub mod split;
pub mod store;
pub mod strategies;

// Re-export commonly used types
pub use crate::config::StrategyConfig;
pub use crate::data::{Record, SeriesSpec, TimeSeries};
pub use crate::dispatcher::ForecastDispatcher;
pub use crate::error::{ForecastError, Result};
pub use crate::harness::{EvaluationHarness, EvaluationReport, StrategyOutcome, NO_RECOMMENDATION};
pub use crate::loader::SeriesLoader;
pub use crate::split::{split, Split};
pub use crate::store::{CsvStore, MemoryStore, Store};
pub use crate::strategies::{
    ForecastPoint, ForecastResult, StrategyAdapter, StrategyInput, StrategyKind, StrategyRegistry,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

use chrono::{Duration, NaiveDate};
use forecast_eval::{
    ForecastDispatcher, ForecastError, ForecastResult, MemoryStore, SeriesSpec, StrategyAdapter,
    StrategyInput, StrategyRegistry, TimeSeries,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn daily_series(len: usize) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let timestamps = (0..len).map(|i| start + Duration::days(i as i64)).collect();
    let values = (0..len).map(|i| 20.0 + i as f64).collect();
    TimeSeries::from_values(timestamps, values).unwrap()
}

/// Repeats the last observation and counts invocations
struct LastValue {
    name: &'static str,
    calls: AtomicUsize,
    seen: AtomicUsize,
}

impl LastValue {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicUsize::new(0),
            seen: AtomicUsize::new(0),
        })
    }
}

impl StrategyAdapter for LastValue {
    fn name(&self) -> &str {
        self.name
    }

    fn forecast(&self, train: &TimeSeries, input: &StrategyInput) -> forecast_eval::Result<ForecastResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.store(train.len(), Ordering::SeqCst);

        let last = train.records().last().unwrap().target;
        let timestamps = train.future_timestamps(input.period)?;
        ForecastResult::from_values(self.name, timestamps, vec![last; input.period], input.period)
    }
}

fn dispatcher(adapters: Vec<Arc<dyn StrategyAdapter>>, store: Arc<MemoryStore>) -> ForecastDispatcher {
    ForecastDispatcher::new(StrategyRegistry::from_adapters(adapters), store)
}

#[test]
fn test_unknown_strategy_never_calls_an_adapter() {
    let s1 = LastValue::new("s1");
    let s2 = LastValue::new("s2");
    let dispatcher = dispatcher(vec![s1.clone(), s2.clone()], Arc::new(MemoryStore::new()));

    let spec = SeriesSpec::new("missing_table", "ds", "y");
    let result = dispatcher.dispatch(&spec, "unknown", 5, &[]);

    // The name is checked before the (missing) table is read
    assert!(matches!(result, Err(ForecastError::UnknownStrategy(ref name)) if name == "unknown"));
    assert!(result.unwrap_err().is_client_error());
    assert_eq!(s1.calls.load(Ordering::SeqCst), 0);
    assert_eq!(s2.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_dispatch_uses_the_full_series() {
    let s1 = LastValue::new("s1");
    let store = Arc::new(MemoryStore::new());
    let series = daily_series(12);
    store.insert("visits", series.to_dataframe().unwrap()).unwrap();

    let dispatcher = dispatcher(vec![s1.clone()], store);
    let spec = SeriesSpec::new("visits", "ds", "y");
    let forecast = dispatcher.dispatch(&spec, "s1", 4, &[]).unwrap();

    assert_eq!(s1.calls.load(Ordering::SeqCst), 1);
    assert_eq!(s1.seen.load(Ordering::SeqCst), 12);
    assert_eq!(forecast.len(), 4);
    assert_eq!(forecast.values(), vec![31.0; 4]);

    let first = forecast.points()[0].ds;
    let last_observed = series.records().last().unwrap().timestamp;
    assert_eq!(first, last_observed + Duration::days(1));
}

#[test]
fn test_dispatch_accepts_model_aliases() {
    let s2 = LastValue::new("s2");
    let dispatcher = dispatcher(vec![LastValue::new("s1"), s2.clone()], Arc::new(MemoryStore::new()));

    let forecast = dispatcher
        .dispatch_series(&daily_series(5), "random_forest", 2, &[])
        .unwrap();

    assert_eq!(forecast.strategy(), "s2");
    assert_eq!(s2.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dispatch_rejects_zero_period() {
    let dispatcher = dispatcher(vec![LastValue::new("s1")], Arc::new(MemoryStore::new()));

    let result = dispatcher.dispatch_series(&daily_series(5), "s1", 0, &[]);
    assert!(matches!(result, Err(ForecastError::InvalidHorizon { period: 0, len: 5 })));
}

#[test]
fn test_dispatch_reports_missing_table() {
    let dispatcher = dispatcher(vec![LastValue::new("s1")], Arc::new(MemoryStore::new()));

    let spec = SeriesSpec::new("nope", "ds", "y");
    let err = dispatcher.dispatch(&spec, "s1", 3, &[]).unwrap_err();

    assert!(matches!(err, ForecastError::DataAccess(_)));
    assert!(err.is_client_error());
}

#[test]
fn test_dispatch_rejects_horizon_beyond_limit() {
    let s2 = LastValue::new("s2");
    let dispatcher = dispatcher(vec![s2.clone()], Arc::new(MemoryStore::new())).with_max_horizon(50);

    let err = dispatcher
        .dispatch_series(&daily_series(20), "s2", 1 << 40, &[])
        .unwrap_err();
    assert!(matches!(err, ForecastError::HorizonTooLong { max: 50, .. }));
    assert!(err.is_client_error());
    assert_eq!(s2.calls.load(Ordering::SeqCst), 0);

    let forecast = dispatcher.dispatch_series(&daily_series(20), "s2", 50, &[]).unwrap();
    assert_eq!(forecast.len(), 50);
}

#[test]
fn test_builtin_strategies_survive_huge_horizon() {
    let dispatcher = ForecastDispatcher::new(StrategyRegistry::default(), Arc::new(MemoryStore::new()));
    assert_eq!(dispatcher.max_horizon(), forecast_eval::config::DEFAULT_MAX_HORIZON);

    for model in ["s1", "s2", "s3"] {
        let result = dispatcher.dispatch_series(&daily_series(20), model, 1 << 40, &[]);
        assert!(matches!(result, Err(ForecastError::HorizonTooLong { .. })), "{}", model);
    }
}

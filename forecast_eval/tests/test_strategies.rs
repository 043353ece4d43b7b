use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use forecast_eval::config::{BoostingParams, ForestParams, GrowthParams};
use forecast_eval::strategies::{GradientBoosting, GrowthCurve, RandomForest};
use forecast_eval::{
    ForecastError, MemoryStore, Record, Store, StrategyAdapter, StrategyInput, StrategyKind,
    StrategyRegistry, TimeSeries,
};
use std::str::FromStr;
use std::sync::Arc;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn seasonal_series(len: usize) -> TimeSeries {
    let timestamps = (0..len).map(|i| start() + Duration::days(i as i64)).collect();
    let values = (0..len)
        .map(|i| {
            let t = i as f64;
            100.0 + 0.5 * t + 3.0 * (2.0 * std::f64::consts::PI * t / 7.0).sin()
        })
        .collect();
    TimeSeries::from_values(timestamps, values).unwrap()
}

fn input(store: Arc<MemoryStore>, growth_rates: Vec<f64>, period: usize) -> StrategyInput {
    StrategyInput::new(store, growth_rates, period)
}

#[test]
fn test_every_builtin_strategy_forecasts_the_horizon() {
    let series = seasonal_series(40);
    let store = Arc::new(MemoryStore::new());
    let registry = StrategyRegistry::default();
    let last = series.records().last().unwrap().timestamp;

    assert_eq!(registry.names(), vec!["s1", "s2", "s3"]);

    for adapter in registry.adapters() {
        let forecast = adapter
            .forecast(&series, &input(store.clone(), vec![0.2], 5))
            .unwrap();

        assert_eq!(forecast.len(), 5, "{}", adapter.name());
        assert_eq!(forecast.strategy(), adapter.name());
        assert!(forecast.values().iter().all(|v| v.is_finite()));
        for (step, point) in forecast.points().iter().enumerate() {
            assert_eq!(point.ds, last + Duration::days(step as i64 + 1));
        }
    }
}

#[test]
fn test_growth_curve_tracks_trend_and_season() {
    let full = seasonal_series(63);
    let train = full.slice(0..56).unwrap();
    let actual = full.slice(56..63).unwrap().targets();

    let model = GrowthCurve::new(GrowthParams::default());
    let forecast = model
        .forecast(&train, &input(Arc::new(MemoryStore::new()), Vec::new(), 7))
        .unwrap();

    for (predicted, expected) in forecast.values().iter().zip(&actual) {
        assert_relative_eq!(*predicted, *expected, max_relative = 1e-3);
    }

    let point = &forecast.points()[0];
    assert!(point.yhat_lower.unwrap() <= point.yhat);
    assert!(point.yhat_upper.unwrap() >= point.yhat);
}

#[test]
fn test_growth_curve_cleans_up_its_staging_table() {
    let store = Arc::new(MemoryStore::new());
    let model = GrowthCurve::new(GrowthParams::default());

    model
        .forecast(&seasonal_series(20), &input(store.clone(), Vec::new(), 3))
        .unwrap();
    assert!(store.table_names().unwrap().is_empty());

    // Also on failure
    let tiny = seasonal_series(2);
    assert!(model.forecast(&tiny, &input(store.clone(), Vec::new(), 3)).is_err());
    assert!(store.table_names().unwrap().is_empty());
}

#[test]
fn test_growth_rates_project_regressors() {
    // y = 3 * x where x compounds 10% per day
    let records: Vec<Record> = (0..21)
        .map(|i| {
            let x = 100.0 * 1.1_f64.powi(i);
            Record {
                timestamp: start() + Duration::days(i as i64),
                target: 3.0 * x,
                regressors: vec![x],
            }
        })
        .collect();
    let series = TimeSeries::new("ds", "y", vec!["x".to_string()], records).unwrap();
    let store = Arc::new(MemoryStore::new());
    let model = GrowthCurve::new(GrowthParams::default());

    let grown = model
        .forecast(&series, &input(store.clone(), vec![0.1], 3))
        .unwrap();
    let flat = model.forecast(&series, &input(store, Vec::new(), 3)).unwrap();

    let x_last = 100.0 * 1.1_f64.powi(20);
    for (step, value) in grown.values().iter().enumerate() {
        let expected = 3.0 * x_last * 1.1_f64.powi(step as i32 + 1);
        assert_relative_eq!(*value, expected, max_relative = 1e-2);
    }
    // Without growth the regressor is held flat
    assert!(flat.values()[2] < grown.values()[2]);
}

#[test]
fn test_tree_strategies_ignore_growth_rates() {
    let series = seasonal_series(30);
    let store = Arc::new(MemoryStore::new());

    let forest = RandomForest::new(ForestParams::default());
    let boosting = GradientBoosting::new(BoostingParams::default());

    for adapter in [&forest as &dyn StrategyAdapter, &boosting] {
        let with = adapter
            .forecast(&series, &input(store.clone(), vec![5.0, -0.5], 4))
            .unwrap();
        let without = adapter
            .forecast(&series, &input(store.clone(), Vec::new(), 4))
            .unwrap();
        assert_eq!(with, without);
    }
}

#[test]
fn test_tree_strategies_are_deterministic() {
    let series = seasonal_series(30);
    let store = Arc::new(MemoryStore::new());
    let forest = RandomForest::new(ForestParams::default());

    let a = forest.forecast(&series, &input(store.clone(), Vec::new(), 6)).unwrap();
    let b = forest.forecast(&series, &input(store, Vec::new(), 6)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_insufficient_data_is_a_fit_error() {
    let series = seasonal_series(2);
    let store = Arc::new(MemoryStore::new());

    for adapter in StrategyRegistry::default().adapters() {
        let err = adapter
            .forecast(&series, &input(store.clone(), Vec::new(), 2))
            .unwrap_err();
        assert!(
            matches!(err, ForecastError::StrategyFit { .. }),
            "{}: {:?}",
            adapter.name(),
            err
        );
        assert!(!err.is_client_error());
    }
}

#[test]
fn test_strategy_kind_lookup() {
    assert_eq!(StrategyKind::from_str("s1").unwrap(), StrategyKind::S1);
    assert_eq!(StrategyKind::from_str(" Prophet ").unwrap(), StrategyKind::S1);
    assert_eq!(StrategyKind::from_str("random_forest").unwrap(), StrategyKind::S2);
    assert_eq!(StrategyKind::from_str("xgboost").unwrap(), StrategyKind::S3);
    assert!(matches!(
        StrategyKind::from_str("arima"),
        Err(ForecastError::UnknownStrategy(_))
    ));

    let names: Vec<String> = StrategyKind::ALL.iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["s1", "s2", "s3"]);
}

#[test]
fn test_sub_second_series_keeps_its_cadence() {
    let timestamps: Vec<NaiveDateTime> = (0..40)
        .map(|i| start() + Duration::milliseconds(250 * i))
        .collect();
    let values = (0..40).map(|i| 5.0 + 0.1 * i as f64).collect();
    let series = TimeSeries::from_values(timestamps, values).unwrap();
    let last = start() + Duration::milliseconds(250 * 39);

    for kind in StrategyKind::ALL {
        let store = Arc::new(MemoryStore::new());
        let adapter = StrategyRegistry::default().get(kind.name()).unwrap();
        let forecast = adapter.forecast(&series, &input(store, vec![], 3)).unwrap();

        let ds: Vec<NaiveDateTime> = forecast.points().iter().map(|p| p.ds).collect();
        assert_eq!(
            ds,
            vec![
                last + Duration::milliseconds(250),
                last + Duration::milliseconds(500),
                last + Duration::milliseconds(750),
            ],
            "strategy {}",
            kind
        );
    }
}

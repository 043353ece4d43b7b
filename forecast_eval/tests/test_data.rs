use chrono::{Duration, NaiveDate, NaiveDateTime};
use forecast_eval::data::{parse_timestamp, Cadence};
use forecast_eval::{ForecastError, Record, SeriesSpec, TimeSeries};
use pretty_assertions::assert_eq;

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn test_parse_timestamp_formats() {
    let expected = at(2023, 5, 17);

    assert_eq!(parse_timestamp("2023-05-17"), Some(expected));
    assert_eq!(parse_timestamp("2023/05/17"), Some(expected));
    assert_eq!(parse_timestamp(" 2023-05-17 00:00:00 "), Some(expected));
    assert_eq!(parse_timestamp("2023-05-17T00:00:00Z"), Some(expected));
    assert_eq!(
        parse_timestamp("2023-05-17 13:45:10.250"),
        NaiveDate::from_ymd_opt(2023, 5, 17)
            .unwrap()
            .and_hms_milli_opt(13, 45, 10, 250)
    );
    assert_eq!(parse_timestamp(""), None);
    assert_eq!(parse_timestamp("yesterday"), None);
}

#[test]
fn test_series_is_sorted_and_cleaned() {
    let records = vec![
        Record { timestamp: at(2023, 1, 3), target: 3.0, regressors: vec![1.0] },
        Record { timestamp: at(2023, 1, 1), target: 1.0, regressors: vec![1.0] },
        Record { timestamp: at(2023, 1, 2), target: f64::NAN, regressors: vec![1.0] },
        Record { timestamp: at(2023, 1, 4), target: 4.0, regressors: vec![f64::INFINITY] },
    ];

    let series = TimeSeries::new("ds", "y", vec!["r".to_string()], records).unwrap();

    assert_eq!(series.targets(), vec![1.0, 3.0]);
    assert_eq!(series.timestamps(), vec![at(2023, 1, 1), at(2023, 1, 3)]);
}

#[test]
fn test_series_rejects_ragged_regressors() {
    let records = vec![Record {
        timestamp: at(2023, 1, 1),
        target: 1.0,
        regressors: vec![1.0, 2.0],
    }];

    let result = TimeSeries::new("ds", "y", vec!["r".to_string()], records);
    assert!(matches!(result, Err(ForecastError::DataAccess(_))));
}

#[test]
fn test_dataframe_round_trip() {
    let records = (0..4)
        .map(|i| Record {
            timestamp: at(2023, 1, 1) + Duration::hours(6 * i),
            target: i as f64 * 1.5,
            regressors: vec![10.0 - i as f64],
        })
        .collect();
    let series = TimeSeries::new("when", "sales", vec!["price".to_string()], records).unwrap();

    let df = series.to_dataframe().unwrap();
    assert_eq!(df.get_column_names(), vec!["when", "sales", "price"]);

    let spec = SeriesSpec::new("t", "when", "sales").with_regressors(["price"]);
    let back = TimeSeries::from_dataframe(&df, &spec).unwrap();
    assert_eq!(back, series);
}

#[test]
fn test_cadence_inference() {
    let daily: Vec<_> = (0..5).map(|i| at(2023, 1, 1) + Duration::days(i)).collect();
    assert_eq!(Cadence::infer(&daily), Some(Cadence::Fixed(Duration::days(1))));

    // One gap does not change the dominant step
    let gappy = vec![at(2023, 1, 1), at(2023, 1, 2), at(2023, 1, 3), at(2023, 1, 10)];
    assert_eq!(Cadence::infer(&gappy), Some(Cadence::Fixed(Duration::days(1))));

    let monthly: Vec<_> = (1..=6).map(|m| at(2023, m, 1)).collect();
    assert_eq!(Cadence::infer(&monthly), Some(Cadence::Months(1)));

    let quarterly = vec![at(2023, 1, 1), at(2023, 4, 1), at(2023, 7, 1), at(2023, 10, 1)];
    assert_eq!(Cadence::infer(&quarterly), Some(Cadence::Months(3)));

    assert_eq!(Cadence::infer(&[at(2023, 1, 1)]), None);
    assert_eq!(Cadence::infer(&[at(2023, 1, 1), at(2023, 1, 1)]), None);
}

#[test]
fn test_future_timestamps_follow_calendar_months() {
    let series = TimeSeries::from_values(
        vec![at(2023, 11, 30), at(2023, 12, 31), at(2024, 1, 31)],
        vec![1.0, 2.0, 3.0],
    )
    .unwrap();

    let future = series.future_timestamps(3).unwrap();
    assert_eq!(future, vec![at(2024, 2, 29), at(2024, 3, 31), at(2024, 4, 30)]);
}

#[test]
fn test_future_timestamps_need_two_distinct_points() {
    let series = TimeSeries::from_values(vec![at(2023, 1, 1)], vec![1.0]).unwrap();
    assert!(series.future_timestamps(2).is_err());
}

#[test]
fn test_sub_second_cadence_round_trips_through_a_frame() {
    let timestamps: Vec<_> = (0..4)
        .map(|i| at(2023, 1, 1) + Duration::milliseconds(250 * i))
        .collect();
    assert_eq!(
        Cadence::infer(&timestamps),
        Some(Cadence::Fixed(Duration::milliseconds(250)))
    );

    let series = TimeSeries::from_values(timestamps, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let df = series.to_dataframe().unwrap();
    let back = TimeSeries::from_dataframe(&df, &SeriesSpec::new("t", "ds", "y")).unwrap();
    assert_eq!(back, series);

    let future = back.future_timestamps(2).unwrap();
    assert_eq!(
        future,
        vec![
            at(2023, 1, 1) + Duration::milliseconds(1000),
            at(2023, 1, 1) + Duration::milliseconds(1250),
        ]
    );
}

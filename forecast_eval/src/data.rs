//! Time series data handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use polars::prelude::{DataFrame, DataType, NamedFrom, Series};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

/// Format used when timestamps are written out (staging tables, API responses).
///
/// Fractional seconds are only written when present.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const NANOS_PER_DAY: i64 = 86_400_000_000_000;

/// Parse a timestamp in any of the common date/datetime layouts
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Where a series lives in the store and which columns make it up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesSpec {
    /// Table identifier
    pub table: String,
    /// Timestamp column
    pub ds_column: String,
    /// Target column
    pub y_column: String,
    /// Regressor columns, in order
    #[serde(default)]
    pub regressors: Vec<String>,
}

impl SeriesSpec {
    pub fn new(table: impl Into<String>, ds_column: impl Into<String>, y_column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ds_column: ds_column.into(),
            y_column: y_column.into(),
            regressors: Vec::new(),
        }
    }

    pub fn with_regressors<I, S>(mut self, regressors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regressors = regressors.into_iter().map(Into::into).collect();
        self
    }

    /// All referenced columns: timestamp, target, then regressors
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![self.ds_column.clone(), self.y_column.clone()];
        columns.extend(self.regressors.iter().cloned());
        columns
    }
}

/// One observation of the series
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub target: f64,
    /// Regressor values aligned with [`TimeSeries::regressor_names`]
    pub regressors: Vec<f64>,
}

/// Spacing between consecutive observations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Constant step (seconds, hours, days, weeks)
    Fixed(Duration),
    /// Calendar months (1 = monthly, 3 = quarterly, 12 = yearly)
    Months(u32),
}

impl Cadence {
    /// Infer the dominant spacing of sorted timestamps
    pub fn infer(timestamps: &[NaiveDateTime]) -> Option<Self> {
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for pair in timestamps.windows(2) {
            let step = (pair[1] - pair[0]).num_nanoseconds();
            if let Some(step) = step.filter(|s| *s > 0) {
                *counts.entry(step).or_insert(0) += 1;
            }
        }

        // Most frequent step; the shorter one wins a tie
        let (step, _) = counts
            .into_iter()
            .max_by(|(sa, ca), (sb, cb)| ca.cmp(cb).then(sb.cmp(sa)))?;

        let days = step / NANOS_PER_DAY;
        let cadence = match days {
            28..=31 => Cadence::Months(1),
            89..=92 => Cadence::Months(3),
            365..=366 => Cadence::Months(12),
            _ => Cadence::Fixed(Duration::nanoseconds(step)),
        };
        Some(cadence)
    }

    /// Timestamp `steps` cadence units after `from`
    pub fn advance(&self, from: NaiveDateTime, steps: u32) -> Option<NaiveDateTime> {
        match *self {
            Cadence::Fixed(step) => from.checked_add_signed(step * i32::try_from(steps).ok()?),
            Cadence::Months(months) => {
                from.checked_add_months(chrono::Months::new(months.checked_mul(steps)?))
            }
        }
    }

    /// Approximate length of one step in days
    pub fn days(&self) -> f64 {
        match *self {
            Cadence::Fixed(step) => step.num_milliseconds() as f64 / 86_400_000.0,
            Cadence::Months(months) => months as f64 * 30.4375,
        }
    }
}

/// Time series data structure for forecasting
///
/// Records are sorted ascending by timestamp and carry no missing or
/// non-finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    ds_column: String,
    y_column: String,
    regressor_names: Vec<String>,
    records: Vec<Record>,
}

impl TimeSeries {
    /// Build a series, dropping rows with non-finite values and sorting by timestamp
    pub fn new(
        ds_column: impl Into<String>,
        y_column: impl Into<String>,
        regressor_names: Vec<String>,
        records: Vec<Record>,
    ) -> Result<Self> {
        if let Some((row, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.regressors.len() != regressor_names.len())
        {
            return Err(ForecastError::DataAccess(format!(
                "Row {} has {} regressor values but {} regressor columns were declared",
                row,
                record.regressors.len(),
                regressor_names.len()
            )));
        }

        let total = records.len();
        let mut records: Vec<Record> = records
            .into_iter()
            .filter(|r| r.target.is_finite() && r.regressors.iter().all(|v| v.is_finite()))
            .collect();
        if records.len() < total {
            tracing::debug!(dropped = total - records.len(), "dropped rows with non-finite values");
        }

        records.sort_by_key(|r| r.timestamp);

        Ok(Self {
            ds_column: ds_column.into(),
            y_column: y_column.into(),
            regressor_names,
            records,
        })
    }

    /// Build a regressor-free series named `ds`/`y`
    pub fn from_values(timestamps: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::DataAccess(format!(
                "Timestamps length ({}) doesn't match values length ({})",
                timestamps.len(),
                values.len()
            )));
        }

        let records = timestamps
            .into_iter()
            .zip(values)
            .map(|(timestamp, target)| Record {
                timestamp,
                target,
                regressors: Vec::new(),
            })
            .collect();

        Self::new("ds", "y", Vec::new(), records)
    }

    /// Extract the columns named by `spec` from a data frame.
    ///
    /// Rows with a missing or unparseable timestamp, or a missing target or
    /// regressor value, are dropped.
    pub fn from_dataframe(df: &DataFrame, spec: &SeriesSpec) -> Result<Self> {
        let ds_strings = df.column(&spec.ds_column)?.cast(&DataType::Utf8)?;
        let ds_values = ds_strings.utf8()?;
        let targets = column_f64(df, &spec.y_column)?;
        let regressors = spec
            .regressors
            .iter()
            .map(|name| column_f64(df, name))
            .collect::<Result<Vec<_>>>()?;

        let mut records = Vec::with_capacity(df.height());
        let mut dropped = 0usize;
        for (row, raw_ds) in ds_values.into_iter().enumerate() {
            let timestamp = raw_ds.and_then(parse_timestamp);
            let target = targets[row];
            let values: Option<Vec<f64>> = regressors.iter().map(|column| column[row]).collect();

            match (timestamp, target, values) {
                (Some(timestamp), Some(target), Some(regressors)) => records.push(Record {
                    timestamp,
                    target,
                    regressors,
                }),
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::debug!(table = %spec.table, dropped, "dropped incomplete rows");
        }

        Self::new(
            spec.ds_column.clone(),
            spec.y_column.clone(),
            spec.regressors.clone(),
            records,
        )
    }

    /// Materialize as a data frame; timestamps are rendered with [`TIMESTAMP_FORMAT`]
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(2 + self.regressor_names.len());

        let ds: Vec<String> = self
            .records
            .iter()
            .map(|r| r.timestamp.format(TIMESTAMP_FORMAT).to_string())
            .collect();
        columns.push(Series::new(&self.ds_column, ds));
        columns.push(Series::new(&self.y_column, self.targets()));

        for (i, name) in self.regressor_names.iter().enumerate() {
            let values: Vec<f64> = self.records.iter().map(|r| r.regressors[i]).collect();
            columns.push(Series::new(name, values));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// The sub-series covering `range` of the records
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.records.len() {
            return Err(ForecastError::DataAccess(format!(
                "Slice {}..{} out of bounds for series of length {}",
                range.start,
                range.end,
                self.records.len()
            )));
        }

        Ok(Self {
            ds_column: self.ds_column.clone(),
            y_column: self.y_column.clone(),
            regressor_names: self.regressor_names.clone(),
            records: self.records[range].to_vec(),
        })
    }

    /// Spacing of the observations, if at least two distinct timestamps exist
    pub fn cadence(&self) -> Option<Cadence> {
        Cadence::infer(&self.timestamps())
    }

    /// `horizon` timestamps continuing the series' cadence
    pub fn future_timestamps(&self, horizon: usize) -> Result<Vec<NaiveDateTime>> {
        let last = self
            .records
            .last()
            .ok_or_else(|| ForecastError::DataAccess("Series is empty".to_string()))?
            .timestamp;
        let cadence = self.cadence().ok_or_else(|| {
            ForecastError::DataAccess(
                "Cannot infer cadence from fewer than two distinct timestamps".to_string(),
            )
        })?;

        (1..=horizon)
            .map(|step| {
                u32::try_from(step)
                    .ok()
                    .and_then(|step| cadence.advance(last, step))
                    .ok_or_else(|| {
                        ForecastError::DataAccess("Forecast timestamps overflow".to_string())
                    })
            })
            .collect()
    }

    pub fn ds_column(&self) -> &str {
        &self.ds_column
    }

    pub fn y_column(&self) -> &str {
        &self.y_column
    }

    pub fn regressor_names(&self) -> &[String] {
        &self.regressor_names
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Target values in time order
    pub fn targets(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.target).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.records.iter().map(|r| r.timestamp).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Numeric column as optional finite values; unparseable cells become `None`
fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let casted = df.column(name)?.cast(&DataType::Float64)?;
    let values = casted.f64()?;

    Ok(values
        .into_iter()
        .map(|v| v.filter(|v| v.is_finite()))
        .collect())
}

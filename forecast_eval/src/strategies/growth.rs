//! Growth curve with Fourier seasonality and extra regressors
//!
//! The curve reads its training data back out of the store by table name,
//! so every call stages the training series into a uniquely named table that
//! is dropped when the call returns.

use super::{ForecastPoint, ForecastResult, StrategyAdapter, StrategyInput};
use crate::config::GrowthParams;
use crate::data::{Cadence, SeriesSpec, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::loader::SeriesLoader;
use crate::store::StagingTable;
use chrono::NaiveDateTime;
use series_math::{fourier_terms, least_squares, predict_linear};

const NAME: &str = "s1";
const WEEK_DAYS: f64 = 7.0;
const YEAR_DAYS: f64 = 365.25;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Linear trend plus weekly/yearly seasonality, fitted by ridge least squares.
///
/// Future regressor values compound from their last observation at the
/// matching entry of `growth_rates` per step (missing entries mean no growth).
#[derive(Debug, Clone)]
pub struct GrowthCurve {
    params: GrowthParams,
}

/// Fitted curve
#[derive(Debug, Clone)]
struct CurveModel {
    origin: NaiveDateTime,
    span_days: f64,
    weekly_order: usize,
    yearly_order: usize,
    regressor_scale: Vec<(f64, f64)>,
    coefficients: Vec<f64>,
    sigma: f64,
}

impl CurveModel {
    fn row(&self, ts: NaiveDateTime, regressors: &[f64]) -> Vec<f64> {
        let days = (ts - self.origin).num_milliseconds() as f64 / MILLIS_PER_DAY;

        let mut row = vec![1.0, days / self.span_days];
        row.extend(fourier_terms(days, WEEK_DAYS, self.weekly_order));
        row.extend(fourier_terms(days, YEAR_DAYS, self.yearly_order));
        row.extend(
            regressors
                .iter()
                .zip(&self.regressor_scale)
                .map(|(v, (mean, std))| (v - mean) / std),
        );
        row
    }
}

impl GrowthCurve {
    pub fn new(params: GrowthParams) -> Self {
        Self { params }
    }

    fn fit(&self, series: &TimeSeries) -> Result<CurveModel> {
        let records = series.records();
        let (first, last) = match (records.first(), records.last()) {
            (Some(first), Some(last)) if series.len() >= 3 => (first.timestamp, last.timestamp),
            _ => {
                return Err(ForecastError::fit(
                    NAME,
                    format!("Need at least 3 records, got {}", series.len()),
                ))
            }
        };

        let span_days = (last - first).num_milliseconds() as f64 / MILLIS_PER_DAY;
        let cadence = series
            .cadence()
            .filter(|_| span_days > 0.0)
            .ok_or_else(|| ForecastError::fit(NAME, "All timestamps are identical"))?;

        let weekly_order = if cadence.days() < WEEK_DAYS && span_days >= 2.0 * WEEK_DAYS {
            self.params.weekly_order
        } else {
            0
        };
        let yearly_order = match cadence {
            Cadence::Months(12) => 0,
            _ if span_days >= 2.0 * YEAR_DAYS => self.params.yearly_order,
            _ => 0,
        };

        let regressor_scale = (0..series.regressor_names().len())
            .map(|i| {
                let values: Vec<f64> = records.iter().map(|r| r.regressors[i]).collect();
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
                let std = if var.sqrt() > 1e-12 { var.sqrt() } else { 1.0 };
                (mean, std)
            })
            .collect();

        let mut model = CurveModel {
            origin: first,
            span_days,
            weekly_order,
            yearly_order,
            regressor_scale,
            coefficients: Vec::new(),
            sigma: 0.0,
        };

        let x: Vec<Vec<f64>> = records
            .iter()
            .map(|r| model.row(r.timestamp, &r.regressors))
            .collect();
        let y = series.targets();

        model.coefficients =
            least_squares(&x, &y, self.params.ridge).map_err(|e| ForecastError::fit(NAME, e))?;

        let mut sse = 0.0;
        for (row, target) in x.iter().zip(&y) {
            let fitted = predict_linear(&model.coefficients, row).map_err(|e| ForecastError::fit(NAME, e))?;
            sse += (target - fitted).powi(2);
        }
        let dof = x.len().saturating_sub(model.coefficients.len()).max(1);
        model.sigma = (sse / dof as f64).sqrt();

        Ok(model)
    }

    fn project(&self, model: &CurveModel, series: &TimeSeries, input: &StrategyInput) -> Result<ForecastResult> {
        let timestamps = series
            .future_timestamps(input.period)
            .map_err(|e| ForecastError::predict(NAME, e))?;

        let last = series
            .records()
            .last()
            .map(|r| r.regressors.clone())
            .unwrap_or_default();
        if input.growth_rates.len() > last.len() {
            tracing::debug!(
                rates = input.growth_rates.len(),
                regressors = last.len(),
                "ignoring growth rates without a matching regressor"
            );
        }
        if let Some(rate) = input.growth_rates.iter().find(|r| !r.is_finite()) {
            return Err(ForecastError::predict(NAME, format!("Growth rate {} is not finite", rate)));
        }

        let band = self.params.interval_z * model.sigma;
        let mut points = Vec::with_capacity(timestamps.len());
        for (step, ts) in timestamps.into_iter().enumerate() {
            let regressors: Vec<f64> = last
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    let rate = input.growth_rates.get(i).copied().unwrap_or(0.0);
                    value * (1.0 + rate).powf((step + 1) as f64)
                })
                .collect();

            let yhat = predict_linear(&model.coefficients, &model.row(ts, &regressors))
                .map_err(|e| ForecastError::predict(NAME, e))?;
            if !yhat.is_finite() {
                return Err(ForecastError::predict(NAME, "Projection is not finite"));
            }
            points.push(ForecastPoint::new(ts, yhat).with_interval(yhat - band, yhat + band));
        }

        ForecastResult::new(NAME, points, input.period)
    }
}

impl StrategyAdapter for GrowthCurve {
    fn name(&self) -> &str {
        NAME
    }

    fn forecast(&self, train: &TimeSeries, input: &StrategyInput) -> Result<ForecastResult> {
        let mut df = train.to_dataframe()?;
        let staging = StagingTable::create(input.store.clone(), &mut df)?;

        let spec = SeriesSpec::new(staging.name(), train.ds_column(), train.y_column())
            .with_regressors(train.regressor_names().iter().cloned());
        let staged = SeriesLoader::new(staging.store()).load(&spec)?;
        drop(staging);

        let model = self.fit(&staged)?;
        self.project(&model, &staged, input)
    }
}

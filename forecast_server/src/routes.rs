//! API route handlers

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use forecast_eval::store::{is_staging_table, resolve_table};
use forecast_eval::{EvaluationReport, ForecastPoint, SeriesSpec};
use serde::{Deserialize, Serialize};

/// Strategy used by `/forecast` when the request names none
pub const DEFAULT_MODEL: &str = "s1";

#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    pub table_name: String,
    pub period: i64,
    pub ds_column: String,
    pub y_column: String,
    #[serde(default)]
    pub regressors: Vec<String>,
    #[serde(default)]
    pub growth_rates: Vec<f64>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub table_name: String,
    pub period: i64,
    pub ds_column: String,
    pub y_column: String,
    #[serde(default)]
    pub regressors: Vec<String>,
    #[serde(default)]
    pub growth_rates: Vec<f64>,
    /// Restrict the run to these strategies
    #[serde(default)]
    pub strategies: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ColumnsQuery {
    pub table_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub forecast: Vec<ForecastPoint>,
}

#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    pub columns: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StrategiesResponse {
    pub strategies: Vec<String>,
}

/// Liveness probe
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn tables(State(state): State<AppState>) -> ApiResult<Json<TablesResponse>> {
    let store = state.store.clone();
    let tables = blocking(move || store.table_names())
        .await?
        .into_iter()
        .filter(|name| !is_staging_table(name))
        .collect();
    Ok(Json(TablesResponse { tables }))
}

pub async fn columns(
    State(state): State<AppState>,
    Query(query): Query<ColumnsQuery>,
) -> ApiResult<Json<ColumnsResponse>> {
    let table = query
        .table_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("table_name is required".to_string()))?;

    let store = state.store.clone();
    let columns = blocking(move || {
        let resolved = resolve_table(store.as_ref(), table.trim())?;
        store.column_names(&resolved)
    })
    .await?;
    Ok(Json(ColumnsResponse { columns }))
}

pub async fn strategies(State(state): State<AppState>) -> Json<StrategiesResponse> {
    let strategies = state
        .dispatcher
        .registry()
        .names()
        .into_iter()
        .map(String::from)
        .collect();
    Json(StrategiesResponse { strategies })
}

pub async fn forecast(
    State(state): State<AppState>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> ApiResult<Json<ForecastResponse>> {
    let Json(req) = payload?;
    let period = horizon(req.period)?;
    let model = req.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let spec = SeriesSpec::new(req.table_name, req.ds_column, req.y_column)
        .with_regressors(req.regressors);
    let growth_rates = req.growth_rates;

    tracing::info!(table = %spec.table, model = %model, period, "forecast requested");

    let dispatcher = state.dispatcher.clone();
    let result = blocking(move || dispatcher.dispatch(&spec, &model, period, &growth_rates)).await?;

    Ok(Json(ForecastResponse {
        forecast: result.points().to_vec(),
    }))
}

pub async fn evaluate(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> ApiResult<Json<EvaluationReport>> {
    let Json(req) = payload?;
    let period = horizon(req.period)?;
    let spec = SeriesSpec::new(req.table_name, req.ds_column, req.y_column)
        .with_regressors(req.regressors);
    let growth_rates = req.growth_rates;
    let selection = req.strategies;

    tracing::info!(table = %spec.table, period, "evaluation requested");

    let harness = state.harness.clone();
    let report = blocking(move || {
        harness.evaluate_table(&spec, period, &growth_rates, selection.as_deref())
    })
    .await?;

    Ok(Json(report))
}

fn horizon(period: i64) -> ApiResult<usize> {
    usize::try_from(period)
        .map_err(|_| ApiError::BadRequest(format!("period must not be negative, got {}", period)))
}

/// Run store and strategy work off the async runtime
async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> forecast_eval::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("worker failed: {}", e)))?
        .map_err(ApiError::from)
}

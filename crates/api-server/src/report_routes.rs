//! Report API Routes
//!
//! Stock data retrieval, report generation, and the combined one-shot endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::{Days, NaiveDate, Utc};
use market_core::{normalize_symbol, TickerRequest, TickerResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AppError, AppState};

#[cfg(test)]
#[path = "report_routes_tests.rs"]
mod report_routes_tests;

const INVALID_TICKERS: &str = "Invalid tickers provided";

/// Body for `/api/stock-data` and `/api/report`.
///
/// `tickers` stays untyped so a wrong shape is reported as a ticker problem
/// rather than a generic JSON error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDataRequest {
    #[serde(default)]
    pub tickers: Option<Value>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDataResponse {
    pub stock_data: Vec<TickerResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiReportRequest {
    pub stock_data: Vec<TickerResult>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AiReportResponse {
    pub report: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullReportResponse {
    pub report: String,
    pub stock_data: Vec<TickerResult>,
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stock-data", post(stock_data))
        .route("/api/ai-report", post(ai_report))
        .route("/api/report", post(full_report))
}

fn parse_tickers(raw: Option<Value>) -> Result<Vec<String>, AppError> {
    let items = match raw {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(AppError::bad_request(INVALID_TICKERS)),
    };

    items
        .iter()
        .map(|item| {
            item.as_str()
                .and_then(|s| normalize_symbol(s).ok())
                .ok_or_else(|| AppError::bad_request(INVALID_TICKERS))
        })
        .collect()
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                AppError::bad_request(format!("Invalid {} '{}': expected YYYY-MM-DD", field, s))
            })
        })
        .transpose()
}

/// Validate a stock-data body into a [`TickerRequest`]. Missing dates default
/// to the `lookback_days` window ending today (UTC).
pub fn build_ticker_request(body: StockDataRequest, lookback_days: u64) -> Result<TickerRequest, AppError> {
    let symbols = parse_tickers(body.tickers)?;
    let start = parse_date("startDate", body.start_date.as_deref())?;
    let end = parse_date("endDate", body.end_date.as_deref())?;

    let end = end.unwrap_or_else(|| Utc::now().date_naive());
    let start = match start {
        Some(start) => start,
        None => end.checked_sub_days(Days::new(lookback_days)).ok_or_else(|| {
            AppError::bad_request(format!("Cannot look back {} days from {}", lookback_days, end))
        })?,
    };

    TickerRequest::new(symbols, start, end).map_err(|e| AppError::bad_request(e.reason()))
}

fn reject_body(rejection: JsonRejection) -> AppError {
    AppError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
}

async fn stock_data(
    State(state): State<AppState>,
    body: Result<Json<StockDataRequest>, JsonRejection>,
) -> Result<Json<StockDataResponse>, AppError> {
    let Json(body) = body.map_err(reject_body)?;
    let request = build_ticker_request(body, state.default_lookback_days)?;

    let orchestrator = state.orchestrator.clone();
    let stock_data = tokio::spawn(async move { orchestrator.fetch_stock_data(&request).await })
        .await
        .map_err(|e| AppError::internal("Failed to fetch stock data", e.into()))?;

    Ok(Json(StockDataResponse { stock_data }))
}

async fn ai_report(
    State(state): State<AppState>,
    body: Result<Json<AiReportRequest>, JsonRejection>,
) -> Result<Json<AiReportResponse>, AppError> {
    let Json(AiReportRequest { stock_data, prompt }) = body.map_err(reject_body)?;
    let prompt = prompt.unwrap_or_default();

    let orchestrator = state.orchestrator.clone();
    let report = tokio::spawn(async move { orchestrator.generate_report(&stock_data, &prompt).await })
        .await
        .map_err(|e| AppError::internal("Failed to generate AI report", e.into()))?;

    Ok(Json(AiReportResponse { report: report.body }))
}

async fn full_report(
    State(state): State<AppState>,
    body: Result<Json<StockDataRequest>, JsonRejection>,
) -> Result<Json<FullReportResponse>, AppError> {
    let Json(body) = body.map_err(reject_body)?;
    let request = build_ticker_request(body, state.default_lookback_days)?;

    let orchestrator = state.orchestrator.clone();
    let (stock_data, report) = tokio::spawn(async move { orchestrator.run(&request).await })
        .await
        .map_err(|e| AppError::internal("Failed to generate report", e.into()))?;

    Ok(Json(FullReportResponse {
        report: report.body,
        stock_data,
    }))
}

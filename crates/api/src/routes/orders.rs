//! Order submission, lookup, audit trail, search and report endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use broker::Broker;
use cache::Cache;
use chrono::TimeDelta;
use common::OrderId;
use domain::{OrderSubmission, ProcessingLog};
use order_store::{DEFAULT_REPORT_WINDOW_DAYS, OrderReport, OrderStore};
use search::{DEFAULT_PAGE_SIZE, SearchDocument, SearchIndex, SearchQuery};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::ingestion::{IngestionService, SubmitReceipt};
use crate::reader::{OrderLookup, OrderReader};

/// Shared application state accessible from all handlers.
pub struct AppState<S, B, C, I>
where
    S: OrderStore,
    B: Broker,
    C: Cache,
    I: SearchIndex,
{
    pub ingestion: IngestionService<S, B, I>,
    pub reader: OrderReader<S, C, I>,
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub input: String,
    #[serde(default = "first_page")]
    pub page: usize,
    #[serde(default = "default_size")]
    pub size: usize,
}

fn first_page() -> usize {
    1
}

fn default_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    /// Look-back window in days.
    pub days: Option<i64>,
}

// -- Response types --

#[derive(Serialize)]
pub struct SearchResponse {
    pub from: usize,
    pub size: usize,
    pub results: Vec<SearchDocument>,
}

// -- Handlers --

/// POST /orders
#[tracing::instrument(skip_all)]
pub async fn submit<S, B, C, I>(
    State(state): State<Arc<AppState<S, B, C, I>>>,
    payload: Result<Json<OrderSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitReceipt>), ApiError>
where
    S: OrderStore + 'static,
    B: Broker + 'static,
    C: Cache + 'static,
    I: SearchIndex + 'static,
{
    let Json(submission) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let receipt = state.ingestion.submit_order(submission).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S, B, C, I>(
    State(state): State<Arc<AppState<S, B, C, I>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderLookup>, ApiError>
where
    S: OrderStore + 'static,
    B: Broker + 'static,
    C: Cache + 'static,
    I: SearchIndex + 'static,
{
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.reader.get_order(order_id).await?))
}

/// GET /orders/{id}/logs
#[tracing::instrument(skip(state))]
pub async fn logs<S, B, C, I>(
    State(state): State<Arc<AppState<S, B, C, I>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ProcessingLog>>, ApiError>
where
    S: OrderStore + 'static,
    B: Broker + 'static,
    C: Cache + 'static,
    I: SearchIndex + 'static,
{
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.reader.processing_logs(order_id).await?))
}

/// POST /orders/search
///
/// An input that names a status filters by it; anything else is free text.
#[tracing::instrument(skip_all)]
pub async fn search<S, B, C, I>(
    State(state): State<Arc<AppState<S, B, C, I>>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError>
where
    S: OrderStore + 'static,
    B: Broker + 'static,
    C: Cache + 'static,
    I: SearchIndex + 'static,
{
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let query = SearchQuery::from_input(&req.input, req.page, req.size);
    let results = state.reader.search(&query).await?;
    Ok(Json(SearchResponse {
        from: query.from,
        size: query.size,
        results,
    }))
}

/// GET /orders/report
#[tracing::instrument(skip(state))]
pub async fn report<S, B, C, I>(
    State(state): State<Arc<AppState<S, B, C, I>>>,
    Query(params): Query<ReportParams>,
) -> Result<Json<OrderReport>, ApiError>
where
    S: OrderStore + 'static,
    B: Broker + 'static,
    C: Cache + 'static,
    I: SearchIndex + 'static,
{
    let days = params.days.unwrap_or(DEFAULT_REPORT_WINDOW_DAYS);
    let window = TimeDelta::try_days(days)
        .filter(|_| days > 0)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid report window: {days} days")))?;
    Ok(Json(state.reader.report(window).await?))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse::<i64>()
        .map(OrderId::new)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id {id:?}: {e}")))
}

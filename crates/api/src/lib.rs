//! Order intake and read side of the fulfillment pipeline.
//!
//! - [`IngestionService`]: validates and stores orders, then enqueues a
//!   fulfillment event and indexes the new order (both best effort)
//! - [`OrderReader`]: cache-aside order lookup, audit trail, search, report
//! - a thin axum router over both, with Prometheus metrics and request tracing
//!
//! The `api` binary serves the router; the `worker` binary runs the
//! fulfillment consumer loop against the same backing services.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod reader;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use broker::Broker;
use cache::Cache;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use search::SearchIndex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, LogFormat};
pub use error::ApiError;
pub use ingestion::{IngestError, IngestionService, SubmitReceipt};
pub use reader::{OrderLookup, OrderReader, ReadError, ReadSource};
pub use routes::orders::AppState;

/// Wires the services over one set of backing adapters.
pub fn create_state<S, B, C, I>(
    store: S,
    broker: B,
    cache: C,
    index: I,
    cache_ttl: Duration,
) -> Arc<AppState<S, B, C, I>>
where
    S: OrderStore + Clone,
    B: Broker,
    C: Cache,
    I: SearchIndex + Clone,
{
    Arc::new(AppState {
        ingestion: IngestionService::new(store.clone(), broker, index.clone()),
        reader: OrderReader::new(store, cache, index, cache_ttl),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, B, C, I>(
    state: Arc<AppState<S, B, C, I>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: OrderStore + 'static,
    B: Broker + 'static,
    C: Cache + 'static,
    I: SearchIndex + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::submit::<S, B, C, I>))
        .route("/orders/search", post(routes::orders::search::<S, B, C, I>))
        .route("/orders/report", get(routes::orders::report::<S, B, C, I>))
        .route("/orders/{id}", get(routes::orders::get::<S, B, C, I>))
        .route("/orders/{id}/logs", get(routes::orders::logs::<S, B, C, I>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

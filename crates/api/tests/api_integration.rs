//! Integration tests for the HTTP surface.

use std::sync::OnceLock;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use broker::{Broker, InMemoryBroker};
use cache::InMemoryCache;
use futures_util::StreamExt;
use fulfillment::{FulfillmentWorker, SimulatedPaymentGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use search::InMemorySearchIndex;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    router: axum::Router,
    store: InMemoryOrderStore,
    broker: InMemoryBroker,
    cache: InMemoryCache,
    index: InMemorySearchIndex,
}

impl TestApp {
    fn new() -> Self {
        let store = InMemoryOrderStore::new();
        let broker = InMemoryBroker::new();
        let cache = InMemoryCache::new();
        let index = InMemorySearchIndex::new();
        let state = api::create_state(
            store.clone(),
            broker.clone(),
            cache.clone(),
            index.clone(),
            Duration::from_secs(30),
        );

        Self {
            router: api::create_app(state, get_metrics_handle()),
            store,
            broker,
            cache,
            index,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Drains the queue through a real worker.
    async fn run_worker(&self) {
        let worker = FulfillmentWorker::new(
            self.store.clone(),
            self.index.clone(),
            SimulatedPaymentGateway::new(Duration::from_millis(1)),
            self.cache.clone(),
        );
        let mut deliveries = self.broker.consume().await.unwrap();
        while self.broker.ready_count() > 0 {
            let delivery = deliveries.next().await.unwrap().unwrap();
            worker.handle_delivery(delivery).await.unwrap();
        }
    }
}

fn order_body(email: &str) -> Value {
    json!({
        "customer": {"name": "Ada", "email": email, "phone": "5551234567"},
        "items": [
            {"sku": "SKU-1", "name": "Widget", "qty": 1, "price": 10.00},
            {"sku": "SKU-2", "name": "Gadget", "qty": 3, "price": 5.00}
        ],
        "shipping": {"method": "express", "address": "1 Main St"}
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let (status, json) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_submit_order_returns_created() {
    let app = TestApp::new();

    let (status, json) = app.post("/orders", order_body("ada@example.com")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["orderId"], 1);
    assert_eq!(json["enqueued"], true);
    assert_eq!(json["indexed"], true);
    assert_eq!(app.broker.ready_count(), 1);
}

#[tokio::test]
async fn test_submit_invalid_order_names_field() {
    let app = TestApp::new();
    let mut body = order_body("ada@example.com");
    body["items"][1]["qty"] = json!(0);

    let (status, json) = app.post("/orders", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "items[1].qty");
    assert!(json["error"].is_string());
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_submit_malformed_json() {
    let app = TestApp::new();

    let (status, json) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_submit_store_failure_is_internal_error() {
    let app = TestApp::new();
    app.store.set_fail_on_create_order(true).await;

    let (status, json) = app.post("/orders", order_body("ada@example.com")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "internal server error");
    assert_eq!(app.broker.ready_count(), 0);
}

#[tokio::test]
async fn test_get_order_reads_through_cache() {
    let app = TestApp::new();
    let (_, created) = app.post("/orders", order_body("ada@example.com")).await;
    let uri = format!("/orders/{}", created["orderId"]);

    let (status, first) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["source"], "store");
    assert_eq!(first["order"]["status"], "pending");
    assert_eq!(first["order"]["customer"]["name"], "Ada");

    let (_, second) = app.get(&uri).await;
    assert_eq!(second["source"], "cache");
    assert_eq!(second["order"], first["order"]);
}

#[tokio::test]
async fn test_get_unknown_order() {
    let app = TestApp::new();

    let (status, json) = app.get("/orders/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("404"));

    let (status, _) = app.get("/orders/not-a-number").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_pipeline_through_http() {
    let app = TestApp::new();
    let (_, created) = app.post("/orders", order_body("ada@example.com")).await;
    let order_id = created["orderId"].as_i64().unwrap();

    app.run_worker().await;

    let (status, logs) = app.get(&format!("/orders/{order_id}/logs")).await;
    assert_eq!(status, StatusCode::OK);
    let entries: Vec<(String, String)> = logs
        .as_array()
        .unwrap()
        .iter()
        .map(|log| {
            (
                log["step"].as_str().unwrap().to_string(),
                log["status"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        entries,
        vec![
            ("validation".to_string(), "success".to_string()),
            ("payment".to_string(), "processing".to_string()),
            ("payment".to_string(), "success".to_string()),
            ("invoice".to_string(), "success".to_string()),
        ]
    );

    let (_, found) = app
        .post("/orders/search", json!({"input": "completed"}))
        .await;
    let results = found["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["orderId"], order_id);

    let (_, pending) = app.post("/orders/search", json!({"input": "pending"})).await;
    assert!(pending["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_by_text_with_paging() {
    let app = TestApp::new();
    app.post("/orders", order_body("ada@example.com")).await;
    app.post("/orders", order_body("bob@example.com")).await;

    let (status, json) = app
        .post("/orders/search", json!({"input": "widgte", "page": 2, "size": 1}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["from"], 1);
    assert_eq!(json["size"], 1);
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_rejects_bad_body_with_json_error() {
    let app = TestApp::new();

    let (status, json) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/orders/search")
                .header("content-type", "application/json")
                .body(Body::from("{\"input\": 5"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, json) = app.post("/orders/search", json!({"input": 5})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, json) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/orders/search")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_logs_of_unknown_order() {
    let app = TestApp::new();

    let (status, _) = app.get("/orders/9/logs").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_report() {
    let app = TestApp::new();
    app.post("/orders", order_body("ada@example.com")).await;
    app.run_worker().await;
    app.post("/orders", order_body("bob@example.com")).await;

    let (status, json) = app.get("/orders/report").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["statusCounts"],
        json!([
            {"status": "pending", "totalOrders": 1},
            {"status": "completed", "totalOrders": 1}
        ])
    );
    // four log rows, two items each
    let transitions = json["recentTransitions"].as_array().unwrap();
    assert_eq!(transitions.len(), 8);
    assert!(transitions.iter().all(|t| t["orderId"] == 1));
    assert_eq!(transitions[0]["shippingMethod"], "express");

    let (status, _) = app.get("/orders/report?days=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = TestApp::new();
    app.post("/orders", order_body("ada@example.com")).await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orders_submitted_total"));
}

#[tokio::test]
async fn test_publish_failure_still_creates_order() {
    let app = TestApp::new();
    app.broker.set_fail_publish(true);

    let (status, json) = app.post("/orders", order_body("ada@example.com")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["enqueued"], false);
    let (status, _) = app.get(&format!("/orders/{}", json["orderId"])).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_index_unavailable_reports_not_indexed() {
    let app = TestApp::new();
    app.index.set_unavailable(true);

    let (status, json) = app.post("/orders", order_body("ada@example.com")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["indexed"], false);

    let (status, _) = app.post("/orders/search", json!({"input": "widget"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

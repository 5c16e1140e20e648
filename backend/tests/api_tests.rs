//! HTTP API smoke tests
//!
//! Drive the router end to end over an in-memory store.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::*;
use delivery_tracker::config::{
    Config, ReceiptsConfig, ServerConfig, StorageConfig, WebhookConfig, WebhookMode,
};
use delivery_tracker::{create_app, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        storage: StorageConfig {
            database_url: "sqlite::memory:".to_string(),
            primary_enabled: false,
            fallback_dir: "unused".to_string(),
            max_connections: 1,
        },
        webhook: WebhookConfig {
            mode: WebhookMode::Test,
            test_url: "http://localhost/webhook".to_string(),
            production_url: "http://localhost/webhook".to_string(),
            timeout_secs: 1,
        },
        receipts: ReceiptsConfig {
            endpoint: "http://localhost/receipts".to_string(),
            timeout_secs: 1,
            default_location: shared::RECEIPT_LOCATION.to_string(),
        },
    }
}

async fn app() -> (Router, Arc<FakeEndpoint>) {
    let (_, store) = memory_store().await;
    let endpoint = FakeEndpoint::new();
    let state = AppState {
        store,
        config: Arc::new(test_config()),
        submission_endpoint: endpoint.clone(),
        recognizer: Arc::new(FakeRecognizer { candidates: Vec::new() }),
    };
    (create_app(state), endpoint)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_reports_degraded_fallback() {
    let (app, _) = app().await;

    let (status, body) = call(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["store"], "degraded");
}

#[tokio::test]
async fn test_purchase_draft_round_trip() {
    let (app, endpoint) = app().await;

    let (status, draft) = call(
        &app,
        Method::POST,
        "/api/v1/drafts/purchase/Market/items",
        Some(json!({
            "productName": "Tomatoes",
            "quantity": 3,
            "unit": "kg",
            "pricePerUnit": 12.5,
            "location": "Market"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(draft["locationName"], "Market");
    assert_eq!(draft["items"][0]["type"], "Purchase");

    let (status, list) = call(&app, Method::GET, "/api/v1/drafts/purchase", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["itemCount"], 1);

    let (status, _) = call(&app, Method::POST, "/api/v1/drafts/purchase/Market/submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(endpoint.batch_count(), 1);

    let (_, stock) = call(&app, Method::GET, "/api/v1/inventory/Tomatoes/kg", None).await;
    assert_eq!(stock["quantity"], 3.0);

    let (_, history) = call(&app, Method::GET, "/api/v1/history?limit=10", None).await;
    assert_eq!(history.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_invalid_item_is_bad_request() {
    let (app, _) = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/drafts/purchase/Market/items",
        Some(json!({
            "productName": "Tomatoes",
            "quantity": 0,
            "unit": "kg",
            "location": "Market"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "quantity");
}

#[tokio::test]
async fn test_unloading_without_stock_is_rejected() {
    let (app, _) = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/drafts/unloading/StoreX/items",
        Some(json!({
            "productName": "Lemons",
            "quantity": 2,
            "unit": "kg",
            "location": "StoreX"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_STOCK");

    let (_, body) = call(&app, Method::POST, "/api/v1/drafts/unloading/StoreX/submit", None).await;
    assert_eq!(body["error"]["code"], "EMPTY_DRAFT");
}

#[tokio::test]
async fn test_inventory_delete_also_clears_history() {
    let (app, _) = app().await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/history",
        Some(json!({
            "productName": "Tomatoes",
            "quantity": 2,
            "unit": "kg",
            "pricePerUnit": 10,
            "location": "Market",
            "type": "Purchase"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(&app, Method::DELETE, "/api/v1/inventory", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, stock) = call(&app, Method::GET, "/api/v1/inventory", None).await;
    assert_eq!(stock.as_array().map(Vec::len), Some(0));
    let (_, history) = call(&app, Method::GET, "/api/v1/history", None).await;
    assert_eq!(history.as_array().map(Vec::len), Some(0));
}

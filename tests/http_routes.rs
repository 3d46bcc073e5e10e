//! HTTP Route Tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use emberq::http_server::{build_router, HttpServerConfig};
use emberq::registry::TopicRegistry;
use emberq::topic::TopicConfig;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn setup(dir: &TempDir) -> (Router, Arc<TopicRegistry>) {
    let config = TopicConfig {
        sweep_interval: Duration::from_secs(3600),
        ..TopicConfig::default()
    };
    let registry = Arc::new(TopicRegistry::new(dir.path(), config));
    let router = build_router(&HttpServerConfig::default(), Arc::clone(&registry));
    (router, registry)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let temp = TempDir::new().unwrap();
    let (app, _) = setup(&temp);

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_produce_consume_ack_round() {
    let temp = TempDir::new().unwrap();
    let (app, _) = setup(&temp);

    let (status, body) = send(&app, "POST", "/produce/orders", Some(json!({"message": "hello"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);

    let (status, body) = send(&app, "GET", "/consume/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["payload"], "hello");
    assert_eq!(body["retries"], 0);

    let (status, body) = send(&app, "POST", "/ack/orders/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["acknowledged"], true);

    let (status, body) = send(&app, "POST", "/ack/orders/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["acknowledged"], false);
}

#[tokio::test]
async fn test_consume_empty_and_unknown() {
    let temp = TempDir::new().unwrap();
    let (app, registry) = setup(&temp);

    let (status, _) = send(&app, "GET", "/consume/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    registry.create_topic("idle").unwrap();
    let (status, body) = send(&app, "GET", "/consume/idle", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_ack_errors() {
    let temp = TempDir::new().unwrap();
    let (app, registry) = setup(&temp);
    registry.create_topic("orders").unwrap();

    let (status, _) = send(&app, "POST", "/ack/orders/not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/ack/missing/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_produce_rejects_bad_topic_name() {
    let temp = TempDir::new().unwrap();
    let (app, registry) = setup(&temp);

    let (status, body) = send(&app, "POST", "/produce/.hidden", Some(json!({"message": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert!(registry.is_empty());

    let path = format!("/produce/{}", "n".repeat(255));
    let (status, _) = send(&app, "POST", &path, Some(json!({"message": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_topics_and_metrics() {
    let temp = TempDir::new().unwrap();
    let (app, _) = setup(&temp);

    for topic in ["b", "a"] {
        send(&app, "POST", &format!("/produce/{}", topic), Some(json!({"message": "m"}))).await;
    }
    send(&app, "GET", "/consume/a", None).await;

    let (status, body) = send(&app, "GET", "/topics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topics"], json!(["a", "b"]));

    let (status, body) = send(&app, "GET", "/observability/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    let topics = body["topics"].as_array().unwrap();
    assert_eq!(topics.len(), 2);
    assert_eq!(topics[0]["name"], "a");
    assert_eq!(topics[0]["pending"], 0);
    assert_eq!(topics[0]["in_flight"], 1);
    assert_eq!(topics[0]["metrics"]["delivered"], 1);
    assert_eq!(topics[1]["pending"], 1);
}

//! Queue HTTP Routes
//!
//! Produce, consume and acknowledge over JSON.
//!
//! | route                     | success                    | other            |
//! |---------------------------|----------------------------|------------------|
//! | `POST /produce/:topic`    | 200 `{"id"}`               | 400 bad name     |
//! | `GET /consume/:topic`     | 200 message, 204 empty     | 404 no topic     |
//! | `POST /ack/:topic/:id`    | 200 `{"acknowledged"}`     | 404, 400 bad id  |
//! | `GET /topics`             | 200 `{"topics": [...]}`    |                  |
//!
//! Topic calls may block on the topic lock or a full WAL channel, so they
//! run on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::registry::TopicRegistry;
use crate::topic::Message;

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct ProduceRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProduceResponse {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub acknowledged: bool,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub topics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: status.as_u16(),
        }),
    )
}

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

// ==================
// Queue Routes
// ==================

/// Create queue routes
pub fn queue_routes(registry: Arc<TopicRegistry>) -> Router {
    Router::new()
        .route("/produce/:topic", post(produce_handler))
        .route("/consume/:topic", get(consume_handler))
        .route("/ack/:topic/:id", post(ack_handler))
        .route("/topics", get(list_topics_handler))
        .with_state(registry)
}

async fn produce_handler(
    State(registry): State<Arc<TopicRegistry>>,
    Path(topic): Path<String>,
    Json(request): Json<ProduceRequest>,
) -> Result<Json<ProduceResponse>, ApiError> {
    let result = blocking(move || registry.enqueue(&topic, request.message)).await?;

    match result {
        Ok(id) => Ok(Json(ProduceResponse { id })),
        Err(e) if e.is_invalid_name() => Err(api_error(StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

async fn consume_handler(
    State(registry): State<Arc<TopicRegistry>>,
    Path(topic): Path<String>,
) -> Result<Response, ApiError> {
    let Some(topic) = registry.get_topic(&topic) else {
        return Err(api_error(StatusCode::NOT_FOUND, "Topic not found"));
    };

    let message: Option<Message> = blocking(move || topic.dequeue()).await?;

    Ok(match message {
        Some(message) => Json(message).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

async fn ack_handler(
    State(registry): State<Arc<TopicRegistry>>,
    Path((topic, id)): Path<(String, String)>,
) -> Result<Json<AckResponse>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, format!("Invalid message id: {}", id)))?;

    let Some(topic) = registry.get_topic(&topic) else {
        return Err(api_error(StatusCode::NOT_FOUND, "Topic not found"));
    };

    let acknowledged = blocking(move || topic.acknowledge(id)).await?;
    Ok(Json(AckResponse { acknowledged }))
}

async fn list_topics_handler(State(registry): State<Arc<TopicRegistry>>) -> Json<TopicsResponse> {
    Json(TopicsResponse {
        topics: registry.topic_names(),
    })
}

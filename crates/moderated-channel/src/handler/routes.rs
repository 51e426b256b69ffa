//! Route definitions for the Moderated Channel
//!
//! - GET /health - channel identity
//! - GET / - full message log
//! - POST / - submit one message through the moderation pipeline
//! - GET /metrics - Prometheus exposition
//!
//! Errors are plain-text bodies; hub clients only look at the status and
//! the message.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::{require_authkey, AppState};
use crate::contracts::{HealthResponse, InboundMessage, Message, MissingField};
use crate::engine::PipelineError;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    NoMessage,
    InvalidMessage(String),
    MissingField(MissingField),
    ModerationUnavailable,
    StoreFailed,
    ReadFailed,
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized
            | ApiError::NoMessage
            | ApiError::InvalidMessage(_)
            | ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
            ApiError::ModerationUnavailable => StatusCode::BAD_GATEWAY,
            ApiError::StoreFailed | ApiError::ReadFailed | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Invalid authorization".to_string(),
            ApiError::NoMessage => "No message".to_string(),
            ApiError::InvalidMessage(detail) => format!("Invalid message: {}", detail),
            ApiError::MissingField(field) => field.to_string(),
            ApiError::ModerationUnavailable => "Moderation unavailable".to_string(),
            ApiError::StoreFailed => "Failed to store message".to_string(),
            ApiError::ReadFailed => "Failed to read messages".to_string(),
            ApiError::Internal(_) => "Internal error".to_string(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::MissingField(field) => ApiError::MissingField(field),
            PipelineError::Moderation(_) => ApiError::ModerationUnavailable,
            PipelineError::Store(_) => ApiError::StoreFailed,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Internal error");
        }
        (self.status_code(), self.message()).into_response()
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/", get(list_messages).post(submit_message))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        // Added before auth so that auth wraps it and rejects first
        .route_layer(RequestBodyLimitLayer::new(body_limit))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_authkey))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - channel identity
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        name: state.config.name.clone(),
    })
}

/// GET / - full message log in display order
pub async fn list_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state.pipeline.history().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read message log");
        ApiError::ReadFailed
    })?;
    Ok(Json(messages))
}

/// POST / - run one message through the pipeline
pub async fn submit_message(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    let inbound = parse_inbound(&body)?;
    state.pipeline.process(inbound).await?;
    Ok("OK")
}

/// GET /metrics - Prometheus text format
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .encode_text()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// Decode a `POST /` body; empty, non-JSON and non-object bodies are "no message"
fn parse_inbound(body: &[u8]) -> Result<InboundMessage, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::NoMessage)?;

    match &value {
        Value::Object(fields) if !fields.is_empty() => {}
        _ => return Err(ApiError::NoMessage),
    }

    serde_json::from_value(value).map_err(|e| ApiError::InvalidMessage(e.to_string()))
}

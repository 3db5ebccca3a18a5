//! Call event handlers.

use crate::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use callcenter_types::{CallEnded, CallStarted, SilenceEvent, UtteranceEvent, VoiceDirective};
use serde_json::{json, Value};
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

fn require_call(call_id: &str, caller: &str) -> Result<(), ApiError> {
    require("callId", call_id)?;
    require("caller", caller)
}

/// Handler for `GET /health`.
pub async fn health_handler(Extension(state): Extension<AppState>) -> Json<Value> {
    let controller = &state.controller;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": controller.model_name(),
        "voice": controller.settings().voice,
        "activeCalls": controller.active_calls().await,
    }))
}

/// Handler for `POST /api/calls/start`. Returns the greeting.
pub async fn start_call_handler(
    Extension(state): Extension<AppState>,
    Json(event): Json<CallStarted>,
) -> Result<Json<VoiceDirective>, ApiError> {
    require_call(&event.call_id, &event.caller)?;
    Ok(Json(state.controller.start_call(&event).await))
}

/// Handler for `POST /api/calls/utterance`.
pub async fn utterance_handler(
    Extension(state): Extension<AppState>,
    Json(event): Json<UtteranceEvent>,
) -> Result<Json<VoiceDirective>, ApiError> {
    require_call(&event.call_id, &event.caller)?;
    if let Some(confidence) = event.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ApiError::BadRequest(format!(
                "confidence must be between 0 and 1, got {confidence}"
            )));
        }
    }

    let outcome = state.controller.handle_utterance(&event).await;
    if !outcome.warnings.is_empty() {
        tracing::warn!(
            call_id = %event.call_id,
            warnings = ?outcome.warnings,
            "turn completed on a degraded path"
        );
    }
    Ok(Json(outcome.directive))
}

/// Handler for `POST /api/calls/silence`.
pub async fn silence_handler(
    Extension(state): Extension<AppState>,
    Json(event): Json<SilenceEvent>,
) -> Result<Json<VoiceDirective>, ApiError> {
    require_call(&event.call_id, &event.caller)?;
    Ok(Json(state.controller.handle_silence(&event).await))
}

/// Handler for `POST /api/calls/status`. Logs the call end; no body.
pub async fn call_status_handler(
    Extension(state): Extension<AppState>,
    Json(event): Json<CallEnded>,
) -> Result<StatusCode, ApiError> {
    require("callId", &event.call_id)?;
    state.controller.end_call(&event).await;
    Ok(StatusCode::NO_CONTENT)
}

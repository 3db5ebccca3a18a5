//! HTTP surface for the call center voice agent.
//!
//! The voice transport posts call events here and renders the returned
//! directive. All routing decisions live in [`CallController`]; the handlers
//! only validate input and translate to and from JSON.

pub mod api;
pub mod bootstrap;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use callcenter_voice::CallController;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Maximum request body size (64 KiB). Call events are small JSON objects.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<CallController>,
}

impl AppState {
    pub fn new(controller: CallController) -> Self {
        Self {
            controller: Arc::new(controller),
        }
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health_handler))
        .route("/api/calls/start", post(api::start_call_handler))
        .route("/api/calls/utterance", post(api::utterance_handler))
        .route("/api/calls/silence", post(api::silence_handler))
        .route("/api/calls/status", post(api::call_status_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

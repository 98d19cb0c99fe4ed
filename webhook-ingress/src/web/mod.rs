//! Web server module for the payment webhook.
//!
//! This module provides a thin web server that:
//! - Receives payment notifications from the provider
//! - Hands them to the ingress for verification
//! - Answers with the provider-facing JSON body

pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, payment_webhook, AppState, HealthResponse, WebhookAccepted, WebhookRejected,
};

/// Build the application router.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(payment_webhook))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Webhook endpoint handlers.
//!
//! Handlers are thin: they hand the parsed body to [`WebhookIngress`] and
//! translate its outcome into the provider-facing response.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::ingress::{IngressOutcome, WebhookIngress};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub ingress: Arc<WebhookIngress>,
}

impl AppState {
    pub fn new(ingress: WebhookIngress) -> Self {
        Self {
            ingress: Arc::new(ingress),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Payment Webhook
// =============================================================================

/// Body returned for an accepted notification.
#[derive(Serialize)]
pub struct WebhookAccepted {
    pub success: bool,
}

/// Body returned for a rejected notification.
#[derive(Serialize)]
pub struct WebhookRejected {
    pub error: &'static str,
}

impl IntoResponse for IngressOutcome {
    fn into_response(self) -> Response {
        match self {
            IngressOutcome::Rejected => (
                StatusCode::BAD_REQUEST,
                Json(WebhookRejected {
                    error: "Invalid signature",
                }),
            )
                .into_response(),
            IngressOutcome::AcceptedNoOp | IngressOutcome::AcceptedMarkPaid { .. } => {
                (StatusCode::OK, Json(WebhookAccepted { success: true })).into_response()
            }
        }
    }
}

/// Payment provider webhook endpoint.
///
/// The body is parsed as JSON whatever its Content-Type says; the provider
/// does not reliably send one. Bodies that are not JSON get a 400.
pub async fn payment_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, body_length = body.len(), "payment_webhook_invalid_json");
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookRejected {
                    error: "Invalid JSON body",
                }),
            )
                .into_response();
        }
    };

    info!(
        field_count = body.as_object().map(|o| o.len()).unwrap_or(0),
        "payment_webhook_received"
    );

    let outcome = state.ingress.handle_notification(&body).await;

    info!(accepted = outcome.is_accepted(), "payment_webhook_handled");

    outcome.into_response()
}

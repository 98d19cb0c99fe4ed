//! Payment notification acceptance.
//!
//! Every notification ends in exactly one of three outcomes:
//!
//! ```text
//! Received → Rejected
//!          → AcceptedNoOp
//!          → AcceptedMarkPaid
//! ```
//!
//! The signature check runs before anything else looks at the payload.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::{AppSecret, Config};
use crate::notification::WebhookNotification;
use crate::orders::{MarkPaid, OrderStore};
use crate::signature::{verify_signature, SignatureScheme};

/// Result of handling one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressOutcome {
    /// Signature missing, invalid, or payload unreadable.
    Rejected,
    /// Authentic, but nothing to do.
    AcceptedNoOp,
    /// Authentic payment completion. `persisted` is false when the order
    /// store call failed.
    AcceptedMarkPaid { order_id: String, persisted: bool },
}

impl IngressOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Verifies payment notifications and applies paid transitions.
pub struct WebhookIngress {
    scheme: SignatureScheme,
    secret: AppSecret,
    orders: Arc<dyn OrderStore>,
}

impl WebhookIngress {
    pub fn new(scheme: SignatureScheme, secret: AppSecret, orders: Arc<dyn OrderStore>) -> Self {
        Self {
            scheme,
            secret,
            orders,
        }
    }

    pub fn from_config(config: &Config, orders: Arc<dyn OrderStore>) -> Self {
        Self::new(config.signature_scheme, config.app_secret.clone(), orders)
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    /// Authenticate a notification body and, for completed payments, mark
    /// the order paid.
    ///
    /// Order store failures are logged and still acknowledged so the
    /// provider does not keep redelivering.
    pub async fn handle_notification(&self, body: &Value) -> IngressOutcome {
        let notification = match WebhookNotification::from_json(body) {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "webhook_payload_unreadable");
                return IngressOutcome::Rejected;
            }
        };

        if !verify_signature(self.scheme, &notification, &self.secret) {
            return IngressOutcome::Rejected;
        }

        let order_id = notification.order_id();
        let status = notification.status();

        info!(
            order_id = ?order_id,
            status = ?status,
            field_count = notification.fields().len(),
            "webhook_signature_verified"
        );

        if !status.as_ref().is_some_and(|s| s.is_paid()) {
            return IngressOutcome::AcceptedNoOp;
        }

        let Some(order_id) = order_id else {
            warn!("webhook_paid_without_order_id");
            return IngressOutcome::AcceptedNoOp;
        };

        let persisted = match self.orders.mark_order_paid(&order_id).await {
            Ok(MarkPaid::Marked) => {
                info!(order_id = %order_id, "order_paid");
                true
            }
            Ok(MarkPaid::AlreadyPaid) => {
                info!(order_id = %order_id, "order_paid_redelivery");
                true
            }
            Err(e) => {
                error!(order_id = %order_id, error = %e, "order_mark_paid_failed");
                false
            }
        };

        IngressOutcome::AcceptedMarkPaid {
            order_id,
            persisted,
        }
    }
}

//! Storefront payment webhook receiver.
//!
//! Accepts payment status notifications from the payment provider, checks
//! their signature against the shared app secret and marks paid orders.
//!
//! ## Flow
//!
//! ```text
//! POST /webhook → WebhookNotification → verify_signature → OrderStore::mark_order_paid
//! ```

pub mod config;
pub mod error;
pub mod ingress;
pub mod notification;
pub mod orders;
pub mod signature;
pub mod telemetry;
pub mod web;

// Re-export commonly used types
pub use config::{AppSecret, Config};
pub use error::{ConfigError, OrderStoreError, PayloadError};
pub use ingress::{IngressOutcome, WebhookIngress};
pub use notification::{PaymentStatus, ScalarValue, WebhookNotification};
pub use orders::{InMemoryOrderStore, MarkPaid, OrderState, OrderStore};
pub use signature::{canonical_string, sign_notification, verify_signature, SignatureScheme};
pub use web::AppState;

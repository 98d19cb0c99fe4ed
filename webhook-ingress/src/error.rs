//! Error types for the webhook receiver.
//!
//! Only [`ConfigError`] is fatal. Payload errors fold into a rejected
//! notification and order store errors are logged and swallowed by the
//! ingress.

use thiserror::Error;

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("required environment variable {0} is not set")]
    MissingSecret(&'static str),

    /// The configured signature scheme is not supported.
    #[error("unknown signature scheme: {0}")]
    UnknownScheme(String),
}

/// Reasons an inbound body cannot be read as a notification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// The body is valid JSON but not an object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// A top-level field holds an array or object.
    #[error("field {0} is not a scalar value")]
    NonScalarField(String),
}

/// Failures of the order persistence collaborator.
#[derive(Debug, Error)]
pub enum OrderStoreError {
    #[error("order store unavailable: {0}")]
    Unavailable(String),
}

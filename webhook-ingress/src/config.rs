//! Configuration module for environment variable parsing.
//!
//! The provider app secret is required. Everything else falls back to a
//! default, with a warning when a value is present but unparseable.

use std::env;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::ConfigError;
use crate::signature::SignatureScheme;

/// Environment variable holding the provider app secret.
pub const APP_SECRET_VAR: &str = "MIXPAY_APP_SECRET";

/// Name the storefront deployment already sets; read when
/// [`APP_SECRET_VAR`] is unset or blank.
pub const LEGACY_APP_SECRET_VAR: &str = "MIXPAY_APP_ID";

/// Default request body cap for webhook posts.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Provider app secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AppSecret(String);

impl AppSecret {
    /// Wrap a secret, rejecting blank values so a missing secret can never
    /// act as an empty key.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret(APP_SECRET_VAR));
        }
        Ok(Self(secret))
    }

    /// Raw secret bytes for signing. Do not log.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AppSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppSecret(***)")
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Payment provider app secret used to verify webhook signatures
    pub app_secret: AppSecret,

    /// Digest scheme the provider signs with
    pub signature_scheme: SignatureScheme,

    /// Maximum accepted webhook body size in bytes
    pub max_body_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_secret = lookup(APP_SECRET_VAR)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| lookup(LEGACY_APP_SECRET_VAR))
            .ok_or(ConfigError::MissingSecret(APP_SECRET_VAR))
            .and_then(AppSecret::new)?;

        let signature_scheme = match lookup("SIGNATURE_SCHEME") {
            Some(raw) => raw.parse()?,
            None => SignatureScheme::default(),
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080),
            app_secret,
            signature_scheme,
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
        })
    }
}

/// Parse an optional variable, warning and falling back on bad input.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = match lookup(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

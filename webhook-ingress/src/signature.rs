//! Payment webhook signature verification.
//!
//! The provider signs a notification by sorting every field except `sign`
//! by name, joining them as `k=v` pairs with `&`, appending the app secret
//! and taking the lowercase hex MD5 digest. The digest must match theirs
//! bit for bit, so the scheme is fixed per provider but selectable here.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use md5::Md5;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::config::AppSecret;
use crate::error::ConfigError;
use crate::notification::{ScalarValue, WebhookNotification, SIGN_FIELD};

type HmacSha256 = Hmac<Sha256>;

/// Digest algorithm used to sign notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureScheme {
    /// MD5 over the canonical string with the secret appended.
    #[default]
    Md5,
    /// SHA-256 over the canonical string with the secret appended.
    Sha256,
    /// HMAC-SHA256 over the canonical string, keyed by the secret.
    HmacSha256,
}

impl SignatureScheme {
    /// Compute the lowercase hex digest for a notification.
    pub fn digest(&self, notification: &WebhookNotification, secret: &AppSecret) -> String {
        let canonical = canonical_string(notification);

        match self {
            Self::Md5 => {
                let mut hasher = Md5::new();
                hasher.update(canonical.as_bytes());
                hasher.update(secret.expose().as_bytes());
                hex::encode(hasher.finalize())
            }
            Self::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(canonical.as_bytes());
                hasher.update(secret.expose().as_bytes());
                hex::encode(hasher.finalize())
            }
            Self::HmacSha256 => {
                let mut mac = match HmacSha256::new_from_slice(secret.expose().as_bytes()) {
                    Ok(m) => m,
                    Err(_) => {
                        // An empty digest never equals a non-empty sign
                        warn!("webhook_signature_invalid_key");
                        return String::new();
                    }
                };
                mac.update(canonical.as_bytes());
                hex::encode(mac.finalize().into_bytes())
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::HmacSha256 => "hmac-sha256",
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" => Ok(Self::Sha256),
            "hmac-sha256" | "hmac_sha256" => Ok(Self::HmacSha256),
            other => Err(ConfigError::UnknownScheme(other.to_string())),
        }
    }
}

/// Build the string that gets signed: sorted `k=v` pairs joined by `&`,
/// excluding `sign`. Field names sort byte-wise.
pub fn canonical_string(notification: &WebhookNotification) -> String {
    notification
        .fields()
        .iter()
        .filter(|(name, _)| name.as_str() != SIGN_FIELD)
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Verify a notification's `sign` field.
///
/// Returns `false` when `sign` is missing, empty or does not match.
pub fn verify_signature(
    scheme: SignatureScheme,
    notification: &WebhookNotification,
    secret: &AppSecret,
) -> bool {
    let provided = match notification.sign() {
        Some(s) if !s.is_empty() => s,
        _ => {
            warn!(scheme = %scheme, "webhook_signature_missing");
            return false;
        }
    };

    let expected = scheme.digest(notification, secret);

    let valid = constant_time_compare(&expected, provided);

    if !valid {
        warn!(
            scheme = %scheme,
            expected_length = expected.len(),
            actual_length = provided.len(),
            "webhook_signature_mismatch"
        );
    }

    valid
}

/// Return a copy of the notification with `sign` set to its correct digest.
///
/// Mirrors what the provider does before posting; useful for replaying
/// notifications against a local instance.
pub fn sign_notification(
    scheme: SignatureScheme,
    notification: &WebhookNotification,
    secret: &AppSecret,
) -> WebhookNotification {
    let mut signed = notification.clone();
    signed.insert(SIGN_FIELD, ScalarValue::String(scheme.digest(notification, secret)));
    signed
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn secret(s: &str) -> AppSecret {
        AppSecret::new(s).unwrap()
    }

    fn notification(body: Value) -> WebhookNotification {
        WebhookNotification::from_json(&body).unwrap()
    }

    #[test]
    fn test_canonical_string_sorted_and_sign_excluded() {
        let n = notification(json!({
            "status": "PAID",
            "sign": "ignored",
            "orderId": "abc123"
        }));
        assert_eq!(canonical_string(&n), "orderId=abc123&status=PAID");
    }

    #[test]
    fn test_canonical_string_byte_order() {
        // Uppercase sorts before lowercase byte-wise
        let n = notification(json!({"b": 1, "B": 2, "a": 3, "a_b": 4, "ab": 5}));
        assert_eq!(canonical_string(&n), "B=2&a=3&a_b=4&ab=5&b=1");
    }

    #[test]
    fn test_canonical_string_empty() {
        let n = notification(json!({"sign": "x"}));
        assert_eq!(canonical_string(&n), "");
    }

    #[test]
    fn test_md5_known_digest() {
        let n = notification(json!({"orderId": "abc123", "status": "PAID"}));
        assert_eq!(
            SignatureScheme::Md5.digest(&n, &secret("shh")),
            "b79f09768301270c030d1519c0b206e3"
        );
    }

    #[test]
    fn test_md5_mixed_scalars() {
        let n = notification(json!({
            "status": "PAID",
            "paid": true,
            "order_id": 42,
            "amount": 12.5
        }));
        assert_eq!(
            canonical_string(&n),
            "amount=12.5&order_id=42&paid=true&status=PAID"
        );
        assert_eq!(
            SignatureScheme::Md5.digest(&n, &secret("shh")),
            "a375b8272241e8c40ae5dd0405684c3c"
        );
    }

    #[test]
    fn test_sha256_and_hmac_known_digests() {
        let n = notification(json!({"orderId": "abc123", "status": "PAID"}));
        assert_eq!(
            SignatureScheme::Sha256.digest(&n, &secret("shh")),
            "f48bb53570cf48071f7872e418372d97d34a16c61d599e1a6d5860d3a290d55f"
        );
        assert_eq!(
            SignatureScheme::HmacSha256.digest(&n, &secret("shh")),
            "32f5f10b08049bd6e62e565ab1c7196cb629d67e8362a04f1b04029579865675"
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        let n = notification(json!({"orderId": "abc123", "status": "PAID", "amount": 9}));
        let s = secret("shh");
        let first = SignatureScheme::Md5.digest(&n, &s);
        for _ in 0..10 {
            assert_eq!(SignatureScheme::Md5.digest(&n, &s), first);
        }
    }

    #[test]
    fn test_digest_independent_of_field_order() {
        let fields = [
            ("status", ScalarValue::String("PAID".into())),
            ("orderId", ScalarValue::String("abc123".into())),
            ("amount", ScalarValue::Number(10u64.into())),
        ];

        let mut forward = WebhookNotification::default();
        for (name, value) in fields.iter().cloned() {
            forward.insert(name, value);
        }
        let mut reverse = WebhookNotification::default();
        for (name, value) in fields.iter().rev().cloned() {
            reverse.insert(name, value);
        }

        let s = secret("shh");
        assert_eq!(canonical_string(&forward), "amount=10&orderId=abc123&status=PAID");
        assert_eq!(canonical_string(&forward), canonical_string(&reverse));
        assert_eq!(
            SignatureScheme::Md5.digest(&forward, &s),
            SignatureScheme::Md5.digest(&reverse, &s)
        );
    }

    #[test]
    fn test_digest_ignores_sign_value() {
        let s = secret("shh");
        let a = notification(json!({"orderId": "abc123", "status": "PAID", "sign": "one"}));
        let b = notification(json!({"orderId": "abc123", "status": "PAID", "sign": "two"}));
        assert_eq!(
            SignatureScheme::Md5.digest(&a, &s),
            SignatureScheme::Md5.digest(&b, &s)
        );
    }

    #[test]
    fn test_verify_signature_valid() {
        let s = secret("shh");
        let n = notification(json!({"orderId": "abc123", "status": "PAID"}));
        for scheme in [SignatureScheme::Md5, SignatureScheme::Sha256, SignatureScheme::HmacSha256] {
            let signed = sign_notification(scheme, &n, &s);
            assert!(verify_signature(scheme, &signed, &s), "{scheme} should verify");
        }
    }

    #[test]
    fn test_verify_signature_detects_tampering() {
        let s = secret("shh");
        let signed = sign_notification(
            SignatureScheme::Md5,
            &notification(json!({"order_id": "abc123", "status": "PAID"})),
            &s,
        );
        let sign = signed.sign().unwrap().to_string();

        let tampered_status =
            notification(json!({"order_id": "abc123", "status": "PENDING", "sign": sign}));
        assert!(!verify_signature(SignatureScheme::Md5, &tampered_status, &s));

        let tampered_order =
            notification(json!({"order_id": "abc124", "status": "PAID", "sign": sign}));
        assert!(!verify_signature(SignatureScheme::Md5, &tampered_order, &s));

        let added_field =
            notification(json!({"order_id": "abc123", "status": "PAID", "extra": 1, "sign": sign}));
        assert!(!verify_signature(SignatureScheme::Md5, &added_field, &s));
    }

    #[test]
    fn test_verify_signature_secret_sensitive() {
        let n = notification(json!({"orderId": "abc123", "status": "PAID"}));
        let right = secret("shh");
        let wrong = secret("shhh");
        assert_ne!(
            SignatureScheme::Md5.digest(&n, &right),
            SignatureScheme::Md5.digest(&n, &wrong)
        );

        let signed = sign_notification(SignatureScheme::Md5, &n, &right);
        assert!(verify_signature(SignatureScheme::Md5, &signed, &right));
        assert!(!verify_signature(SignatureScheme::Md5, &signed, &wrong));
    }

    #[test]
    fn test_verify_signature_missing_or_empty_sign() {
        let s = secret("shh");
        let missing = notification(json!({"orderId": "abc123", "status": "PAID"}));
        assert!(!verify_signature(SignatureScheme::Md5, &missing, &s));

        let empty = notification(json!({"orderId": "abc123", "status": "PAID", "sign": ""}));
        assert!(!verify_signature(SignatureScheme::Md5, &empty, &s));
    }

    #[test]
    fn test_verify_signature_is_case_sensitive() {
        let s = secret("shh");
        let n = notification(json!({
            "orderId": "abc123",
            "status": "PAID",
            "sign": "B79F09768301270C030D1519C0B206E3"
        }));
        assert!(!verify_signature(SignatureScheme::Md5, &n, &s));
    }

    #[test]
    fn test_scheme_from_str() {
        assert_eq!("md5".parse::<SignatureScheme>().unwrap(), SignatureScheme::Md5);
        assert_eq!(" SHA256 ".parse::<SignatureScheme>().unwrap(), SignatureScheme::Sha256);
        assert_eq!(
            "hmac-sha256".parse::<SignatureScheme>().unwrap(),
            SignatureScheme::HmacSha256
        );
        assert!("sha1".parse::<SignatureScheme>().is_err());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}

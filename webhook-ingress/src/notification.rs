//! Typed view of an inbound payment notification.
//!
//! The provider posts a flat JSON object. Every top-level field except
//! `sign` takes part in the signature, so the payload is kept as an ordered
//! map of scalar values rather than a fixed struct.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Number, Value};

use crate::error::PayloadError;

/// Field carrying the provider's digest.
pub const SIGN_FIELD: &str = "sign";

/// Field carrying the payment status.
pub const STATUS_FIELD: &str = "status";

/// Field carrying the order identifier.
pub const ORDER_ID_FIELD: &str = "order_id";

/// Accepted spelling of [`ORDER_ID_FIELD`] when the canonical one is absent.
pub const ORDER_ID_ALIAS: &str = "orderId";

/// Wire value of a completed payment.
pub const PAID_STATUS: &str = "PAID";

/// 2^53, the largest float range in which integral values are exact.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// A top-level scalar field value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    String(String),
    Number(Number),
    Bool(bool),
    Null,
}

impl ScalarValue {
    fn from_json(name: &str, value: Value) -> Result<Self, PayloadError> {
        match value {
            Value::String(s) => Ok(Self::String(s)),
            Value::Number(n) => Ok(Self::Number(n)),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::Null => Ok(Self::Null),
            Value::Array(_) | Value::Object(_) => {
                Err(PayloadError::NonScalarField(name.to_string()))
            }
        }
    }
}

/// Renders the value the way it appears in the signed string.
///
/// Integral floats print without a fraction (`1.0` -> `1`), matching how
/// the provider stringifies numbers.
impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    return write!(f, "{n}");
                }
                match n.as_f64() {
                    Some(v) if v.fract() == 0.0 && v.abs() < MAX_EXACT_FLOAT => {
                        write!(f, "{}", v as i64)
                    }
                    Some(v) => write!(f, "{v}"),
                    None => write!(f, "{n}"),
                }
            }
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// Payment status reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Other(String),
}

impl PaymentStatus {
    pub fn parse(raw: &str) -> Self {
        if raw == PAID_STATUS {
            Self::Paid
        } else {
            Self::Other(raw.to_string())
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

/// An inbound notification, untrusted until its signature is verified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookNotification {
    fields: BTreeMap<String, ScalarValue>,
}

impl WebhookNotification {
    /// Build a notification from a parsed JSON body.
    pub fn from_json(body: &Value) -> Result<Self, PayloadError> {
        let object = body.as_object().ok_or(PayloadError::NotAnObject)?;

        let mut fields = BTreeMap::new();
        for (name, value) in object {
            fields.insert(name.clone(), ScalarValue::from_json(name, value.clone())?);
        }

        Ok(Self { fields })
    }

    /// All fields, sorted by name.
    pub fn fields(&self) -> &BTreeMap<String, ScalarValue> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&ScalarValue> {
        self.fields.get(name)
    }

    /// The provider's digest, if present and a string.
    pub fn sign(&self) -> Option<&str> {
        match self.fields.get(SIGN_FIELD) {
            Some(ScalarValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<PaymentStatus> {
        self.fields
            .get(STATUS_FIELD)
            .map(|v| PaymentStatus::parse(&v.to_string()))
    }

    /// Order identifier in its rendered form. Numeric ids are accepted.
    pub fn order_id(&self) -> Option<String> {
        self.fields
            .get(ORDER_ID_FIELD)
            .or_else(|| self.fields.get(ORDER_ID_ALIAS))
            .filter(|v| !matches!(v, ScalarValue::Null))
            .map(ToString::to_string)
            .filter(|id| !id.is_empty())
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, value: ScalarValue) {
        self.fields.insert(name.into(), value);
    }
}

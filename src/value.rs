//! Field values held by the document (edit-state representation).

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Serialize, Serializer};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// Current value of a field: a primitive scalar the user typed, or a structured value
/// that is handed to the backend verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Explicit byte sequence (payloads, options).
    Bytes(Vec<u8>),
    /// Nested sub-object, e.g. a layer option list.
    Object(BTreeMap<String, FieldValue>),
    /// Backend-evaluated expression.
    Expression(String),
}

impl FieldValue {
    /// Scalars are editable as text and go to the backend as human values.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            FieldValue::Str(_) | FieldValue::Int(_) | FieldValue::Float(_) | FieldValue::Bool(_)
        )
    }

    /// The user-facing string of a primitive; `None` for structured values.
    pub fn as_human_string(&self) -> Option<String> {
        match self {
            FieldValue::Str(s) => Some(s.clone()),
            FieldValue::Int(x) => Some(x.to_string()),
            FieldValue::Float(x) => Some(x.to_string()),
            FieldValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(x) => Some(*x),
            FieldValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Object(m) => Some(m),
            _ => None,
        }
    }

    /// JSON form passed through to the backend for raw values.
    pub fn to_raw_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Str(s) => json!(s),
            FieldValue::Int(x) => json!(x),
            FieldValue::Float(x) => json!(x),
            FieldValue::Bool(b) => json!(b),
            FieldValue::Bytes(b) => json!({ "vtype": "BYTES", "base64": STANDARD.encode(b) }),
            FieldValue::Expression(e) => json!({ "vtype": "EXPRESSION", "expr": e }),
            FieldValue::Object(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_raw_json())).collect(),
            ),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_raw_json().serialize(serializer)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_human_string() {
            Some(s) => f.write_str(&s),
            None => write!(f, "{}", self.to_raw_json()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i32> for FieldValue {
    fn from(x: i32) -> Self {
        FieldValue::Int(x.into())
    }
}

impl From<i64> for FieldValue {
    fn from(x: i64) -> Self {
        FieldValue::Int(x)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(b: Vec<u8>) -> Self {
        FieldValue::Bytes(b)
    }
}

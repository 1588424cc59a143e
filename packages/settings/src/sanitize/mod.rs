// ABOUTME: Sanitization of untrusted settings input
// ABOUTME: Single-attribute coercion by declared type and recursive document cleanup

pub mod html;
pub mod url;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{SanitizeType, SettingValue, SettingsDocument};

pub use html::{sanitize_post_content, sanitize_text};
pub use url::sanitize_url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    #[error("Unknown sanitization type: {0}")]
    UnknownSanitizationType(String),
}

const TRUTHY: &[&str] = &["1", "true", "yes", "on"];

/// Sanitize one attribute of `source` according to its declared type.
///
/// A missing key is reported before the type tag is looked at, so
/// `AttributeNotFound` wins over `UnknownSanitizationType`.
pub fn sanitize_attribute(
    source: &Map<String, Value>,
    key: &str,
    kind: impl Into<SanitizeType>,
) -> Result<Value, SanitizeError> {
    let value = source
        .get(key)
        .ok_or_else(|| SanitizeError::AttributeNotFound(key.to_string()))?;

    match kind.into() {
        SanitizeType::Raw => Ok(value.clone()),
        SanitizeType::PostContent => Ok(Value::String(sanitize_post_content(&scalar_string(value)))),
        SanitizeType::Text => Ok(Value::String(sanitize_text(&scalar_string(value)))),
        SanitizeType::Boolean => Ok(Value::Bool(to_boolean(value))),
        SanitizeType::Integer => Ok(to_absint(value)),
        SanitizeType::Float => Ok(to_strict_float(value)),
        SanitizeType::Url => Ok(Value::String(sanitize_url(&scalar_string(value)))),
        SanitizeType::Unknown(tag) => Err(SanitizeError::UnknownSanitizationType(tag)),
    }
}

/// String form of a scalar; containers and null become empty
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => TRUTHY.contains(&s.trim().to_ascii_lowercase().as_str()),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

fn float_to_absint(f: f64) -> Value {
    if f.is_finite() && f >= 1.0 {
        Value::from(f.trunc().min(i64::MAX as f64) as i64)
    } else {
        Value::from(0)
    }
}

/// Non-negative integer; negatives and non-numeric input become 0
fn to_absint(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::from(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i.max(0))
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                float_to_absint(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Value::from(i.max(0))
            } else if let Ok(u) = s.parse::<u64>() {
                Value::from(u)
            } else if let Ok(f) = s.parse::<f64>() {
                float_to_absint(f)
            } else {
                Value::from(0)
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => Value::from(0),
    }
}

/// Floats pass only when they already are floats; no string parsing
fn to_strict_float(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => value.clone(),
        _ => Value::from(0.0),
    }
}

/// Closed set of shapes the structural walk distinguishes
#[derive(Debug)]
enum ValueKind<'a> {
    Bool(bool),
    Int(i64),
    Text(&'a str),
    Map(&'a Map<String, Value>),
    /// Floats, null, arrays, integers outside i64
    Other,
}

impl<'a> ValueKind<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::Bool(b) => ValueKind::Bool(*b),
            Value::Number(n) => n.as_i64().map_or(ValueKind::Other, ValueKind::Int),
            Value::String(s) => ValueKind::Text(s),
            Value::Object(map) => ValueKind::Map(map),
            Value::Null | Value::Array(_) => ValueKind::Other,
        }
    }
}

/// Untyped form input spells numbers and booleans as strings
fn coerce_keyword(s: &str) -> Option<SettingValue> {
    match s {
        "0" => Some(SettingValue::Int(0)),
        "true" => Some(SettingValue::Bool(true)),
        "false" => Some(SettingValue::Bool(false)),
        _ => None,
    }
}

fn sanitize_entry(value: &Value) -> Option<SettingValue> {
    if let Value::String(s) = value {
        if let Some(coerced) = coerce_keyword(s) {
            return Some(coerced);
        }
    }

    match ValueKind::of(value) {
        ValueKind::Map(map) => Some(SettingValue::Map(sanitize_map(map))),
        ValueKind::Bool(b) => Some(SettingValue::Bool(b)),
        ValueKind::Int(i) => Some(SettingValue::Int(i)),
        ValueKind::Text(s) => {
            let clean = sanitize_text(s);
            // " 0 " or "<b>true</b>" must not come out as a keyword string
            Some(coerce_keyword(&clean).unwrap_or(SettingValue::Text(clean)))
        }
        ValueKind::Other => None,
    }
}

/// Sanitize every entry of a nested map, dropping values of other kinds
pub fn sanitize_map(raw: &Map<String, Value>) -> SettingsDocument {
    raw.iter()
        .filter_map(|(key, value)| sanitize_entry(value).map(|clean| (key.clone(), clean)))
        .collect()
}

/// Sanitize a whole posted payload. Anything but an object yields an empty document.
pub fn sanitize_document(raw: &Value) -> SettingsDocument {
    match raw {
        Value::Object(map) => sanitize_map(map),
        _ => SettingsDocument::new(),
    }
}

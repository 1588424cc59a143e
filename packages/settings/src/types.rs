// ABOUTME: Type definitions for the settings document
// ABOUTME: Setting values, the stored options record, and sanitization type tags

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The canonical nested key-value configuration
pub type SettingsDocument = BTreeMap<String, SettingValue>;

/// A single value in a settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool), // Must be before Int so JSON booleans stay booleans
    Int(i64),
    Float(f64),
    Text(String),
    Map(SettingsDocument),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&SettingsDocument> {
        match self {
            SettingValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "boolean",
            SettingValue::Int(_) => "integer",
            SettingValue::Float(_) => "float",
            SettingValue::Text(_) => "string",
            SettingValue::Map(_) => "map",
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

impl From<SettingsDocument> for SettingValue {
    fn from(value: SettingsDocument) -> Self {
        SettingValue::Map(value)
    }
}

/// Persisted record wrapping the live settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOptions {
    /// Option key identifying the blob
    pub name: String,
    /// Write counter, 1 after seeding, bumped on every persist
    pub version: i64,
    #[serde(rename = "settings")]
    pub document: SettingsDocument,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

/// Declared type of a single attribute to sanitize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizeType {
    /// Caller asserts trust, value returned as-is
    Raw,
    /// Allow-listed HTML subset
    PostContent,
    Text,
    Boolean,
    Integer,
    Float,
    Url,
    /// Explicit sentinel, or any tag we don't recognize
    Unknown(String),
}

impl SanitizeType {
    /// Parse a type tag. Never fails; unrecognized tags become `Unknown`.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "raw" => SanitizeType::Raw,
            "post-content" | "post_content" | "html" => SanitizeType::PostContent,
            "text" => SanitizeType::Text,
            "boolean" | "bool" => SanitizeType::Boolean,
            "integer" | "int" => SanitizeType::Integer,
            "float" => SanitizeType::Float,
            "url" => SanitizeType::Url,
            _ => SanitizeType::Unknown(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SanitizeType::Raw => "raw",
            SanitizeType::PostContent => "post-content",
            SanitizeType::Text => "text",
            SanitizeType::Boolean => "boolean",
            SanitizeType::Integer => "integer",
            SanitizeType::Float => "float",
            SanitizeType::Url => "url",
            SanitizeType::Unknown(tag) => tag,
        }
    }
}

impl From<&str> for SanitizeType {
    fn from(tag: &str) -> Self {
        SanitizeType::parse(tag)
    }
}

impl fmt::Display for SanitizeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

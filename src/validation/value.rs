//! # Field Values
//!
//! Closed set of value shapes a credential field can hold.

use serde::Serialize;
use std::collections::BTreeMap;

/// Input field map, keyed by field name
pub type Fields = BTreeMap<String, FieldValue>;

/// Value of one credential field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// Raw bytes that were not valid UTF-8
    Bytes(Vec<u8>),
    Sequence(Vec<FieldValue>),
    Mapping(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Whether a required field holding this value counts as empty
    ///
    /// Booleans and numbers are never empty, even when `false` or zero.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(_) | Self::Number(_) => false,
            Self::String(s) => s.is_empty(),
            Self::Bytes(b) => b.is_empty(),
            Self::Sequence(items) => items.is_empty(),
            Self::Mapping(entries) => entries.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, safe to include in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Into::into).collect()),
            Value::Object(entries) => Self::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into()))
                    .collect(),
            ),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    /// UTF-8 input becomes a string, anything else stays bytes
    fn from(value: Vec<u8>) -> Self {
        match String::from_utf8(value) {
            Ok(s) => Self::String(s),
            Err(e) => Self::Bytes(e.into_bytes()),
        }
    }
}

/// Convert a JSON object into a field map
///
/// Returns `None` when `value` is not an object.
pub fn fields_from_json(value: serde_json::Value) -> Option<Fields> {
    match FieldValue::from(value) {
        FieldValue::Mapping(entries) => Some(entries),
        _ => None,
    }
}

/// Convert raw secret data into fields, decoding valid UTF-8 values as strings
pub fn coerce_bytes_to_strings(data: &BTreeMap<String, Vec<u8>>) -> Fields {
    data.iter()
        .map(|(key, bytes)| (key.clone(), FieldValue::from(bytes.clone())))
        .collect()
}

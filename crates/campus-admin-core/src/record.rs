//! Opaque backend records
//!
//! The backend owns every entity's shape. A [`Record`] is the JSON object it
//! returned, with a few accessors for identity and display.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Backend-assigned primary key, numeric or string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Integer key
    Num(i64),
    /// String key (course codes, slugs)
    Str(String),
}

impl RecordId {
    /// Id from a URL path segment
    ///
    /// Only a canonical integer becomes numeric. Anything else, such as
    /// `007` or `+5`, is kept verbatim so it reaches the backend unchanged.
    pub fn from_path(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => Self::Num(n),
            _ => Self::Str(raw.to_string()),
        }
    }

    /// Whether this id matches an id taken from a URL path segment
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            Self::Num(n) => raw.trim().parse::<i64>().is_ok_and(|r| r == *n),
            Self::Str(s) => s == raw,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Num(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// One entity record as returned by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap a JSON object
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a record from any JSON value, `None` unless it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Primary key, if the backend sent one
    pub fn id(&self) -> Option<RecordId> {
        match self.0.get("id")? {
            Value::Number(n) => n.as_i64().map(RecordId::Num),
            Value::String(s) if !s.is_empty() => Some(RecordId::Str(s.clone())),
            _ => None,
        }
    }

    /// Raw field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Overwrite one field
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Boolean view of a field; missing or non-boolean values read as false
    pub fn flag(&self, field: &str) -> bool {
        self.0.get(field).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Display text for a field
    ///
    /// Arrays are joined with `", "`, booleans read `Yes`/`No`, and missing
    /// or null values are empty.
    pub fn text(&self, field: &str) -> String {
        self.0.get(field).map(value_text).unwrap_or_default()
    }

    /// Underlying JSON object
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying JSON object
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

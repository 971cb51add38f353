//! Scalar values stored in and rendered into SQL

use crate::{Error, Result};
use serde::Serialize;

/// A scalar that can live in a table cell or be rendered as a SQL literal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,
    /// 64-bit integer
    Integer(i64),
    /// 64-bit float
    Real(f64),
    /// Text value
    Text(String),
    /// Raw bytes, readable from the engine but not renderable as a literal
    Blob(Vec<u8>),
    /// Legacy list column, stored as comma-joined text
    TextList(Vec<String>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the storage class name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
            Value::TextList(_) => "TEXT LIST",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

// Plain rendering used in error messages and identity lookups.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r:?}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Value::TextList(items) => write!(f, "{:?}", items.join(",")),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

// SQLite has no boolean storage class; booleans are stored as 0/1.
impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Integer(i64::from(val))
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::Integer(i64::from(val))
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::Integer(val)
    }
}

impl From<u32> for Value {
    fn from(val: u32) -> Self {
        Value::Integer(i64::from(val))
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::Real(f64::from(val))
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::Real(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::Text(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::Text(val.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Blob(val)
    }
}

impl From<Vec<String>> for Value {
    fn from(val: Vec<String>) -> Self {
        Value::TextList(val)
    }
}

impl From<Vec<&str>> for Value {
    fn from(val: Vec<&str>) -> Self {
        Value::TextList(val.into_iter().map(str::to_string).collect())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Adapter for dynamically-typed input
impl TryFrom<serde_json::Value> for Value {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::from(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Integer(i)),
                None => n
                    .as_f64()
                    .map(Value::Real)
                    .ok_or_else(|| Error::type_error(format!("Cannot convert number {n} to sql"))),
            },
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => Ok(s),
                    other => Err(Error::type_error(format!(
                        "Cannot convert list containing non-string value {other} to sql"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::TextList),
            serde_json::Value::Object(_) => {
                Err(Error::type_error("Cannot convert a JSON object to sql"))
            }
        }
    }
}

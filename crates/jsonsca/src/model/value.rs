//! In-memory values: the encoder's input and the decoder's output.
//!
//! Atomic values are held inline. Composites live in a [`Heap`](crate::model::Heap)
//! and are referred to by [`Handle`], so two positions holding the same handle
//! hold the same entity.

use std::fmt;

use serde_json::Number;

use crate::model::Handle;
use crate::util::datetime::{format_iso8601, parse_iso8601, DateTimeParseError};

/// An instant in time with millisecond precision.
///
/// No timezone or calendar information is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    epoch_ms: i64,
}

impl Date {
    /// Creates a date from milliseconds since the Unix epoch.
    pub fn from_epoch_millis(epoch_ms: i64) -> Self {
        Self { epoch_ms }
    }

    /// Milliseconds since the Unix epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.epoch_ms
    }

    /// Parses an ISO-8601 / RFC 3339 datetime (`1984-04-12T00:00:00.000Z`).
    pub fn parse_iso8601(s: &str) -> Result<Self, DateTimeParseError> {
        parse_iso8601(s).map(Self::from_epoch_millis)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_iso8601(self.epoch_ms))
    }
}

/// A regular expression, reduced to its source pattern.
///
/// Flags are not part of the model: `/a+/gi` and `/a+/` encode identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegExp {
    pub source: String,
}

impl RegExp {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }
}

/// A value in a graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    /// A JSON number; integers stay integers.
    Number(Number),
    String(String),
    Date(Date),
    RegExp(RegExp),
    /// A composite (array, object, blob, image data) stored in a heap.
    Entity(Handle),
}

impl Value {
    /// Creates a number value from a float, or `None` if it is not finite.
    pub fn from_f64(value: f64) -> Option<Value> {
        Number::from_f64(value).map(Value::Number)
    }

    /// Returns true for values with identity (heap entities).
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Entity(_))
    }

    /// Returns the handle if this value is a composite.
    pub fn as_handle(&self) -> Option<Handle> {
        match self {
            Value::Entity(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Value::Date(value)
    }
}

impl From<RegExp> for Value {
    fn from(value: RegExp) -> Self {
        Value::RegExp(value)
    }
}

impl From<Handle> for Value {
    fn from(value: Handle) -> Self {
        Value::Entity(value)
    }
}

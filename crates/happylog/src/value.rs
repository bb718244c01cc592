//! Argument values passed to a log call.

use backtrace::Backtrace;
use std::fmt;

/// An error captured as a log value: its message and the stack it was
/// wrapped at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    message: String,
    stack: String,
}

impl ErrorValue {
    /// Creates an error value from a message and an already formatted stack.
    pub fn new(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
        }
    }

    /// Creates an error value, capturing the current stack.
    ///
    /// # Performance Warning
    ///
    /// Captures and symbolizes a full backtrace.
    pub fn capture(message: impl Into<String>) -> Self {
        let stack = format!("{:?}", Backtrace::new());
        Self::new(message, stack)
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the captured stack, possibly empty.
    #[must_use]
    pub fn stack(&self) -> &str {
        &self.stack
    }
}

/// One element of the flat key/value list of a log call.
///
/// Keys are expected to be [`Value::Str`]; any other variant in a key
/// position is reported and logged under a positional placeholder key.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point number. Non-finite numbers encode as null.
    Float(f64),
    /// String.
    Str(String),
    /// Arbitrary structured JSON.
    Json(serde_json::Value),
    /// An error with its stack.
    Error(ErrorValue),
}

impl Value {
    /// Wraps an error, capturing the stack at this point.
    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Self::Error(ErrorValue::capture(err.to_string()))
    }

    /// Returns the key text if this value can be used as a key.
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Converts to the JSON value written by the canonical encoder.
    pub(crate) fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(n) => Json::from(*n),
            Self::Uint(n) => Json::from(*n),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::Str(s) => Json::String(s.clone()),
            Self::Json(v) => v.clone(),
            Self::Error(e) => Json::String(e.message.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Error(e) => f.write_str(&e.message),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Uint(u64::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Uint(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Uint(n as u64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<ErrorValue> for Value {
    fn from(e: ErrorValue) -> Self {
        Self::Error(e)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

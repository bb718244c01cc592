//! The canonical field mapping produced for each log call.

use serde_json::Value as Json;
use std::collections::HashMap;

/// A field value of a canonical record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A value exactly as production JSON would carry it.
    Ordinary(Json),
    /// An error: the message production carries, plus the stack.
    ErrorLike {
        /// Error message.
        message: String,
        /// Captured stack, possibly empty.
        stack: String,
    },
}

impl FieldValue {
    /// Returns the text shown for this value. Strings are shown bare.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Ordinary(Json::String(s)) => s.clone(),
            Self::Ordinary(v) => v.to_string(),
            Self::ErrorLike { message, .. } => message.clone(),
        }
    }
}

/// Mapping from field name to value for one log call.
///
/// Iteration order is unspecified; render order comes from the call's
/// arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRecord {
    fields: HashMap<String, FieldValue>,
}

impl LogRecord {
    pub(crate) fn from_json(map: serde_json::Map<String, Json>) -> Self {
        let fields = map
            .into_iter()
            .map(|(k, v)| (k, FieldValue::Ordinary(v)))
            .collect();
        Self { fields }
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Returns the text of a field, or an empty string if absent.
    #[must_use]
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(FieldValue::text).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_shows_strings_bare() {
        assert_eq!(FieldValue::Ordinary(json!("x y")).text(), "x y");
        assert_eq!(FieldValue::Ordinary(json!(1.5)).text(), "1.5");
        assert_eq!(FieldValue::Ordinary(json!([1, 2])).text(), "[1,2]");
        let err = FieldValue::ErrorLike {
            message: "boom".into(),
            stack: "at main".into(),
        };
        assert_eq!(err.text(), "boom");
    }

    #[test]
    fn test_missing_field_text_is_empty() {
        let record = LogRecord::default();
        assert_eq!(record.get("m"), None);
        assert_eq!(record.text("m"), "");
    }
}

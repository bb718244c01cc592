//! Reserved keys and key validation.
//!
//! The canonical fields of every record use single rune keys. A caller that
//! reuses one of them would silently overwrite a canonical field, so it is
//! a fatal usage error.

use crate::value::Value;
use crate::{RenderError, RenderResult};

/// Key for the timestamp.
pub const TIME: &str = "t";
/// Key for the process id.
pub const PID: &str = "p";
/// Key for the level.
pub const LEVEL: &str = "l";
/// Key for the logger name.
pub const NAME: &str = "n";
/// Key for the message.
pub const MESSAGE: &str = "m";
/// Key for the caller location.
pub const CALLSTACK: &str = "c";

/// All reserved keys.
pub const RESERVED: [&str; 6] = [TIME, PID, LEVEL, NAME, MESSAGE, CALLSTACK];

/// Returns true if `key` is reserved for canonical fields.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    RESERVED.contains(&key)
}

/// Key used for the value of a pair whose key at `index` is not a string.
#[must_use]
pub fn bad_key_at_index(index: usize) -> String {
    format!("BADKEY_AT_INDEX_{index}")
}

/// Key used for the dangling last element of an odd argument list.
#[must_use]
pub fn imbalanced_key_at_index(index: usize) -> String {
    format!("IMBALANCED_PAIR_AT_INDEX_{index}")
}

/// How a key position of a call was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// A plain string key.
    Ordinary,
    /// One of [`RESERVED`].
    Reserved,
    /// A string that JSON would have to escape.
    Complex,
    /// Not a string at all.
    NotString,
}

/// Classifies a value found in a key position.
#[must_use]
pub fn classify(key: &Value) -> KeyClass {
    match key.as_key() {
        None => KeyClass::NotString,
        Some(k) if is_reserved(k) => KeyClass::Reserved,
        Some(k) if !is_simple(k) => KeyClass::Complex,
        Some(_) => KeyClass::Ordinary,
    }
}

// The canonical encoder writes keys without escaping them.
fn is_simple(key: &str) -> bool {
    serde_json::to_string(key).is_ok_and(|quoted| quoted.len() == key.len() + 2)
}

/// Validates every key position of a flat argument list.
///
/// Non-string keys are reported through `tracing` and otherwise tolerated.
///
/// # Errors
///
/// Returns [`RenderError::ReservedKey`] for the first reserved key and
/// [`RenderError::ComplexKey`] for the first key needing escapes.
pub fn validate(args: &[Value]) -> RenderResult<()> {
    for (i, key) in args.iter().enumerate().step_by(2) {
        match classify(key) {
            KeyClass::Ordinary => {}
            KeyClass::NotString => {
                tracing::error!(arg = %format!("args[{i}]"), key = %key, "key is not a string");
            }
            KeyClass::Reserved => {
                return Err(RenderError::ReservedKey {
                    key: key.to_string(),
                });
            }
            KeyClass::Complex => {
                return Err(RenderError::ComplexKey {
                    key: key.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Returns the keys of a call in call order.
///
/// Non-string keys are replaced by [`bad_key_at_index`] and a dangling last
/// element by [`imbalanced_key_at_index`]. Reserved keys are dropped.
#[must_use]
pub fn ordered_keys(args: &[Value]) -> Vec<String> {
    let mut order = Vec::with_capacity(args.len().div_ceil(2));
    for (i, key) in args.iter().enumerate().step_by(2) {
        let name = if i + 1 >= args.len() {
            imbalanced_key_at_index(i)
        } else {
            match key.as_key() {
                Some(k) => k.to_string(),
                None => bad_key_at_index(i),
            }
        };
        if !is_reserved(&name) {
            order.push(name);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn test_reserved_keys_are_single_runes() {
        for key in RESERVED {
            assert_eq!(key.chars().count(), 1, "{key} should be one rune");
            assert!(is_reserved(key));
        }
        assert!(!is_reserved("a"));
        assert!(!is_reserved("msg"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&"user_id".into()), KeyClass::Ordinary);
        assert_eq!(classify(&"m".into()), KeyClass::Reserved);
        assert_eq!(classify(&"a\"b".into()), KeyClass::Complex);
        assert_eq!(classify(&"tab\there".into()), KeyClass::Complex);
        assert_eq!(classify(&"back\\slash".into()), KeyClass::Complex);
        assert_eq!(classify(&Value::from(7)), KeyClass::NotString);
    }

    #[test]
    fn test_unicode_keys_are_simple() {
        assert_eq!(classify(&"naïve".into()), KeyClass::Ordinary);
        assert_eq!(classify(&"ключ".into()), KeyClass::Ordinary);
    }

    #[test]
    fn test_validate_rejects_reserved() {
        let err = validate(&args(&["a", "1", "l", "2"])).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, RenderError::ReservedKey { ref key } if key == "l"));
    }

    #[test]
    fn test_validate_rejects_complex() {
        let err = validate(&args(&["new\nline", "1"])).unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(err, RenderError::ComplexKey { .. }));
    }

    #[test]
    fn test_validate_checks_dangling_key() {
        assert!(validate(&args(&["a", "1", "m"])).is_err());
    }

    #[test]
    fn test_validate_tolerates_non_string_keys() {
        let call = vec![Value::from(1), Value::from("one"), "b".into(), "2".into()];
        assert!(validate(&call).is_ok());
    }

    #[test]
    fn test_ordered_keys_preserve_call_order() {
        let order = ordered_keys(&args(&["z", "1", "a", "2", "m2", "3"]));
        assert_eq!(order, vec!["z", "a", "m2"]);
    }

    #[test]
    fn test_ordered_keys_sentinels() {
        let call = vec![Value::from(3), "x".into(), "k".into(), "v".into(), "tail".into()];
        assert_eq!(
            ordered_keys(&call),
            vec!["BADKEY_AT_INDEX_0", "k", "IMBALANCED_PAIR_AT_INDEX_4"]
        );
    }

    #[test]
    fn test_ordered_keys_skip_reserved() {
        assert_eq!(ordered_keys(&args(&["t", "1", "a", "2"])), vec!["a"]);
    }
}

//! Canonical JSON encoding of log calls.
//!
//! This is the production encoding and the single source of truth for field
//! values: the terminal formatter renders what this encoder produces.

use crate::callsite::capture_frames;
use crate::config::{JSON_TIME_FORMAT, TimeFunction, now};
use crate::keys::{self, bad_key_at_index, imbalanced_key_at_index};
use crate::record::{FieldValue, LogRecord};
use crate::value::Value;
use crate::{Level, RenderResult};
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::time::SystemTime;

/// Encodes log calls as one JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    name: String,
    time_format: String,
    time_function: TimeFunction,
    callstack: bool,
}

impl JsonFormatter {
    /// Creates an encoder for the logger called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time_format: JSON_TIME_FORMAT.to_string(),
            time_function: now,
            callstack: true,
        }
    }

    /// Sets the timestamp format.
    #[must_use]
    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = format.into();
        self
    }

    /// Sets the clock hook.
    #[must_use]
    pub fn with_time_function(mut self, f: TimeFunction) -> Self {
        self.time_function = f;
        self
    }

    /// Turns the caller field of warnings and errors on or off.
    #[must_use]
    pub fn with_callstack(mut self, callstack: bool) -> Self {
        self.callstack = callstack;
        self
    }

    /// Appends one JSON line for the call to `buf`.
    ///
    /// Keys are written as is, without escaping. Callers that cannot
    /// guarantee simple keys should run [`keys::validate`] first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RenderError::Encode`] if a value cannot be encoded.
    pub fn format(
        &self,
        buf: &mut String,
        level: Level,
        msg: &str,
        args: &[Value],
    ) -> RenderResult<()> {
        let time = format_time((self.time_function)(SystemTime::now()), &self.time_format);

        buf.push('{');
        write_field(buf, keys::TIME, &serde_json::to_string(&time)?, true);
        write_field(buf, keys::PID, &std::process::id().to_string(), false);
        write_field(buf, keys::LEVEL, &serde_json::to_string(level.abbrev())?, false);
        write_field(buf, keys::NAME, &serde_json::to_string(&self.name)?, false);
        write_field(buf, keys::MESSAGE, &serde_json::to_string(msg)?, false);

        if self.callstack && level >= Level::Warn {
            if let Some(caller) = capture_frames().first() {
                let location = caller.file.as_deref().map_or_else(String::new, |file| {
                    format!("{}:{}", file.display(), caller.line)
                });
                write_field(buf, keys::CALLSTACK, &serde_json::to_string(&location)?, false);
            }
        }

        for (i, key) in args.iter().enumerate().step_by(2) {
            let Some(value) = args.get(i + 1) else {
                let sentinel = imbalanced_key_at_index(i);
                write_field(buf, &sentinel, &serde_json::to_string(&key.to_json())?, false);
                break;
            };
            let encoded = serde_json::to_string(&value.to_json())?;
            match key.as_key() {
                Some(k) => write_field(buf, k, &encoded, false),
                None => write_field(buf, &bad_key_at_index(i), &encoded, false),
            }
        }
        buf.push_str("}\n");
        Ok(())
    }

    /// Encodes the call and reads the line back as a field mapping.
    ///
    /// Fields whose argument was an error keep the error's stack.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RenderError::Encode`] if the line cannot be produced
    /// or parsed back.
    pub fn log_entry(&self, level: Level, msg: &str, args: &[Value]) -> RenderResult<LogRecord> {
        let mut line = String::new();
        self.format(&mut line, level, msg, args)?;
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&line)?;
        let mut record = LogRecord::from_json(map);

        // The decoded object keeps the last value of a repeated key.
        let mut seen = HashSet::new();
        for pair in args.chunks_exact(2).rev() {
            let Some(key) = pair[0].as_key() else {
                continue;
            };
            if !seen.insert(key) {
                continue;
            }
            if let Value::Error(err) = &pair[1] {
                record.insert(
                    key,
                    FieldValue::ErrorLike {
                        message: err.message().to_string(),
                        stack: err.stack().to_string(),
                    },
                );
            }
        }
        Ok(record)
    }
}

fn write_field(buf: &mut String, key: &str, encoded: &str, first: bool) {
    if !first {
        buf.push(',');
    }
    buf.push('"');
    buf.push_str(key);
    buf.push_str("\":");
    buf.push_str(encoded);
}

/// Formats a timestamp, falling back to RFC 3339 for bad formats.
pub(crate) fn format_time(t: SystemTime, format: &str) -> String {
    let datetime = DateTime::<Local>::from(t);
    let mut out = String::new();
    if write!(out, "{}", datetime.format(format)).is_err() {
        return datetime.to_rfc3339();
    }
    out
}

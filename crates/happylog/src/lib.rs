#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # Happylog
//!
//! The rendering core of a structured, leveled logger for developers.
//!
//! A log call is a level, a message and a flat list of alternating keys and
//! values. Happylog turns that call into either:
//! - a canonical JSON line ([`JsonFormatter`]), the production encoding, or
//! - a colorful, column-bounded terminal rendering ([`HappyDevFormatter`])
//!   that also shows where warnings and errors came from.
//!
//! The terminal renderer always runs the canonical encoder first, so the
//! values a developer sees are the values production would have written.
//!
//! ## Example
//!
//! ```rust
//! use happylog::{Config, HappyDevFormatter, Level, Value};
//!
//! let formatter = HappyDevFormatter::new("app", Config::default());
//! let bytes = formatter
//!     .render(Level::Info, "listening", &["port".into(), Value::from(8080)])
//!     .unwrap();
//! assert!(String::from_utf8(bytes).unwrap().ends_with('\n'));
//! ```
//!
//! ## Performance
//!
//! The terminal renderer encodes every record twice, walks the stack for
//! warnings and errors, and reads source files to show context. It is meant
//! for development terminals only. Use [`Format::Json`] in production.

mod callsite;
pub mod config;
mod happy;
mod json;
pub mod keys;
mod logger;
mod record;
pub mod theme;
mod value;

use std::fmt;
use thiserror::Error;

pub use callsite::{CallsiteResolver, FileSourceReader, Frame, SourceReader, capture_frames};
pub use config::{Config, Format, TimeFunction};
pub use happy::HappyDevFormatter;
pub use json::JsonFormatter;
pub use logger::{ErrorHandler, Logger};
pub use record::{FieldValue, LogRecord};
pub use theme::ColorTheme;
pub use value::{ErrorValue, Value};

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Level {
    /// Debug level (most verbose).
    Debug = -4,
    /// Info level (default).
    Info = 0,
    /// Warning level.
    Warn = 4,
    /// Error level.
    Error = 8,
    /// Fatal level (least verbose).
    Fatal = 12,
}

impl Level {
    /// Returns the string representation of the level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// Returns the three letter tag written into records.
    #[must_use]
    pub fn abbrev(&self) -> &'static str {
        match self {
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warn => "WRN",
            Self::Error => "ERR",
            Self::Fatal => "FTL",
        }
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (*self as i32).cmp(&(*other as i32))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid log level string.
///
/// The accepted strings are `"debug"`, `"info"`, `"warn"`, `"error"` and
/// `"fatal"`, in any case.
///
/// # Example
///
/// ```rust
/// use happylog::Level;
/// use std::str::FromStr;
///
/// assert!(Level::from_str("warn").is_ok());
/// assert!(Level::from_str("WRN").is_err());
/// ```
#[derive(Error, Debug, Clone)]
#[error("invalid level: {0:?}")]
pub struct ParseLevelError(String);

/// A specialized [`Result`] type for level parsing operations.
pub type ParseResult<T> = std::result::Result<T, ParseLevelError>;

/// Error raised while validating or encoding a log call.
///
/// Only [`RenderError::ReservedKey`] is fatal: it means a call site would
/// silently overwrite one of the canonical fields. The other variants abort
/// the record being rendered and nothing else.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A caller used a reserved single rune key as a field name.
    #[error("key {key:?} conflicts with a reserved key, avoid single rune keys")]
    ReservedKey {
        /// The offending key.
        key: String,
    },
    /// A key would need escaping to be written as a JSON string.
    #[error("key {key:?} is complex, use a simpler key")]
    ComplexKey {
        /// The offending key.
        key: String,
    },
    /// The canonical encoding could not be produced or read back.
    #[error("canonical encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RenderError {
    /// Returns true if the error must stop the process.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ReservedKey { .. })
    }
}

/// A specialized [`Result`] type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        CallsiteResolver, ColorTheme, Config, ErrorHandler, ErrorValue, FieldValue, Format,
        Frame, HappyDevFormatter, JsonFormatter, Level, LogRecord, Logger, ParseLevelError,
        ParseResult, RenderError, RenderResult, SourceReader, Value, keys,
    };
}

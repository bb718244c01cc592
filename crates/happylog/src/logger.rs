//! A minimal logger around the formatters.

use crate::config::{Config, Format};
use crate::happy::HappyDevFormatter;
use crate::json::JsonFormatter;
use crate::keys;
use crate::value::Value;
use crate::{Level, RenderError, RenderResult};
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, RwLock};

/// Type alias for error handler callback.
///
/// The error handler is called when an I/O error occurs during log writing.
///
/// # Example
///
/// ```rust
/// use happylog::Logger;
///
/// let logger = Logger::new("app").with_error_handler(|err| {
///     eprintln!("happylog: write failed: {}", err);
/// });
/// ```
pub type ErrorHandler = Arc<dyn Fn(io::Error) + Send + Sync>;

enum Encoder {
    Happy(HappyDevFormatter),
    Json(JsonFormatter),
}

impl Encoder {
    fn new(name: &str, config: Config) -> Self {
        match config.format {
            Format::Happy => Self::Happy(HappyDevFormatter::new(name, config)),
            Format::Json => Self::Json(
                JsonFormatter::new(name)
                    .with_time_format(config.time_format)
                    .with_time_function(config.time_function),
            ),
        }
    }

    fn format(&self, buf: &mut String, level: Level, msg: &str, args: &[Value]) -> RenderResult<()> {
        match self {
            Self::Happy(f) => f.format(buf, level, msg, args),
            Self::Json(f) => {
                keys::validate(args)?;
                f.format(buf, level, msg, args)
            }
        }
    }
}

/// Internal logger state.
struct LoggerInner {
    name: String,
    writer: Box<dyn Write + Send + Sync>,
    level: Level,
    encoder: Encoder,
    /// Optional error handler for I/O failures during logging.
    error_handler: Option<ErrorHandler>,
    /// Whether we've already warned about I/O failures (to prevent infinite loops).
    has_warned_io_failure: bool,
}

/// A named logger writing to stderr by default.
pub struct Logger {
    inner: Arc<RwLock<LoggerInner>>,
}

impl Clone for Logger {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("Logger")
            .field("name", &inner.name)
            .field("level", &inner.level)
            .finish()
    }
}

impl Logger {
    /// Creates a logger configured from the environment.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, Config::from_env())
    }

    /// Creates a logger with an explicit configuration.
    #[must_use]
    pub fn with_config(name: impl Into<String>, config: Config) -> Self {
        let name = name.into();
        Self {
            inner: Arc::new(RwLock::new(LoggerInner {
                encoder: Encoder::new(&name, config),
                name,
                writer: Box::new(io::stderr()),
                level: Level::Debug,
                error_handler: None,
                has_warned_io_failure: false,
            })),
        }
    }

    /// Replaces the output writer.
    #[must_use]
    pub fn with_writer(self, writer: impl Write + Send + Sync + 'static) -> Self {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.writer = Box::new(writer);
        drop(inner);
        self
    }

    /// Sets an error handler for I/O failures during logging.
    ///
    /// Without one, the first failure is reported on stderr and later
    /// failures are silent.
    #[must_use]
    pub fn with_error_handler<F>(self, handler: F) -> Self
    where
        F: Fn(io::Error) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.error_handler = Some(Arc::new(handler));
        drop(inner);
        self
    }

    /// Returns the logger name.
    #[must_use]
    pub fn name(&self) -> String {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.name.clone()
    }

    /// Sets the minimum log level.
    pub fn set_level(&self, level: Level) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.level = level;
    }

    /// Returns the current log level.
    #[must_use]
    pub fn level(&self) -> Level {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.level
    }

    /// Returns true if records at `level` are written.
    #[must_use]
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Logs a record, returning usage errors instead of acting on them.
    ///
    /// # Errors
    ///
    /// Returns the [`RenderError`] of a malformed call. Nothing is written
    /// in that case.
    pub fn try_log(&self, level: Level, msg: &str, args: &[Value]) -> RenderResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if level < inner.level {
            return Ok(());
        }

        let mut output = String::new();
        inner.encoder.format(&mut output, level, msg, args)?;

        if let Err(e) = inner.writer.write_all(output.as_bytes()) {
            if let Some(ref handler) = inner.error_handler {
                let handler = Arc::clone(handler);
                drop(inner);
                handler(e);
            } else if !inner.has_warned_io_failure {
                inner.has_warned_io_failure = true;
                drop(inner);
                let _ = io::stderr().write_all(format!("happylog: write failed: {e}\n").as_bytes());
            }
        }
        Ok(())
    }

    /// Logs a record.
    ///
    /// A reserved key is a bug at the call site: it is reported and the
    /// process exits with status 1. Other malformed calls drop the record
    /// and are reported.
    pub fn log(&self, level: Level, msg: &str, args: &[Value]) {
        if let Err(err) = self.try_log(level, msg, args) {
            report(&err);
            if err.is_fatal() {
                std::process::exit(1);
            }
        }
    }

    /// Logs a debug message.
    pub fn debug(&self, msg: &str, args: &[Value]) {
        self.log(Level::Debug, msg, args);
    }

    /// Logs an info message.
    pub fn info(&self, msg: &str, args: &[Value]) {
        self.log(Level::Info, msg, args);
    }

    /// Logs a warning message.
    pub fn warn(&self, msg: &str, args: &[Value]) {
        self.log(Level::Warn, msg, args);
    }

    /// Logs an error message.
    pub fn error(&self, msg: &str, args: &[Value]) {
        self.log(Level::Error, msg, args);
    }

    /// Logs a fatal message.
    pub fn fatal(&self, msg: &str, args: &[Value]) {
        self.log(Level::Fatal, msg, args);
    }
}

fn report(err: &RenderError) {
    tracing::error!(error = %err, fatal = err.is_fatal(), "malformed log call");
    let _ = io::stderr().write_all(format!("happylog: {err}\n").as_bytes());
}

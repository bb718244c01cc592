//! Colorful, column-bounded terminal rendering.
//!
//! `HappyDevFormatter` is built for a developer watching a terminal. It
//! keeps fields in the order they were passed, wraps long records onto
//! indented lines, and shows where warnings and errors were logged.
//!
//! # Performance Warning
//!
//! Every record is first encoded by [`JsonFormatter`] and read back, so the
//! values shown are exactly those production would write. Warnings and
//! errors also walk the stack and read source files. Expect it to be several
//! times slower than [`JsonFormatter`]. Never use it in production.

use crate::callsite::{CallsiteResolver, Frame, capture_frames};
use crate::config::Config;
use crate::json::JsonFormatter;
use crate::keys::{self, ordered_keys};
use crate::record::FieldValue;
use crate::theme::RESET;
use crate::value::Value;
use crate::{Level, RenderResult};
use unicode_width::UnicodeWidthStr;

/// Written before every field after the timestamp.
pub const SEPARATOR: &str = " ";

/// Written between a key and its value.
const ASSIGNMENT: &str = ": ";

/// Terminal formatter for developers.
#[derive(Debug, Clone)]
pub struct HappyDevFormatter {
    config: Config,
    json: JsonFormatter,
    resolver: CallsiteResolver,
}

impl HappyDevFormatter {
    /// Creates a formatter for the logger called `name`.
    pub fn new(name: impl Into<String>, config: Config) -> Self {
        // Callers are shown from the live stack, not from the JSON field.
        let json = JsonFormatter::new(name)
            .with_time_format(config.time_format.clone())
            .with_time_function(config.time_function)
            .with_callstack(false);
        let resolver = CallsiteResolver::new(config.context_lines)
            .with_skips(config.warn_skip, config.error_skip);
        Self {
            config,
            json,
            resolver,
        }
    }

    /// Replaces the call site resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: CallsiteResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Renders one record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RenderError::ReservedKey`] (fatal) or
    /// [`crate::RenderError::ComplexKey`] for malformed keys, and
    /// [`crate::RenderError::Encode`] if the canonical encoding fails.
    pub fn render(&self, level: Level, msg: &str, args: &[Value]) -> RenderResult<Vec<u8>> {
        let mut buf = String::new();
        self.format(&mut buf, level, msg, args)?;
        Ok(buf.into_bytes())
    }

    /// Appends one rendered record to `buf`.
    ///
    /// Nothing is appended if an error is returned.
    ///
    /// # Errors
    ///
    /// See [`HappyDevFormatter::render`].
    pub fn format(
        &self,
        buf: &mut String,
        level: Level,
        msg: &str,
        args: &[Value],
    ) -> RenderResult<()> {
        self.format_with(buf, level, msg, args, capture_frames)
    }

    pub(crate) fn format_with(
        &self,
        buf: &mut String,
        level: Level,
        msg: &str,
        args: &[Value],
        frames: impl FnOnce() -> Vec<Frame>,
    ) -> RenderResult<()> {
        keys::validate(args)?;

        // Encode with the production encoder first so values match it.
        let entry = self.json.log_entry(level, msg, args)?;

        let theme = &self.config.theme;
        let mut w = RecordWriter::new(&self.config);

        w.write_colored(&theme.misc, &entry.text(keys::TIME));

        let (context, color) = self.resolver.resolve_with(level, theme, frames);

        w.set("", &entry.text(keys::LEVEL), &color);
        w.set("", &entry.text(keys::NAME), &theme.misc);
        w.set("", &entry.text(keys::MESSAGE), &color);

        for key in ordered_keys(args) {
            match entry.get(&key) {
                Some(FieldValue::ErrorLike { message, stack }) => {
                    w.write_error(&key, message, stack);
                }
                Some(value) => w.set(&key, &value.text(), &theme.value),
                None => w.set(&key, "", &theme.value),
            }
        }

        w.finish(&context);
        buf.push_str(&w.buf);
        Ok(())
    }
}

/// Output of one record with its running column.
struct RecordWriter<'a> {
    config: &'a Config,
    buf: String,
    col: usize,
}

impl<'a> RecordWriter<'a> {
    fn new(config: &'a Config) -> Self {
        Self {
            config,
            buf: String::new(),
            col: 0,
        }
    }

    // Only plain text goes through here; escapes have no width.
    fn write_str(&mut self, s: &str) {
        self.buf.push_str(s);
        self.col += s.width();
    }

    fn write_colored(&mut self, color: &str, s: &str) {
        self.buf.push_str(color);
        self.write_str(s);
        if !color.is_empty() {
            self.buf.push_str(RESET);
        }
    }

    fn write_key(&mut self, key: &str) {
        self.write_str(SEPARATOR);
        if key.is_empty() {
            return;
        }
        let config = self.config;
        let color = &config.theme.key;
        self.buf.push_str(color);
        self.write_str(key);
        self.write_str(ASSIGNMENT);
        if !color.is_empty() {
            self.buf.push_str(RESET);
        }
    }

    /// Writes a field, first breaking the line if pretty mode asks for it or
    /// the field would not fit.
    fn set(&mut self, key: &str, value: &str, color: &str) {
        let val = value.trim_matches(|c| c == '\n' || c == ' ');
        let fits = self.col + key.width() + 1 + val.width() < self.config.max_col;
        if (self.config.pretty && !key.is_empty()) || !fits {
            self.buf.push('\n');
            self.col = 0;
            let config = self.config;
            self.write_str(&config.indent);
        }
        self.write_key(key);
        self.write_colored(color, val);
    }

    fn write_error(&mut self, key: &str, message: &str, stack: &str) {
        let config = self.config;
        self.set(key, &format!("{message}\n{stack}"), &config.theme.error);
    }

    // Context arrives already colored by the resolver.
    fn finish(&mut self, context: &str) {
        let context = context.trim_end_matches('\n');
        if !context.is_empty() {
            self.buf.push('\n');
            self.buf.push_str(context);
        }
        self.buf.push('\n');
    }
}

//! Formatter configuration.
//!
//! A [`Config`] is built once and owned by each formatter. It can come from
//! code, from the environment ([`Config::from_env`]) or from the two
//! configuration strings directly ([`Config::from_specs`]).

use crate::theme::{ColorTheme, DEFAULT_THEME, parse_kv_list};
use std::time::SystemTime;

/// Environment variable holding the color theme.
pub const ENV_COLORS: &str = "HAPPYLOG_COLORS";

/// Environment variable holding the format options.
pub const ENV_FORMAT: &str = "HAPPYLOG_FORMAT";

/// Default timestamp format of terminal records.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S%.6f";

/// Default timestamp format of JSON records.
pub const JSON_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%z";

/// Default maximum column before fields wrap.
pub const DEFAULT_MAX_COL: usize = 80;

/// Default number of source lines shown either side of an error frame.
pub const DEFAULT_CONTEXT_LINES: usize = 2;

/// Type alias for time function.
pub type TimeFunction = fn(SystemTime) -> SystemTime;

/// Returns the time unchanged.
#[must_use]
pub fn now(t: SystemTime) -> SystemTime {
    t
}

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Colorful terminal rendering for developers (default).
    #[default]
    Happy,
    /// Canonical JSON lines.
    Json,
}

/// Formatter configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Color theme.
    pub theme: ColorTheme,
    /// Column at which fields wrap onto a new line.
    pub max_col: usize,
    /// Put every keyed field on its own line.
    pub pretty: bool,
    /// Prefix of wrapped lines.
    pub indent: String,
    /// Source lines shown either side of each error frame.
    pub context_lines: usize,
    /// Frames skipped past the caller for warning context.
    pub warn_skip: usize,
    /// Frames skipped past the caller for error context.
    pub error_skip: usize,
    /// Timestamp format (chrono `strftime` syntax).
    pub time_format: String,
    /// Output encoding.
    pub format: Format,
    /// Clock hook.
    pub time_function: TimeFunction,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: ColorTheme::default(),
            max_col: DEFAULT_MAX_COL,
            pretty: false,
            indent: "  ".to_string(),
            context_lines: DEFAULT_CONTEXT_LINES,
            warn_skip: 0,
            error_skip: 0,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            format: Format::Happy,
            time_function: now,
        }
    }
}

impl Config {
    /// Reads [`ENV_COLORS`] and [`ENV_FORMAT`].
    #[must_use]
    pub fn from_env() -> Self {
        let colors = std::env::var(ENV_COLORS).ok();
        let format = std::env::var(ENV_FORMAT).ok();
        Self::from_specs(colors.as_deref(), format.as_deref())
    }

    /// Builds a configuration from a theme string and a format string.
    ///
    /// The format string is a comma separated list of `happy`, `json`,
    /// `pretty`, `maxcol=N`, `context=N`, `indent=N` and `t=FORMAT`.
    /// Unknown entries and bad numbers are ignored.
    #[must_use]
    pub fn from_specs(colors: Option<&str>, format: Option<&str>) -> Self {
        let mut config = Self {
            theme: ColorTheme::parse(colors.unwrap_or(DEFAULT_THEME)),
            ..Self::default()
        };
        let Some(format) = format else {
            return config;
        };

        let mut time_format = None;
        for (name, value) in parse_kv_list(format, ',') {
            match name.as_str() {
                "happy" => config.format = Format::Happy,
                "json" | "JSON" => config.format = Format::Json,
                "pretty" => config.pretty = true,
                "maxcol" => set_number(&mut config.max_col, &name, &value),
                "context" => set_number(&mut config.context_lines, &name, &value),
                "indent" => {
                    let mut width = config.indent.len();
                    set_number(&mut width, &name, &value);
                    config.indent = " ".repeat(width);
                }
                "t" if !value.is_empty() => time_format = Some(value),
                _ => tracing::debug!(option = %name, "ignoring unknown format option"),
            }
        }

        config.time_format =
            time_format.unwrap_or_else(|| default_time_format(config.format).to_string());
        config
    }

    /// Replaces the theme with a parsed theme string.
    #[must_use]
    pub fn with_theme(mut self, spec: &str) -> Self {
        self.theme = ColorTheme::parse(spec);
        self
    }

    /// Sets the wrap column.
    #[must_use]
    pub fn with_max_col(mut self, max_col: usize) -> Self {
        self.max_col = max_col;
        self
    }

    /// Sets pretty mode.
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Sets the indent of wrapped lines.
    #[must_use]
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Sets the number of source lines around error frames.
    #[must_use]
    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    /// Sets the extra frames skipped for warning and error context.
    #[must_use]
    pub fn with_skips(mut self, warn_skip: usize, error_skip: usize) -> Self {
        self.warn_skip = warn_skip;
        self.error_skip = error_skip;
        self
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

    /// Sets the output encoding.
    ///
    /// A time format still at the default of the old encoding switches to
    /// the default of the new one.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        if self.time_format == default_time_format(self.format) {
            self.time_format = default_time_format(format).to_string();
        }
        self.format = format;
        self
    }
}

fn default_time_format(format: Format) -> &'static str {
    match format {
        Format::Happy => DEFAULT_TIME_FORMAT,
        Format::Json => JSON_TIME_FORMAT,
    }
}

fn set_number(target: &mut usize, name: &str, value: &str) {
    match value.parse() {
        Ok(n) => *target = n,
        Err(_) => tracing::debug!(option = %name, value = %value, "ignoring bad number"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::color_code;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_col, 80);
        assert!(!config.pretty);
        assert_eq!(config.indent, "  ");
        assert_eq!(config.context_lines, 2);
        assert_eq!(config.format, Format::Happy);
        assert_eq!(config.theme, ColorTheme::default());
    }

    #[test]
    fn test_from_specs_format_options() {
        let config = Config::from_specs(None, Some("pretty,maxcol=120,context=5,indent=4"));
        assert!(config.pretty);
        assert_eq!(config.max_col, 120);
        assert_eq!(config.context_lines, 5);
        assert_eq!(config.indent, "    ");
        assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);
    }

    #[test]
    fn test_from_specs_json() {
        let config = Config::from_specs(None, Some("json"));
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.time_format, JSON_TIME_FORMAT);
    }

    #[test]
    fn test_from_specs_time_format() {
        let config = Config::from_specs(None, Some("json,t=%s"));
        assert_eq!(config.time_format, "%s");
    }

    #[test]
    fn test_from_specs_ignores_garbage() {
        let config = Config::from_specs(None, Some("maxcol=wide,bogus,context=-1"));
        assert_eq!(config.max_col, DEFAULT_MAX_COL);
        assert_eq!(config.context_lines, DEFAULT_CONTEXT_LINES);
    }

    #[test]
    fn test_from_specs_theme() {
        let config = Config::from_specs(Some("*=blue"), None);
        assert_eq!(config.theme.key, color_code("blue").unwrap());
        let plain = Config::from_specs(Some(""), None);
        assert_eq!(plain.theme, ColorTheme::plain());
    }

    #[test]
    fn test_with_format_switches_default_time_format() {
        let json = Config::default().with_format(Format::Json);
        assert_eq!(json.time_format, JSON_TIME_FORMAT);
        let back = json.with_format(Format::Happy);
        assert_eq!(back.time_format, DEFAULT_TIME_FORMAT);
        let custom = Config::default()
            .with_time_format("%s")
            .with_format(Format::Json);
        assert_eq!(custom.time_format, "%s");
    }

    #[test]
    fn test_builders() {
        let config = Config::default()
            .with_theme("")
            .with_max_col(40)
            .with_pretty(true)
            .with_indent("\t")
            .with_context_lines(0)
            .with_skips(1, 2)
            .with_time_format("%T")
            .with_format(Format::Json);
        assert_eq!(config.max_col, 40);
        assert!(config.pretty);
        assert_eq!(config.indent, "\t");
        assert_eq!(config.context_lines, 0);
        assert_eq!((config.warn_skip, config.error_skip), (1, 2));
        assert_eq!(config.time_format, "%T");
        assert_eq!(config.format, Format::Json);
    }
}

//! Color themes for the terminal formatter.
//!
//! A theme is parsed from a compact string such as
//! `"*=white,key=cyan+h,value,ERR=red+h"`. Each entry names a slot and a
//! style; `*` is a wildcard applied to every slot that does not resolve on
//! its own. Unknown slots and unresolvable styles are ignored so a theme
//! string never fails to parse.

use crate::Level;
use std::collections::HashMap;

/// Escape sequence that clears all styling.
pub const RESET: &str = "\x1b[0m";

/// Theme used when none is configured.
pub const DEFAULT_THEME: &str =
    "key=cyan+h,value,misc=blue,source=magenta,DBG,INF=green,WRN=yellow,ERR=red+h";

/// Escape sequences for each part of a rendered record.
///
/// An empty string means "no styling".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTheme {
    /// Field keys.
    pub key: String,
    /// Field values.
    pub value: String,
    /// Timestamp and logger name.
    pub misc: String,
    /// Source lines in call site context.
    pub source: String,
    /// Debug records.
    pub debug: String,
    /// Info records.
    pub info: String,
    /// Warning records.
    pub warn: String,
    /// Error and fatal records.
    pub error: String,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self::parse(DEFAULT_THEME)
    }
}

impl ColorTheme {
    /// A theme without any styling.
    #[must_use]
    pub fn plain() -> Self {
        Self::parse("")
    }

    /// Parses a theme string.
    ///
    /// Slot names are `key`, `value`, `misc`, `source`, `DBG`, `INF`, `WRN`
    /// and `ERR`. A bare name records the slot with an empty style.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let entries = parse_kv_list(spec, ',');
        let resolve = |name: &str| entries.get(name).and_then(|style| color_code(style));

        // A reset wildcard is the same as no wildcard.
        let wildcard = resolve("*").filter(|w| w != RESET).unwrap_or_default();
        let slot = |name: &str| resolve(name).unwrap_or_else(|| wildcard.clone());

        Self {
            key: slot("key"),
            value: slot("value"),
            misc: slot("misc"),
            source: slot("source"),
            debug: slot("DBG"),
            info: slot("INF"),
            warn: slot("WRN"),
            error: slot("ERR"),
        }
    }

    /// Returns the color of a level. Fatal shares the error color.
    #[must_use]
    pub fn level(&self, level: Level) -> &str {
        match level {
            Level::Debug => &self.debug,
            Level::Info => &self.info,
            Level::Warn => &self.warn,
            Level::Error | Level::Fatal => &self.error,
        }
    }
}

/// Splits `a=1,b,c=3` style lists. A bare name maps to an empty value and
/// entries with more than one `=` are dropped.
pub(crate) fn parse_kv_list(s: &str, separator: char) -> HashMap<String, String> {
    let mut m = HashMap::new();
    for pair in s.split(separator) {
        if pair.is_empty() {
            continue;
        }
        let parts: Vec<&str> = pair.split('=').collect();
        match parts.as_slice() {
            [name] => {
                m.insert((*name).to_string(), String::new());
            }
            [name, value] => {
                m.insert((*name).to_string(), (*value).to_string());
            }
            _ => {}
        }
    }
    m
}

/// Resolves a style such as `red+b:white` to an escape sequence.
///
/// The form is `foreground[+attributes][:background[+attributes]]`.
/// Colors are the eight ANSI names, `default`, a palette number `0`-`255`
/// or a `#rgb`/`#rrggbb` hex color. Attributes are `b` bold, `d` dim,
/// `i` inverse, `u` underline, `B` blink, `s` strikethrough and `h` high
/// intensity. `reset` yields [`RESET`]; `off`, the empty string and
/// anything unresolvable yield `None`.
#[must_use]
pub fn color_code(style: &str) -> Option<String> {
    let style = style.trim();
    match style {
        "" | "off" => return None,
        "reset" => return Some(RESET.to_string()),
        _ => {}
    }

    let (fg, bg) = style.split_once(':').unwrap_or((style, ""));
    let mut codes = Vec::new();
    push_part(&mut codes, fg, false);
    push_part(&mut codes, bg, true);

    if codes.is_empty() {
        None
    } else {
        Some(format!("\x1b[{}m", codes.join(";")))
    }
}

fn push_part(codes: &mut Vec<String>, part: &str, background: bool) {
    if part.is_empty() {
        return;
    }
    let (color, attrs) = part.split_once('+').unwrap_or((part, ""));
    let bright = attrs.contains('h');

    for attr in attrs.chars() {
        let code = match attr {
            'b' => "1",
            'd' => "2",
            'u' => "4",
            'B' => "5",
            'i' => "7",
            's' => "9",
            _ => continue,
        };
        codes.push(code.to_string());
    }

    if let Some(code) = color_sgr(color, background, bright) {
        codes.push(code);
    }
}

fn color_sgr(color: &str, background: bool, bright: bool) -> Option<String> {
    let base = match color {
        "black" => Some(0),
        "red" => Some(1),
        "green" => Some(2),
        "yellow" => Some(3),
        "blue" => Some(4),
        "magenta" => Some(5),
        "cyan" => Some(6),
        "white" => Some(7),
        _ => None,
    };
    if let Some(n) = base {
        let offset = match (background, bright) {
            (false, false) => 30,
            (false, true) => 90,
            (true, false) => 40,
            (true, true) => 100,
        };
        return Some((offset + n).to_string());
    }

    let lead = if background { 48 } else { 38 };
    if color == "default" {
        return Some((lead + 1).to_string());
    }
    if let Ok(n) = color.parse::<u8>() {
        return Some(format!("{lead};5;{n}"));
    }
    let (r, g, b) = hex_rgb(color)?;
    Some(format!("{lead};2;{r};{g};{b}"))
}

fn hex_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some((
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )),
        3 => Some((
            u8::from_str_radix(&hex[0..1], 16).ok()? * 17,
            u8::from_str_radix(&hex[1..2], 16).ok()? * 17,
            u8::from_str_radix(&hex[2..3], 16).ok()? * 17,
        )),
        _ => None,
    }
}

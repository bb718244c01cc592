//! Call site context for warnings and errors.
//!
//! Warnings show the single frame that logged them, on one line. Errors show
//! every frame of the call chain with a few lines of surrounding source.

use crate::Level;
use crate::theme::{ColorTheme, RESET};
use backtrace::Backtrace;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A resolved stack frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Source file, if debug info has one.
    pub file: Option<PathBuf>,
    /// Line number, 1-based.
    pub line: u32,
    /// Demangled function path.
    pub function: String,
}

impl Frame {
    /// Creates a frame with a known source location.
    pub fn new(file: impl Into<PathBuf>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            line,
            function: function.into(),
        }
    }
}

/// Reads source files for context lines.
pub trait SourceReader: Send + Sync {
    /// Returns the lines of `path`, or `None` if it cannot be read.
    fn read_lines(&self, path: &Path) -> Option<Vec<String>>;
}

/// Reads source from the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSourceReader;

impl SourceReader for FileSourceReader {
    fn read_lines(&self, path: &Path) -> Option<Vec<String>> {
        match std::fs::read_to_string(path) {
            Ok(src) => Some(src.lines().map(str::to_string).collect()),
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "source unavailable");
                None
            }
        }
    }
}

// Frames from these crates are the logging machinery itself.
const INTERNAL_PREFIXES: [&str; 2] = ["happylog::", "backtrace::"];

const RUNTIME_PREFIXES: [&str; 5] = ["std::", "core::", "alloc::", "test::", "__rust"];

fn is_internal(frame: &Frame) -> bool {
    let name = frame.function.trim_start_matches('<');
    INTERNAL_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn is_runtime(frame: &Frame) -> bool {
    let name = frame.function.trim_start_matches('<');
    frame.file.is_none()
        || RUNTIME_PREFIXES.iter().any(|p| name.starts_with(p))
        || name.contains(" as core::ops::function::Fn")
}

/// Captures the current stack with the logging machinery and the language
/// runtime removed. The first frame is the code that made the log call.
///
/// # Performance Warning
///
/// Captures and symbolizes a full backtrace (~100μs or more).
#[must_use]
pub fn capture_frames() -> Vec<Frame> {
    let bt = Backtrace::new();
    let frames = bt.frames().iter().flat_map(|frame| {
        // Inlined calls show up as extra symbols of one frame.
        frame.symbols().iter().map(|symbol| Frame {
            file: symbol.filename().map(Path::to_path_buf),
            line: symbol.lineno().unwrap_or(0),
            function: symbol
                .name()
                .map(|n| format!("{n:#}"))
                .unwrap_or_else(|| "<unknown>".to_string()),
        })
    });

    caller_frames(frames)
}

// Everything up to the last library frame is the logging machinery,
// including frames reached through closures and fn pointer shims.
fn caller_frames(frames: impl IntoIterator<Item = Frame>) -> Vec<Frame> {
    let mut frames: Vec<Frame> = frames.into_iter().filter(|f| !is_runtime(f)).collect();
    let start = frames.iter().rposition(is_internal).map_or(0, |i| i + 1);
    frames.drain(..start);
    frames
}

/// Turns a stack into call site context, with a policy per level.
#[derive(Clone)]
pub struct CallsiteResolver {
    warn_skip: usize,
    error_skip: usize,
    context_lines: usize,
    reader: Arc<dyn SourceReader>,
    cwd: Option<PathBuf>,
    home: Option<PathBuf>,
}

impl std::fmt::Debug for CallsiteResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallsiteResolver")
            .field("warn_skip", &self.warn_skip)
            .field("error_skip", &self.error_skip)
            .field("context_lines", &self.context_lines)
            .finish()
    }
}

impl Default for CallsiteResolver {
    fn default() -> Self {
        Self::new(2)
    }
}

impl CallsiteResolver {
    /// Creates a resolver showing `context_lines` lines either side of each
    /// error frame.
    #[must_use]
    pub fn new(context_lines: usize) -> Self {
        Self {
            warn_skip: 0,
            error_skip: 0,
            context_lines,
            reader: Arc::new(FileSourceReader),
            cwd: std::env::current_dir().ok(),
            home: std::env::var_os("HOME").map(PathBuf::from),
        }
    }

    /// Sets how many caller frames to skip for warnings and errors.
    #[must_use]
    pub fn with_skips(mut self, warn_skip: usize, error_skip: usize) -> Self {
        self.warn_skip = warn_skip;
        self.error_skip = error_skip;
        self
    }

    /// Replaces the source reader.
    #[must_use]
    pub fn with_reader(mut self, reader: Arc<dyn SourceReader>) -> Self {
        self.reader = reader;
        self
    }

    /// Sets the directories paths are shown relative to.
    #[must_use]
    pub fn with_dirs(mut self, cwd: Option<PathBuf>, home: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self.home = home;
        self
    }

    /// Returns the context for a record and the color to render it in.
    ///
    /// Only walks the stack for warnings and above.
    #[must_use]
    pub fn resolve(&self, level: Level, theme: &ColorTheme) -> (String, String) {
        self.resolve_with(level, theme, capture_frames)
    }

    pub(crate) fn resolve_with(
        &self,
        level: Level,
        theme: &ColorTheme,
        frames: impl FnOnce() -> Vec<Frame>,
    ) -> (String, String) {
        match level {
            Level::Debug | Level::Info => (String::new(), theme.level(level).to_string()),
            _ => self.resolve_frames(level, &frames(), theme),
        }
    }

    /// Applies the level policy to an explicit stack, innermost frame first.
    #[must_use]
    pub fn resolve_frames(
        &self,
        level: Level,
        frames: &[Frame],
        theme: &ColorTheme,
    ) -> (String, String) {
        let color = theme.level(level);
        let context = match level {
            Level::Debug | Level::Info => String::new(),
            Level::Warn => frames
                .get(self.warn_skip)
                .map(|frame| self.inline(frame, color, &theme.source))
                .unwrap_or_default(),
            Level::Error | Level::Fatal => {
                let mut buf = String::new();
                for frame in frames.iter().skip(self.error_skip) {
                    let ctx = self.block(frame, color, &theme.source);
                    if ctx.is_empty() {
                        continue;
                    }
                    buf.push_str(&ctx);
                    buf.push('\n');
                }
                buf
            }
        };
        (context, color.to_string())
    }

    fn location(&self, frame: &Frame, color: &str) -> Option<String> {
        let file = frame.file.as_deref()?;
        Some(format!(
            "{}{}:{}{}",
            color,
            self.display_path(file),
            frame.line,
            reset(color)
        ))
    }

    fn inline(&self, frame: &Frame, color: &str, source_color: &str) -> String {
        let Some(mut out) = self.location(frame, color) else {
            return String::new();
        };
        let line = frame.file.as_deref().and_then(|file| {
            let lines = self.reader.read_lines(file)?;
            lines.get(frame.line.checked_sub(1)? as usize).cloned()
        });
        if let Some(src) = line {
            let _ = write!(out, " {}{}{}", source_color, src.trim(), reset(source_color));
        }
        out
    }

    fn block(&self, frame: &Frame, color: &str, source_color: &str) -> String {
        let Some(file) = frame.file.as_deref() else {
            return String::new();
        };
        let Some(lines) = self.reader.read_lines(file) else {
            return String::new();
        };
        let line = frame.line as usize;
        if line == 0 || line > lines.len() {
            return String::new();
        }
        let Some(mut out) = self.location(frame, color) else {
            return String::new();
        };

        let first = line.saturating_sub(self.context_lines).max(1);
        let last = (line + self.context_lines).min(lines.len());
        for n in first..=last {
            let marker = if n == line { "=> " } else { "   " };
            let _ = write!(
                out,
                "\n{}{}{:>5}: {}{}",
                source_color,
                marker,
                n,
                lines[n - 1],
                reset(source_color)
            );
        }
        out
    }

    fn display_path(&self, file: &Path) -> String {
        if let Some(rel) = self.cwd.as_deref().and_then(|cwd| file.strip_prefix(cwd).ok()) {
            return rel.display().to_string();
        }
        if let Some(rel) = self.home.as_deref().and_then(|home| file.strip_prefix(home).ok()) {
            return Path::new("~").join(rel).display().to_string();
        }
        file.display().to_string()
    }
}

fn reset(color: &str) -> &'static str {
    if color.is_empty() { "" } else { RESET }
}

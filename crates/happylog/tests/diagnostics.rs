//! Tests for the internal diagnostics emitted through `tracing`.
//!
//! Tests verify:
//! - Non-string keys are reported but still rendered
//! - Malformed logger calls are reported
//! - Ignored format options are reported at debug level

use happylog::{Config, HappyDevFormatter, Level, Logger, Value};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a subscriber that records every event, returning the log.
fn captured(f: impl FnOnce()) -> String {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    capture.text()
}

#[test]
fn non_string_key_is_reported_and_rendered() {
    let mut out = String::new();
    let log = captured(|| {
        let f = HappyDevFormatter::new("app", Config::default().with_theme(""));
        f.format(&mut out, Level::Info, "m", &[Value::from(42), "v".into()])
            .unwrap();
    });
    assert!(log.contains("key is not a string"), "{log}");
    assert!(log.contains("args[0]"), "{log}");
    assert!(log.contains("ERROR"), "{log}");
    assert!(out.contains("BADKEY_AT_INDEX_0: v"), "{out}");
}

#[test]
fn string_keys_are_silent() {
    let log = captured(|| {
        let f = HappyDevFormatter::new("app", Config::default().with_theme(""));
        f.render(Level::Info, "m", &["a".into(), "1".into()]).unwrap();
    });
    assert!(!log.contains("key is not a string"), "{log}");
}

#[test]
fn malformed_logger_call_is_reported() {
    let log = captured(|| {
        let logger = Logger::with_config("app", Config::default()).with_writer(io::sink());
        logger.info("m", &["bad\"key".into(), "1".into()]);
    });
    assert!(log.contains("malformed log call"), "{log}");
    assert!(log.contains("fatal=false"), "{log}");
}

#[test]
fn unknown_format_options_are_reported() {
    let log = captured(|| {
        let config = Config::from_specs(None, Some("sparkly,maxcol=wide"));
        assert_eq!(config.max_col, happylog::config::DEFAULT_MAX_COL);
    });
    assert!(log.contains("ignoring unknown format option"), "{log}");
    assert!(log.contains("sparkly"), "{log}");
    assert!(log.contains("ignoring bad number"), "{log}");
}

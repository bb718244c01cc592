#![allow(clippy::uninlined_format_args)]

use happylog::theme::color_code;
use happylog::{ColorTheme, Config, HappyDevFormatter, Level, Value, keys};
use proptest::prelude::*;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn fixed(_: SystemTime) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

fn formatter(config: Config) -> HappyDevFormatter {
    HappyDevFormatter::new(
        "app",
        config
            .with_theme("")
            .with_time_format("TS")
            .with_time_function(fixed),
    )
}

fn render(f: &HappyDevFormatter, level: Level, args: &[Value]) -> String {
    String::from_utf8(f.render(level, "msg", args).unwrap()).unwrap()
}

/// Builds `k0, v0, k1, v1, ...` with distinct keys.
fn pairs(keys: &[String], values: &[String]) -> Vec<Value> {
    keys.iter()
        .zip(values)
        .enumerate()
        .flat_map(|(i, (k, v))| [Value::from(format!("{k}{i}")), Value::from(v.as_str())])
        .collect()
}

fn level_strategy() -> impl Strategy<Value = Level> {
    prop::sample::select(vec![Level::Debug, Level::Info])
}

// =============================================================================
// Record shape
// =============================================================================

proptest! {
    #[test]
    fn records_end_with_one_newline(
        keys in prop::collection::vec("[a-z_]{2,8}", 0..6),
        values in prop::collection::vec("[ -~]{0,30}", 6),
        level in level_strategy(),
        max_col in 10usize..120,
    ) {
        let f = formatter(Config::default().with_max_col(max_col));
        let out = render(&f, level, &pairs(&keys, &values));
        prop_assert!(out.ends_with('\n'));
        prop_assert!(!out.ends_with("\n\n"));
    }

    #[test]
    fn every_key_appears_once_in_call_order(
        keys in prop::collection::vec("[a-z]{2,6}", 1..6),
        values in prop::collection::vec("[a-z0-9]{1,10}", 6),
    ) {
        let f = formatter(Config::default());
        let args = pairs(&keys, &values);
        let out = render(&f, Level::Info, &args);
        let mut last = 0;
        for key in args.iter().step_by(2) {
            let needle = format!(" {}: ", key);
            prop_assert_eq!(out.matches(&needle).count(), 1, "{}", out);
            let at = out.find(&needle).unwrap();
            prop_assert!(at >= last);
            last = at;
        }
    }

    #[test]
    fn odd_args_show_imbalance_sentinel_once(
        keys in prop::collection::vec("[a-z]{2,6}", 0..5),
        values in prop::collection::vec("[a-z]{1,6}", 5),
        dangling in "[a-z]{2,6}",
    ) {
        let f = formatter(Config::default());
        let mut args = pairs(&keys, &values);
        let index = args.len();
        args.push(Value::from(dangling.as_str()));
        let out = render(&f, Level::Info, &args);
        let sentinel = keys::imbalanced_key_at_index(index);
        prop_assert_eq!(out.matches(&sentinel).count(), 1, "{}", out);
        let expected = format!("{}: {}\n", sentinel, dangling);
        prop_assert!(out.ends_with(&expected), "{}", out);
    }

    #[test]
    fn reserved_key_anywhere_is_fatal(
        keys in prop::collection::vec("[a-z]{2,6}", 0..5),
        values in prop::collection::vec("[a-z]{1,6}", 6),
        reserved in prop::sample::select(keys::RESERVED.to_vec()),
        position in 0usize..6,
    ) {
        let mut args = pairs(&keys, &values);
        let at = (position * 2).min(args.len());
        args.insert(at, Value::from("x"));
        args.insert(at, Value::from(reserved));
        let f = formatter(Config::default());
        let err = f.render(Level::Info, "msg", &args).unwrap_err();
        prop_assert!(err.is_fatal());
    }

    #[test]
    fn rendering_is_deterministic(
        keys in prop::collection::vec("[a-z]{2,6}", 0..6),
        values in prop::collection::vec("[ -~]{0,20}", 6),
        level in level_strategy(),
    ) {
        let f = formatter(Config::default().with_max_col(40));
        let args = pairs(&keys, &values);
        prop_assert_eq!(render(&f, level, &args), render(&f, level, &args));
    }

    #[test]
    fn pretty_mode_puts_each_field_on_its_own_line(
        keys in prop::collection::vec("[a-z]{2,6}", 0..6),
        values in prop::collection::vec("[a-z0-9]{1,10}", 6),
    ) {
        let f = formatter(Config::default().with_pretty(true));
        let out = render(&f, Level::Info, &pairs(&keys, &values));
        prop_assert_eq!(out.lines().count(), keys.len() + 1, "{}", out);
    }
}

// =============================================================================
// Themes
// =============================================================================

proptest! {
    #[test]
    fn explicit_slot_beats_wildcard(
        wildcard in prop::sample::select(vec!["red", "blue", "green", "208", "#ff8800"]),
        slot in prop::sample::select(vec!["key", "value", "misc", "source", "DBG", "INF", "WRN", "ERR"]),
        color in prop::sample::select(vec!["yellow+b", "magenta", "cyan+h", "42"]),
    ) {
        let theme = ColorTheme::parse(&format!("*={wildcard},{slot}={color}"));
        let slots = [
            ("key", &theme.key),
            ("value", &theme.value),
            ("misc", &theme.misc),
            ("source", &theme.source),
            ("DBG", &theme.debug),
            ("INF", &theme.info),
            ("WRN", &theme.warn),
            ("ERR", &theme.error),
        ];
        let wild = color_code(wildcard).unwrap();
        let own = color_code(color).unwrap();
        for (name, code) in slots {
            if name == slot {
                prop_assert_eq!(code, &own);
            } else {
                prop_assert_eq!(code, &wild);
            }
        }
    }

    #[test]
    fn color_codes_are_sgr_sequences(
        fg in prop::sample::select(vec!["black", "red", "green", "yellow", "blue", "magenta", "cyan", "white", "default"]),
        attrs in "[bdusBih]{0,3}",
        n in 0u8..=255,
    ) {
        for style in [format!("{fg}+{attrs}"), format!("{n}:{fg}"), format!("{fg}:{n}+{attrs}")] {
            let code = color_code(&style).unwrap();
            prop_assert!(code.starts_with("\x1b["), "{:?}", code);
            prop_assert!(code.ends_with('m'), "{:?}", code);
        }
    }
}

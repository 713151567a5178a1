//! Console logger for the service binary.
//!
//! Renders `log` records in the service's console style: warnings and errors
//! go to stderr with an emoji prefix, everything else to stdout.

use std::env;

use log::{Level, LevelFilter, Log, Metadata, Record};

const LEVEL_VAR: &str = "STOW_IT_NOW_LOG";

struct ConsoleLogger {
    level: LevelFilter,
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("{} {}", prefix(record.level()), record.args());
        match record.level() {
            Level::Error | Level::Warn => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    fn flush(&self) {}
}

fn prefix(level: Level) -> &'static str {
    match level {
        Level::Error => "❌",
        Level::Warn => "⚠️",
        Level::Info => "ℹ️",
        Level::Debug => "🔍",
        Level::Trace => "·",
    }
}

fn parse_level(raw: &str) -> Option<LevelFilter> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Installs the console logger. Calling it twice keeps the first logger.
pub fn init() {
    let raw = env::var(LEVEL_VAR).ok();
    let level = raw.as_deref().and_then(parse_level).unwrap_or(LevelFilter::Info);

    let logger = Box::new(ConsoleLogger { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level);
    }
    if let Some(raw) = raw.filter(|raw| parse_level(raw).is_none()) {
        log::warn!(
            "Could not interpret {} ('{}') as log level. Using info.",
            LEVEL_VAR,
            raw
        );
    }
}

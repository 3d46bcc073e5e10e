//! Structured JSON logger
//!
//! - One line per event
//! - `ts`, `level`, `event` first, then fields sorted by key
//! - ERROR and FATAL go to stderr, everything else to stdout
//! - A process-wide minimum level filters lines before they are rendered

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Log levels, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    /// The process cannot continue
    Fatal = 5,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Parses a level name, case-insensitively.
    pub fn parse(name: &str) -> Option<Level> {
        match name.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "fatal" => Some(Level::Fatal),
            _ => None,
        }
    }

    fn from_u8(value: u8) -> Level {
        match value {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Fatal,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static MIN_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

/// Process-wide structured logger
pub struct Logger;

impl Logger {
    /// Sets the minimum level that will be written.
    pub fn set_min_level(level: Level) {
        MIN_LEVEL.store(level as u8, Ordering::Relaxed);
    }

    /// Returns the current minimum level.
    pub fn min_level() -> Level {
        Level::from_u8(MIN_LEVEL.load(Ordering::Relaxed))
    }

    pub fn enabled(level: Level) -> bool {
        level >= Self::min_level()
    }

    /// Logs an event with the given level and fields.
    pub fn log(level: Level, event: &str, fields: &[(&str, &str)]) {
        if !Self::enabled(level) {
            return;
        }

        let line = render(Utc::now(), level, event, fields);
        if level >= Level::Error {
            write_line(&mut io::stderr().lock(), &line);
        } else {
            write_line(&mut io::stdout().lock(), &line);
        }
    }

    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Level::Trace, event, fields);
    }

    pub fn debug(event: &str, fields: &[(&str, &str)]) {
        Self::log(Level::Debug, event, fields);
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Level::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Level::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Level::Error, event, fields);
    }

    pub fn fatal(event: &str, fields: &[(&str, &str)]) {
        Self::log(Level::Fatal, event, fields);
    }
}

/// Renders one log line, including the trailing newline.
pub(crate) fn render(
    ts: DateTime<Utc>,
    level: Level,
    event: &str,
    fields: &[(&str, &str)],
) -> String {
    let mut line = String::with_capacity(128);

    line.push_str("{\"ts\":");
    push_json_str(&mut line, &ts.to_rfc3339_opts(SecondsFormat::Micros, true));
    line.push_str(",\"level\":");
    push_json_str(&mut line, level.as_str());
    line.push_str(",\"event\":");
    push_json_str(&mut line, event);

    let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);

    for (key, value) in sorted {
        line.push(',');
        push_json_str(&mut line, key);
        line.push(':');
        push_json_str(&mut line, value);
    }

    line.push_str("}\n");
    line
}

fn push_json_str(out: &mut String, s: &str) {
    out.push_str(&Value::String(s.to_owned()).to_string());
}

// A failing log sink must never take the queue down with it.
fn write_line<W: Write>(writer: &mut W, line: &str) {
    let _ = writer.write_all(line.as_bytes());
    let _ = writer.flush();
}

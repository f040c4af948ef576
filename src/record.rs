use chrono::{DateTime, Utc};
use serde::Serialize;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;
use std::panic::Location;

/// Severity of a [`LogRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Upper-case name used in the transport record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Positional argument interpolated into a record's message template.
///
/// Displays the way Python's `str()` renders the same value (`True`,
/// `2.0`, `nan`), since templates follow `%`-formatting conventions.
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for LogArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogArg::Str(s) => f.write_str(s),
            LogArg::Int(i) => write!(f, "{}", i),
            LogArg::Float(x) if x.is_nan() => f.write_str("nan"),
            LogArg::Float(x) if x.is_infinite() => {
                f.write_str(if *x > 0.0 { "inf" } else { "-inf" })
            }
            LogArg::Float(x) if x.fract() == 0.0 && x.abs() < 1e16 => write!(f, "{:.1}", x),
            LogArg::Float(x) => write!(f, "{}", x),
            LogArg::Bool(true) => f.write_str("True"),
            LogArg::Bool(false) => f.write_str("False"),
        }
    }
}

impl From<&str> for LogArg {
    fn from(value: &str) -> Self {
        LogArg::Str(value.to_string())
    }
}

impl From<String> for LogArg {
    fn from(value: String) -> Self {
        LogArg::Str(value)
    }
}

impl From<i64> for LogArg {
    fn from(value: i64) -> Self {
        LogArg::Int(value)
    }
}

impl From<i32> for LogArg {
    fn from(value: i32) -> Self {
        LogArg::Int(value as i64)
    }
}

impl From<u32> for LogArg {
    fn from(value: u32) -> Self {
        LogArg::Int(value as i64)
    }
}

impl From<f64> for LogArg {
    fn from(value: f64) -> Self {
        LogArg::Float(value)
    }
}

impl From<bool> for LogArg {
    fn from(value: bool) -> Self {
        LogArg::Bool(value)
    }
}

/// Error details attached to a [`LogRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionInfo {
    pub exc_type: String,
    pub exc_val: String,
    pub exc_tb: Vec<String>,
}

impl ExceptionInfo {
    /// Capture an error together with a backtrace taken at the call site.
    ///
    /// When the platform cannot produce a backtrace, the frames fall back
    /// to the caller location followed by the error's `source()` chain, so
    /// `exc_tb` is never empty.
    #[track_caller]
    pub fn capture<E>(err: &E) -> Self
    where
        E: Error + ?Sized,
    {
        let location = Location::caller();
        let backtrace = Backtrace::force_capture();
        let mut frames = match backtrace.status() {
            BacktraceStatus::Captured => split_backtrace(&backtrace.to_string()),
            _ => Vec::new(),
        };
        if frames.is_empty() {
            frames.push(format!("at {}:{}", location.file(), location.line()));
        }
        frames.extend(source_chain(err));

        ExceptionInfo {
            exc_type: short_type_name(std::any::type_name::<E>()),
            exc_val: err.to_string(),
            exc_tb: frames,
        }
    }

    /// Build from a type-erased error, as recorded by `tracing` fields.
    ///
    /// The type name is recovered from the error's `Debug` output since a
    /// `dyn Error` carries no name of its own.
    pub fn from_dyn(err: &(dyn Error + 'static), origin: Option<(&str, u32)>) -> Self {
        let mut frames = Vec::new();
        if let Some((file, line)) = origin {
            frames.push(format!("at {}:{}", file, line));
        }
        frames.extend(source_chain(err));
        if frames.is_empty() {
            frames.push("at <unknown>".to_string());
        }

        ExceptionInfo {
            exc_type: debug_type_name(err),
            exc_val: err.to_string(),
            exc_tb: frames,
        }
    }
}

fn source_chain<E>(err: &E) -> Vec<String>
where
    E: Error + ?Sized,
{
    let mut chain = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        chain.push(format!("caused by: {}", cause));
        current = cause.source();
    }
    chain
}

// Frames in `Backtrace`'s display start with an index ("  3: symbol"),
// followed by optional "at file:line" continuation lines.
fn split_backtrace(rendered: &str) -> Vec<String> {
    let mut frames: Vec<String> = Vec::new();
    for line in rendered.lines() {
        let trimmed = line.trim_start();
        let starts_frame = trimmed
            .split_once(':')
            .map(|(idx, _)| !idx.is_empty() && idx.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false);
        match frames.last_mut() {
            Some(frame) if !starts_frame => {
                frame.push('\n');
                frame.push_str(line);
            }
            _ => frames.push(line.to_string()),
        }
    }
    frames
}

fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

fn debug_type_name(err: &(dyn Error + 'static)) -> String {
    let debug = format!("{:?}", err);
    let name: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() {
        "Error".to_string()
    } else {
        name
    }
}

/// Raw log event as produced by application code.
///
/// Created once and handed to the formatter, which consumes it.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub logger: String,
    pub template: String,
    pub args: Vec<LogArg>,
    pub exception: Option<ExceptionInfo>,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl LogRecord {
    /// New record stamped with the current time and the caller's location.
    #[track_caller]
    pub fn new(level: Level, logger: impl Into<String>, template: impl Into<String>) -> Self {
        let location = Location::caller();
        LogRecord {
            timestamp: Utc::now(),
            level,
            logger: logger.into(),
            template: template.into(),
            args: Vec::new(),
            exception: None,
            file: Some(location.file().to_string()),
            line: Some(location.line()),
        }
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<LogArg>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }
}

/// Formatted record shipped to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportRecord {
    pub time: String,
    pub message: String,
    pub level: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionInfo>,
}

/// A [`TransportRecord`] together with its serialized JSON envelope.
///
/// This is the unit stored in the queue and handed to sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedRecord {
    pub record: TransportRecord,
    pub json: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: std::io::Error,
    }

    #[test]
    fn capture_names_the_concrete_type() {
        let err = Outer {
            inner: std::io::Error::new(std::io::ErrorKind::Other, "disk gone"),
        };
        let info = ExceptionInfo::capture(&err);

        assert_eq!(info.exc_type, "Outer");
        assert_eq!(info.exc_val, "outer failure");
        assert!(!info.exc_tb.is_empty());
        assert_eq!(info.exc_tb.last().unwrap(), "caused by: disk gone");
    }

    #[test]
    fn from_dyn_recovers_name_from_debug() {
        let err = "x".parse::<i32>().unwrap_err();
        let info = ExceptionInfo::from_dyn(&err, Some(("src/main.rs", 7)));

        assert_eq!(info.exc_type, "ParseIntError");
        assert_eq!(info.exc_tb, vec!["at src/main.rs:7".to_string()]);
    }

    #[test]
    fn backtrace_lines_group_into_frames() {
        let rendered = "   0: first\n             at src/a.rs:1:2\n   1: second\n";
        let frames = split_backtrace(rendered);

        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains("src/a.rs"));
        assert!(frames[1].ends_with("second"));
    }

    #[test]
    fn tracing_levels_map_to_names() {
        assert_eq!(Level::from(tracing::Level::WARN).as_str(), "WARNING");
        assert_eq!(Level::from(tracing::Level::ERROR).to_string(), "ERROR");
    }
}

use crate::interpolate::{brace_format, percent_format};
use crate::record::{LogRecord, QueuedRecord, TransportRecord};
use chrono::Local;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Serializes [`LogRecord`]s into the JSON transport representation.
///
/// Formatting never fails: interpolation problems degrade the message to
/// a brace-formatted or literal template, and a serialization failure
/// degrades to a minimal JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        JsonFormatter
    }

    /// Build the transport record for `record`.
    pub fn transport(&self, record: &LogRecord) -> TransportRecord {
        TransportRecord {
            time: record
                .timestamp
                .with_timezone(&Local)
                .naive_local()
                .format(TIME_FORMAT)
                .to_string(),
            message: render_message(record),
            level: record.level.as_str().to_string(),
            file: record.file.clone().unwrap_or_default(),
            exception: record.exception.clone(),
        }
    }

    /// Format `record` into a JSON object string.
    pub fn format(&self, record: &LogRecord) -> String {
        encode(&self.transport(record))
    }

    /// Format `record` into the unit stored on the queue.
    pub fn queued(&self, record: LogRecord) -> QueuedRecord {
        let transport = self.transport(&record);
        let json = encode(&transport);
        QueuedRecord {
            record: transport,
            json,
        }
    }
}

fn render_message(record: &LogRecord) -> String {
    if record.args.is_empty() {
        return record.template.clone();
    }
    percent_format(&record.template, &record.args)
        .or_else(|_| brace_format(&record.template, &record.args))
        .unwrap_or_else(|_| record.template.clone())
}

fn encode(transport: &TransportRecord) -> String {
    serde_json::to_string(transport).unwrap_or_else(|_| {
        serde_json::json!({
            "time": transport.time,
            "message": transport.message,
            "level": transport.level,
            "file": transport.file,
        })
        .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ExceptionInfo, Level, LogArg};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    fn parse(json: &str) -> Value {
        serde_json::from_str(json).expect("formatter output is valid JSON")
    }

    #[test]
    fn interpolates_positional_args() {
        let record = LogRecord::new(Level::Info, "app", "user %s logged in %d times")
            .with_args([LogArg::from("ana"), LogArg::Int(4)]);
        let value = parse(&JsonFormatter::new().format(&record));

        assert_eq!(value["message"], "user ana logged in 4 times");
        assert_eq!(value["level"], "INFO");
        assert!(value["file"].as_str().unwrap().ends_with("formatter.rs"));
        assert!(value.get("exception").is_none());
    }

    #[test]
    fn arity_mismatch_falls_back_to_template() {
        let record = LogRecord::new(Level::Warning, "app", "%s-%d").with_args(["a"]);
        let value = parse(&JsonFormatter::new().format(&record));

        assert_eq!(value["message"], "%s-%d");
    }

    #[test]
    fn percent_failure_tries_brace_placeholders() {
        let record = LogRecord::new(Level::Error, "app", "cache {} missed").with_args(["users"]);
        let transport = JsonFormatter::new().transport(&record);

        assert_eq!(transport.message, "cache users missed");
    }

    #[test]
    fn template_without_args_is_left_alone() {
        let record = LogRecord::new(Level::Debug, "app", "100% done {}");
        assert_eq!(JsonFormatter::new().transport(&record).message, "100% done {}");
    }

    #[test]
    fn exception_is_nested() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");
        let record = LogRecord::new(Level::Error, "app", "startup failed")
            .with_exception(ExceptionInfo::capture(&err));
        let value = parse(&JsonFormatter::new().format(&record));

        let exception = &value["exception"];
        assert_eq!(exception["exc_type"], "Error");
        assert_eq!(exception["exc_val"], "config.toml missing");
        assert!(!exception["exc_tb"].as_array().unwrap().is_empty());
    }

    #[test]
    fn time_is_local_iso8601() {
        let mut record = LogRecord::new(Level::Info, "app", "tick");
        record.timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let expected = record
            .timestamp
            .with_timezone(&Local)
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();

        let transport = JsonFormatter::new().transport(&record);
        assert_eq!(transport.time, format!("{}.000000", expected));
    }

    #[test]
    fn queued_keeps_envelope_and_record_in_sync() {
        let record = LogRecord::new(Level::Info, "app", "hello");
        let queued = JsonFormatter::new().queued(record);

        assert_eq!(parse(&queued.json)["message"], "hello");
        assert_eq!(queued.record.message, "hello");
    }
}

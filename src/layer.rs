use crate::pipeline::LogPipeline;
use crate::queue::PushOutcome;
use crate::record::{ExceptionInfo, LogRecord};
use crate::worker::in_delivery;
use chrono::Utc;
use std::error::Error;
use std::fmt::Write as _;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

// Events from these targets are never forwarded, otherwise every
// delivery diagnostic would enqueue another delivery. The HTTP client
// crates also log from connection tasks spawned outside the delivery.
const INTERNAL_TARGETS: &[&str] = &[
    "tracing_log_forwarder",
    "reqwest",
    "hyper",
    "hyper_util",
    "h2",
    "rustls",
];

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// emits them into a [`LogPipeline`].
///
/// By default this layer captures events with level `DEBUG` and above.
/// Emitting only formats the record and pushes it onto the pipeline's
/// queue; network I/O happens on the forwarder's tasks.
pub struct ForwardLayer {
    pipeline: LogPipeline,
    min_level: Level,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into the pipeline.
    pub enqueued_events: Arc<AtomicU64>,
    /// Rejected because a bounded queue was full.
    pub dropped_events: Arc<AtomicU64>,
}

impl ForwardLayer {
    pub fn new(pipeline: LogPipeline) -> Self {
        Self::with_min_level(pipeline, Level::DEBUG)
    }

    /// Create a layer that ignores events less severe than `min_level`.
    pub fn with_min_level(pipeline: LogPipeline, min_level: Level) -> Self {
        Self {
            pipeline,
            min_level,
            total_events: Arc::new(AtomicU64::new(0)),
            enqueued_events: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<S> Layer<S> for ForwardLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        if *meta.level() > self.min_level || is_internal_target(meta.target()) || in_delivery() {
            return;
        }

        let mut visitor = FieldVisitor {
            origin: meta.file().zip(meta.line()),
            ..FieldVisitor::default()
        };
        event.record(&mut visitor);

        let record = LogRecord {
            timestamp: Utc::now(),
            level: (*meta.level()).into(),
            logger: meta.target().to_string(),
            template: visitor.template(),
            args: Vec::new(),
            exception: visitor.exception,
            file: meta.file().map(|s| s.to_string()),
            line: meta.line(),
        };

        match self.pipeline.emit(record) {
            PushOutcome::DroppedNewest => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
            }
            PushOutcome::DroppedOldest => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
            }
            PushOutcome::Enqueued => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

fn is_internal_target(target: &str) -> bool {
    INTERNAL_TARGETS.iter().any(|internal| {
        target
            .strip_prefix(internal)
            .map_or(false, |rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Collects an event's message, extra fields and recorded error.
///
/// Extra fields are appended to the message as `key=value`, the way the
/// `fmt` layer prints them.
#[derive(Default)]
pub struct FieldVisitor<'a> {
    pub origin: Option<(&'a str, u32)>,
    pub message: Option<String>,
    pub fields: Vec<(String, String)>,
    pub exception: Option<ExceptionInfo>,
}

impl FieldVisitor<'_> {
    pub fn template(&self) -> String {
        let mut out = self.message.clone().unwrap_or_default();
        for (name, value) in &self.fields {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{}={}", name, value);
        }
        out
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        if self.exception.is_none() {
            self.exception = Some(ExceptionInfo::from_dyn(value, self.origin));
        }
        self.fields.push((field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.fields.push((field.name().to_string(), format!("{:?}", value)));
        }
    }
}

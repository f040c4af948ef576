use crate::config::ForwarderConfig;
use crate::formatter::JsonFormatter;
use crate::queue::{LogQueue, PushOutcome, QueueCapacity};
use crate::record::LogRecord;
use std::sync::Arc;

/// Explicitly constructed log pipeline: a formatter in front of a queue.
///
/// Cloning is cheap and every clone feeds the same queue, so the pipeline
/// can be handed to the logging layer, to the forwarder and to any code
/// that wants to emit raw [`LogRecord`]s.
#[derive(Clone, Debug)]
pub struct LogPipeline {
    queue: Arc<LogQueue>,
    formatter: JsonFormatter,
}

impl LogPipeline {
    pub fn new(capacity: QueueCapacity) -> Self {
        Self::with_queue(Arc::new(LogQueue::new(capacity)))
    }

    /// Pipeline whose queue capacity follows `config.queue`.
    pub fn from_config(config: &ForwarderConfig) -> Self {
        Self::new(config.queue)
    }

    pub fn unbounded() -> Self {
        Self::new(QueueCapacity::Unbounded)
    }

    pub fn with_queue(queue: Arc<LogQueue>) -> Self {
        Self {
            queue,
            formatter: JsonFormatter::new(),
        }
    }

    /// Format `record` and enqueue it. Never blocks on network I/O.
    pub fn emit(&self, record: LogRecord) -> PushOutcome {
        let outcome = self.queue.push(self.formatter.queued(record));
        if outcome == PushOutcome::DroppedNewest {
            eprintln!("log queue full, dropping log record");
        }
        outcome
    }

    pub fn queue(&self) -> &Arc<LogQueue> {
        &self.queue
    }

    pub fn formatter(&self) -> &JsonFormatter {
        &self.formatter
    }
}

impl Default for LogPipeline {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::OverflowPolicy;
    use crate::record::{Level, LogArg};
    use std::time::{Duration, Instant};

    #[test]
    fn emit_formats_before_queueing() {
        let pipeline = LogPipeline::unbounded();
        pipeline.emit(LogRecord::new(Level::Info, "app", "%d items").with_args([LogArg::Int(3)]));

        let queued = pipeline.queue().try_pop().expect("record queued");
        assert_eq!(queued.record.message, "3 items");
        assert!(queued.json.contains("\"message\":\"3 items\""));
    }

    #[test]
    fn clones_share_the_queue() {
        let pipeline = LogPipeline::unbounded();
        let other = pipeline.clone();
        other.emit(LogRecord::new(Level::Info, "app", "shared"));

        assert_eq!(pipeline.queue().len(), 1);
    }

    #[test]
    fn bounded_pipeline_reports_drops() {
        let pipeline = LogPipeline::new(QueueCapacity::Bounded {
            capacity: 1,
            policy: OverflowPolicy::DropNewest,
        });
        assert_eq!(pipeline.emit(LogRecord::new(Level::Info, "app", "a")), PushOutcome::Enqueued);
        assert_eq!(
            pipeline.emit(LogRecord::new(Level::Info, "app", "b")),
            PushOutcome::DroppedNewest
        );
    }

    #[test]
    fn from_config_applies_queue_capacity() {
        let config = ForwarderConfig {
            queue: QueueCapacity::Bounded {
                capacity: 2,
                policy: OverflowPolicy::DropOldest,
            },
            ..ForwarderConfig::default()
        };
        let pipeline = LogPipeline::from_config(&config);
        for message in ["a", "b", "c"] {
            pipeline.emit(LogRecord::new(Level::Info, "app", message));
        }

        assert_eq!(pipeline.queue().capacity(), config.queue);
        assert_eq!(pipeline.queue().len(), 2);
        assert_eq!(pipeline.queue().try_pop().unwrap().record.message, "b");
    }

    #[test]
    fn ten_thousand_emits_do_not_wait() {
        let pipeline = LogPipeline::unbounded();
        let start = Instant::now();
        for i in 0..10_000 {
            pipeline.emit(LogRecord::new(Level::Info, "load", "event %d").with_args([LogArg::Int(i)]));
        }
        let per_emit = start.elapsed() / 10_000;

        assert_eq!(pipeline.queue().len(), 10_000);
        assert!(per_emit < Duration::from_millis(1), "average emit took {:?}", per_emit);
    }
}

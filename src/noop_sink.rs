use crate::error::DeliveryError;
use crate::record::QueuedRecord;
use crate::sink::LogSink;
use async_trait::async_trait;

/// A sink that simply drops all records.
///
/// Useful for measuring the overhead of the pipeline itself without any
/// network I/O, and for tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl LogSink for NoopSink {
    async fn send(&self, _record: &QueuedRecord) -> Result<(), DeliveryError> {
        Ok(())
    }
}

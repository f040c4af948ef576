use crate::error::DeliveryError;
use crate::record::QueuedRecord;
use async_trait::async_trait;

/// Asynchronous destination for [`QueuedRecord`]s drained by the
/// forwarder.
///
/// Implementations are responsible for transporting records to a concrete
/// backend (an HTTP collector, stdout, etc). The worker calls `send` from
/// a spawned task per record and never awaits it on the producer side.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Send a single record to the underlying backend.
    ///
    /// **Parameters**
    /// - `record`: the formatted record together with its JSON envelope.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was accepted by the backend.
    /// - `Err(..)` if the backend failed (network error, HTTP status,
    ///   etc.). The worker drops the record: there is no retry.
    async fn send(&self, record: &QueuedRecord) -> Result<(), DeliveryError>;
}

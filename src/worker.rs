use crate::error::DeliveryError;
use crate::queue::LogQueue;
use crate::record::QueuedRecord;
use crate::sink::LogSink;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::time::{sleep, timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::debug;

tokio::task_local! {
    static DELIVERING: ();
}

/// Whether the current task is inside a delivery.
///
/// The forwarding layer drops events emitted here: the HTTP client stack
/// logs its own connection activity, and forwarding that would turn every
/// delivery into another one.
pub fn in_delivery() -> bool {
    DELIVERING.try_with(|_| ()).is_ok()
}

/// Delivery counters shared between the worker, its delivery tasks and
/// the [`ForwarderHandle`](crate::coordinator::ForwarderHandle).
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Records popped from the queue and handed to a delivery task.
    pub dispatched: AtomicU64,
    /// Deliveries the sink accepted.
    pub delivered: AtomicU64,
    /// Deliveries that failed or timed out. The records are gone.
    pub failed: AtomicU64,
}

impl WorkerStats {
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Deliveries dispatched but not yet finished.
    pub fn in_flight(&self) -> u64 {
        self.dispatched()
            .saturating_sub(self.delivered() + self.failed())
    }
}

/// Drains a [`LogQueue`] and ships every record through a [`LogSink`].
///
/// Each record is delivered by its own task spawned on the owning
/// runtime; the worker never waits for a delivery, so a slow or hung
/// collector only ties up that delivery's task. Delivery is at-most-once:
/// failures are counted and logged at debug level, never retried.
///
/// The worker runs until its cancellation token fires or the runtime it
/// was bound to shuts down.
pub struct ForwarderWorker {
    runtime: Handle,
    queue: Arc<LogQueue>,
    sink: Arc<dyn LogSink>,
    cancel: CancellationToken,
    stats: Arc<WorkerStats>,
    delivery_timeout: Option<Duration>,
    poll_interval: Option<Duration>,
}

impl ForwarderWorker {
    pub fn new(
        runtime: Handle,
        queue: Arc<LogQueue>,
        sink: Arc<dyn LogSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            runtime,
            queue,
            sink,
            cancel,
            stats: Arc::new(WorkerStats::default()),
            delivery_timeout: None,
            poll_interval: None,
        }
    }

    /// Bound every delivery by `limit`; `None` waits indefinitely.
    pub fn with_delivery_timeout(mut self, limit: Option<Duration>) -> Self {
        self.delivery_timeout = limit;
        self
    }

    /// Poll the queue with a fixed pause instead of waiting for pushes.
    ///
    /// At most one record is dispatched per interval.
    pub fn with_poll_interval(mut self, interval: Option<Duration>) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    pub async fn run(self) {
        debug!("log forwarder worker started");
        match self.poll_interval {
            None => self.run_notified().await,
            Some(interval) => self.run_polling(interval).await,
        }
        debug!(
            dispatched = self.stats.dispatched(),
            failed = self.stats.failed(),
            "log forwarder worker stopped"
        );
    }

    async fn run_notified(&self) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                record = self.queue.pop() => self.dispatch(record),
            }
        }
    }

    async fn run_polling(&self, interval: Duration) {
        while !self.cancel.is_cancelled() {
            if let Some(record) = self.queue.try_pop() {
                self.dispatch(record);
            }
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(interval) => {}
            }
        }
    }

    fn dispatch(&self, record: QueuedRecord) {
        self.stats.dispatched.fetch_add(1, Ordering::Relaxed);
        let sink = Arc::clone(&self.sink);
        let stats = Arc::clone(&self.stats);
        let limit = self.delivery_timeout;
        self.runtime.spawn(deliver(sink, record, stats, limit));
    }
}

async fn deliver(
    sink: Arc<dyn LogSink>,
    record: QueuedRecord,
    stats: Arc<WorkerStats>,
    limit: Option<Duration>,
) {
    let send = async {
        match limit {
            Some(limit) => timeout(limit, sink.send(&record))
                .await
                .unwrap_or(Err(DeliveryError::Timeout(limit))),
            None => sink.send(&record).await,
        }
    };
    let result = DELIVERING.scope((), send).await;

    match result {
        Ok(()) => {
            stats.delivered.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            debug!("dropping log record after failed delivery: {}", e);
        }
    }
}

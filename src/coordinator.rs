//! Startup and shutdown of the forwarder.
//!
//! The forwarder is bound to the tokio runtime that is current when
//! [`start`] runs. It stops when the returned handle (or the parent token
//! it was started with) is cancelled, or implicitly when that runtime
//! shuts down and drops its tasks.

use crate::config::ForwarderConfig;
use crate::error::StartError;
use crate::pipeline::LogPipeline;
use crate::sink::LogSink;
use crate::worker::{ForwarderWorker, WorkerStats};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Handle to a running forwarder.
#[derive(Debug)]
pub struct ForwarderHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    stats: Arc<WorkerStats>,
}

impl ForwarderHandle {
    /// Ask the worker to stop. Deliveries already in flight keep running
    /// until they finish or the runtime shuts down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stats(&self) -> &Arc<WorkerStats> {
        &self.stats
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the worker task to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            eprintln!("log forwarder task ended abnormally: {}", e);
        }
    }
}

/// Start a forwarder draining `pipeline` into `sink` on the current
/// runtime.
///
/// **Parameters**
/// - `pipeline`: the pipeline whose queue is drained.
/// - `sink`: destination for every record.
/// - `config`: delivery timeout and polling mode. The queue capacity
///   belongs to the pipeline (see [`LogPipeline::from_config`]) and the
///   address to the sink.
/// - `parent`: optional host token; cancelling it stops the forwarder too.
///
/// **Returns**
/// - `Err(StartError::NoRuntime)` when called outside a tokio runtime.
pub fn start(
    pipeline: &LogPipeline,
    sink: Arc<dyn LogSink>,
    config: &ForwarderConfig,
    parent: Option<&CancellationToken>,
) -> Result<ForwarderHandle, StartError> {
    let runtime = Handle::try_current().map_err(|_| StartError::NoRuntime)?;
    let cancel = parent.map_or_else(CancellationToken::new, CancellationToken::child_token);

    let worker = ForwarderWorker::new(
        runtime.clone(),
        Arc::clone(pipeline.queue()),
        sink,
        cancel.clone(),
    )
    .with_delivery_timeout(config.delivery_timeout)
    .with_poll_interval(config.poll_interval);
    let stats = worker.stats();
    let task = runtime.spawn(worker.run());

    info!(
        "Current task ID: id={}",
        tokio::task::try_id().map_or_else(|| "<none>".to_string(), |id| id.to_string())
    );

    Ok(ForwarderHandle {
        cancel,
        task,
        stats,
    })
}

/// Start a forwarder that POSTs to `config.address`.
#[cfg(feature = "http")]
pub fn start_http(
    pipeline: &LogPipeline,
    config: &ForwarderConfig,
    parent: Option<&CancellationToken>,
) -> Result<ForwarderHandle, StartError> {
    let sink = crate::http::HttpSink::new(config.address.clone(), config.payload)
        .map_err(|e| StartError::Sink(Box::new(e)))?;
    start(pipeline, Arc::new(sink), config, parent)
}

/// Like [`start`], but reports a failure on stderr and returns `None`
/// instead of an error. The service keeps running without a forwarder.
pub fn start_or_report(
    pipeline: &LogPipeline,
    sink: Arc<dyn LogSink>,
    config: &ForwarderConfig,
    parent: Option<&CancellationToken>,
) -> Option<ForwarderHandle> {
    report(start(pipeline, sink, config, parent))
}

/// Like [`start_http`], but reports a failure on stderr and returns
/// `None`.
#[cfg(feature = "http")]
pub fn start_http_or_report(
    pipeline: &LogPipeline,
    config: &ForwarderConfig,
    parent: Option<&CancellationToken>,
) -> Option<ForwarderHandle> {
    report(start_http(pipeline, config, parent))
}

fn report(result: Result<ForwarderHandle, StartError>) -> Option<ForwarderHandle> {
    match result {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Could not start log forwarder: {}", e);
            None
        }
    }
}

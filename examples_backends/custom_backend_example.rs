use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::{error, info};
use tracing_log_forwarder::{
    config::ForwarderConfig,
    coordinator::start,
    error::DeliveryError,
    init::init_tracing,
    pipeline::LogPipeline,
    record::QueuedRecord,
    sink::LogSink,
};

/// Example of shipping records somewhere other than an HTTP collector by
/// implementing the `LogSink` trait directly.
struct StdoutJsonSink;

#[async_trait]
impl LogSink for StdoutJsonSink {
    async fn send(&self, record: &QueuedRecord) -> Result<(), DeliveryError> {
        println!("[stdout-sink] {}", record.json);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let pipeline = LogPipeline::unbounded();
    init_tracing(&pipeline).expect("no subscriber installed yet");

    let sink: Arc<dyn LogSink> = Arc::new(StdoutJsonSink);
    let handle = start(&pipeline, sink, &ForwarderConfig::default(), None)
        .expect("inside tokio runtime");

    info!("custom backend example started");
    error!(db = "my-custom-db", "simulated error sent via custom backend");

    sleep(Duration::from_millis(200)).await;
    handle.shutdown();
}

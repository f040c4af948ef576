use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::error;

use tracing_log_forwarder::config::ForwarderConfig;
use tracing_log_forwarder::coordinator::start;
use tracing_log_forwarder::init::{init_tracing_with_config, LoggerConfig};
use tracing_log_forwarder::noop_sink::NoopSink;
use tracing_log_forwarder::pipeline::LogPipeline;

#[tokio::main]
async fn main() {
    let pipeline = LogPipeline::unbounded();
    let config = LoggerConfig {
        enable_stdout: false,
        ..LoggerConfig::default()
    };
    init_tracing_with_config(&pipeline, config).expect("no subscriber installed yet");

    let handle = start(&pipeline, Arc::new(NoopSink), &ForwarderConfig::default(), None)
        .expect("inside tokio runtime");

    let n: u64 = 100_000;
    let started = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let elapsed = started.elapsed();
    println!("unbounded queue: emitted {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give the forwarder a little time to drain the queue
    sleep(Duration::from_secs(2)).await;
    println!("delivered {} records, {} still queued",
        handle.stats().delivered(),
        pipeline.queue().len()
    );
    handle.shutdown();
}

use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::error;

use tracing_log_forwarder::config::ForwarderConfig;
use tracing_log_forwarder::coordinator::start;
use tracing_log_forwarder::init::{init_tracing_with_config, LoggerConfig};
use tracing_log_forwarder::noop_sink::NoopSink;
use tracing_log_forwarder::pipeline::LogPipeline;
use tracing_log_forwarder::queue::{OverflowPolicy, QueueCapacity};

#[tokio::main]
async fn main() {
    let config = ForwarderConfig {
        queue: QueueCapacity::Bounded {
            capacity: 4096,
            policy: OverflowPolicy::DropOldest,
        },
        ..ForwarderConfig::default()
    };
    let pipeline = LogPipeline::from_config(&config);
    init_tracing_with_config(&pipeline, LoggerConfig {
        enable_stdout: false,
        ..LoggerConfig::default()
    })
    .expect("no subscriber installed yet");

    let handle = start(&pipeline, Arc::new(NoopSink), &config, None)
        .expect("inside tokio runtime");

    let n: u64 = 100_000;
    let started = Instant::now();

    for i in 0..n {
        error!(iteration = i, "bounded load test error");
    }

    let elapsed = started.elapsed();
    let stats = pipeline.queue().stats();
    println!("bounded queue: emitted {} events in {:?} (~{:.0} ev/s), dropped {}",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        stats.dropped
    );

    sleep(Duration::from_secs(2)).await;
    handle.shutdown();
}

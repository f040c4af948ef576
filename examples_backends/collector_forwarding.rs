use tokio::time::{sleep, Duration};
use tracing::{error, info};

use tracing_log_forwarder::config::ForwarderConfig;
use tracing_log_forwarder::coordinator::start_http_or_report;
use tracing_log_forwarder::init::init_tracing;
use tracing_log_forwarder::pipeline::LogPipeline;

/// Forward every event to the collector configured through
/// `LOG_FORWARDER_*` environment variables (default
/// `http://127.0.0.1:8001/`).
#[tokio::main]
async fn main() {
    let config = ForwarderConfig::from_env().unwrap_or_else(|e| {
        eprintln!("{}, using defaults", e);
        ForwarderConfig::default()
    });
    let pipeline = LogPipeline::from_config(&config);
    init_tracing(&pipeline).expect("no subscriber installed yet");

    let forwarder = start_http_or_report(&pipeline, &config, None);

    info!("starting service");

    let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "upstream down");
    error!(
        error = &err as &dyn std::error::Error,
        upstream = "billing",
        "request failed"
    );

    sleep(Duration::from_secs(2)).await;
    if let Some(forwarder) = forwarder {
        forwarder.shutdown();
        forwarder.join().await;
    }
}

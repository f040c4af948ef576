use serde_json::Value;
use std::sync::atomic::Ordering;
use tracing::{debug, error, info, warn};
use tracing_log_forwarder::init::{subscriber, LoggerConfig};
use tracing_log_forwarder::layer::ForwardLayer;
use tracing_log_forwarder::pipeline::LogPipeline;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

fn drain(pipeline: &LogPipeline) -> Vec<Value> {
    std::iter::from_fn(|| pipeline.queue().try_pop())
        .map(|queued| serde_json::from_str(&queued.json).expect("valid JSON envelope"))
        .collect()
}

#[test]
fn events_become_transport_records() {
    let pipeline = LogPipeline::unbounded();
    let layer = ForwardLayer::new(pipeline.clone());
    let enqueued = layer.enqueued_events.clone();

    tracing::subscriber::with_default(Registry::default().with(layer), || {
        info!(user_id = 42, "login from {}", "10.0.0.1");
    });

    let records = drain(&pipeline);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["message"], "login from 10.0.0.1 user_id=42");
    assert_eq!(records[0]["level"], "INFO");
    assert!(records[0]["file"].as_str().unwrap().ends_with("layer_test.rs"));
    assert!(records[0].get("exception").is_none());
    assert_eq!(enqueued.load(Ordering::Relaxed), 1);
}

#[test]
fn recorded_errors_become_exceptions() {
    let pipeline = LogPipeline::unbounded();
    let layer = ForwardLayer::new(pipeline.clone());

    tracing::subscriber::with_default(Registry::default().with(layer), || {
        let err = "abc".parse::<u8>().unwrap_err();
        error!(error = &err as &dyn std::error::Error, "bad port");
    });

    let records = drain(&pipeline);
    let exception = &records[0]["exception"];
    assert_eq!(exception["exc_type"], "ParseIntError");
    assert_eq!(exception["exc_val"], "invalid digit found in string");
    assert!(!exception["exc_tb"].as_array().unwrap().is_empty());
    assert_eq!(records[0]["level"], "ERROR");
}

#[test]
fn min_level_filters_quieter_events() {
    let pipeline = LogPipeline::unbounded();
    let layer = ForwardLayer::with_min_level(pipeline.clone(), tracing::Level::WARN);
    let total = layer.total_events.clone();

    tracing::subscriber::with_default(Registry::default().with(layer), || {
        debug!("noise");
        info!("more noise");
        warn!("careful");
    });

    let records = drain(&pipeline);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["level"], "WARNING");
    assert_eq!(total.load(Ordering::Relaxed), 3);
}

#[test]
fn forwarder_diagnostics_are_not_forwarded() {
    let pipeline = LogPipeline::unbounded();
    let layer = ForwardLayer::new(pipeline.clone());

    tracing::subscriber::with_default(Registry::default().with(layer), || {
        info!(target: "tracing_log_forwarder::http", "Request to collector.");
        debug!(target: "hyper_util::client::legacy::connect::http", "connected to 127.0.0.1:8001");
        debug!(target: "reqwest::connect", "starting new connection");
        info!(target: "my_service", "handled request");
        info!(target: "hyperdrive", "similar prefix is still forwarded");
    });

    let records = drain(&pipeline);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["message"], "handled request");
    assert_eq!(records[1]["message"], "similar prefix is still forwarded");
}

#[test]
fn configured_subscriber_routes_into_pipeline() {
    let pipeline = LogPipeline::unbounded();
    let config = LoggerConfig {
        min_level: tracing::Level::INFO,
        enable_stdout: false,
    };

    tracing::subscriber::with_default(subscriber(&pipeline, &config), || {
        debug!("dropped");
        info!("kept");
    });

    let records = drain(&pipeline);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["message"], "kept");
}

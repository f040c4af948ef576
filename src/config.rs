//! Forwarder configuration and the environment variables it can be read
//! from.
//!
//! The core types stay decoupled from environment access;
//! [`ForwarderConfig::from_env`] is purely a helper for services.

use crate::error::ConfigError;
use crate::queue::{OverflowPolicy, QueueCapacity};
use std::time::Duration;

/// Collector URL records are POSTed to.
pub const LOG_FORWARDER_ADDRESS_ENV: &str = "LOG_FORWARDER_ADDRESS";

/// Optional queue capacity; unset means unbounded.
pub const LOG_FORWARDER_QUEUE_CAPACITY_ENV: &str = "LOG_FORWARDER_QUEUE_CAPACITY";

/// Overflow policy for a bounded queue: `drop-newest` or `drop-oldest`.
pub const LOG_FORWARDER_OVERFLOW_ENV: &str = "LOG_FORWARDER_OVERFLOW";

/// Request body shape: `message` or `envelope`.
pub const LOG_FORWARDER_PAYLOAD_ENV: &str = "LOG_FORWARDER_PAYLOAD";

/// Optional per-delivery timeout in milliseconds.
pub const LOG_FORWARDER_TIMEOUT_MS_ENV: &str = "LOG_FORWARDER_TIMEOUT_MS";

/// Address used when nothing else is configured.
pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:8001/";

/// What goes into the body of each delivery request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadMode {
    /// Only the formatted `message` field.
    #[default]
    Message,
    /// The complete JSON transport record.
    Envelope,
}

/// Configuration of the forwarder started by the coordinator.
///
/// **Fields**
/// - `address`: collector URL.
/// - `queue`: capacity of the pipeline queue.
/// - `payload`: request body shape, see [`PayloadMode`].
/// - `delivery_timeout`: upper bound for a single delivery; `None` lets a
///   hung connection hold its task indefinitely.
/// - `poll_interval`: when set, the worker polls the queue with this fixed
///   pause instead of waiting for push notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwarderConfig {
    pub address: String,
    pub queue: QueueCapacity,
    pub payload: PayloadMode,
    pub delivery_timeout: Option<Duration>,
    pub poll_interval: Option<Duration>,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            queue: QueueCapacity::Unbounded,
            payload: PayloadMode::Message,
            delivery_timeout: None,
            poll_interval: None,
        }
    }
}

impl ForwarderConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(address) = lookup(LOG_FORWARDER_ADDRESS_ENV) {
            config.address = address;
        }

        let policy = match lookup(LOG_FORWARDER_OVERFLOW_ENV) {
            None => OverflowPolicy::default(),
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "drop-newest" => OverflowPolicy::DropNewest,
                "drop-oldest" => OverflowPolicy::DropOldest,
                _ => return Err(invalid(LOG_FORWARDER_OVERFLOW_ENV, value)),
            },
        };

        if let Some(value) = lookup(LOG_FORWARDER_QUEUE_CAPACITY_ENV) {
            let capacity = parse_positive(LOG_FORWARDER_QUEUE_CAPACITY_ENV, value)?;
            config.queue = QueueCapacity::Bounded {
                capacity: capacity as usize,
                policy,
            };
        }

        if let Some(value) = lookup(LOG_FORWARDER_PAYLOAD_ENV) {
            config.payload = match value.trim().to_ascii_lowercase().as_str() {
                "message" => PayloadMode::Message,
                "envelope" => PayloadMode::Envelope,
                _ => return Err(invalid(LOG_FORWARDER_PAYLOAD_ENV, value)),
            };
        }

        if let Some(value) = lookup(LOG_FORWARDER_TIMEOUT_MS_ENV) {
            let millis = parse_positive(LOG_FORWARDER_TIMEOUT_MS_ENV, value)?;
            config.delivery_timeout = Some(Duration::from_millis(millis));
        }

        Ok(config)
    }
}

fn parse_positive(key: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &'static str, value: String) -> ConfigError {
    ConfigError::InvalidValue { key, value }
}

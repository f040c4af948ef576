use std::error::Error;
use std::time::Duration;

/// Failure of a single delivery attempt.
///
/// The worker absorbs these; they only surface in debug diagnostics and
/// in the `failed` counter.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn Error + Send + Sync>),

    #[error("collector responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("delivery did not complete within {0:?}")]
    Timeout(Duration),
}

/// Error returned when the forwarder cannot be started.
#[derive(thiserror::Error, Debug)]
pub enum StartError {
    #[error("no running tokio runtime")]
    NoRuntime,

    #[error("failed to build sink: {0}")]
    Sink(#[source] Box<dyn Error + Send + Sync>),
}

/// Error type returned when reading configuration from the environment.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Error returned by [`crate::init::init_tracing`].
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("global subscriber already set: {0}")]
    AlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}

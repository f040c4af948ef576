pub mod record;
pub mod interpolate;
pub mod formatter;
pub mod queue;
pub mod pipeline;
pub mod error;
pub mod sink;
pub mod worker;
pub mod coordinator;
pub mod layer;
pub mod config;

#[cfg(feature = "http")]
pub mod http;

pub mod init;
pub mod noop_sink;

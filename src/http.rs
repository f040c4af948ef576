use crate::config::PayloadMode;
use crate::error::DeliveryError;
use crate::record::QueuedRecord;
use crate::sink::LogSink;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Sink that POSTs each record to a remote collector over HTTP.
///
/// No headers or authentication are added. The response body is read and
/// only used for debug diagnostics.
#[derive(Clone, Debug)]
pub struct HttpSink {
    client: Client,
    address: String,
    payload: PayloadMode,
}

impl HttpSink {
    /// Construct a sink for `address`.
    ///
    /// **Parameters**
    /// - `address`: full collector URL, e.g. `http://127.0.0.1:8001/`.
    /// - `payload`: whether to send the `message` field or the whole JSON
    ///   envelope as the request body.
    pub fn new(address: impl Into<String>, payload: PayloadMode) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, address, payload))
    }

    /// Construct a sink reusing an existing `reqwest` client.
    pub fn with_client(client: Client, address: impl Into<String>, payload: PayloadMode) -> Self {
        Self {
            client,
            address: address.into(),
            payload,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn body(&self, record: &QueuedRecord) -> String {
        match self.payload {
            PayloadMode::Message => record.record.message.clone(),
            PayloadMode::Envelope => record.json.clone(),
        }
    }
}

#[async_trait]
impl LogSink for HttpSink {
    async fn send(&self, record: &QueuedRecord) -> Result<(), DeliveryError> {
        debug!("Request to {}.", self.address);
        let resp = self
            .client
            .post(&self.address)
            .body(self.body(record))
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(Box::new(e)))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
        debug!("Response from {}: {}", self.address, text);

        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status {
                status: status.as_u16(),
                body: text,
            })
        }
    }
}

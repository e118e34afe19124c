//! Delivery endpoints.

use std::io::Write;

use async_trait::async_trait;

use super::DeliveryError;
use crate::formats::Payload;

/// Accepts a rendered payload for delivery.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Deliver one payload. Failures are returned, never retried.
    async fn send(&self, payload: &Payload) -> Result<(), DeliveryError>;
}

/// Writes each payload as one JSON line on stdout.
#[derive(Debug, Clone)]
pub struct StdoutSink {
    destination: String,
}

impl StdoutSink {
    /// Sink labelling its lines with `destination`.
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    /// The JSON line written for `payload`.
    pub fn line(&self, payload: &Payload) -> Result<String, DeliveryError> {
        let value = serde_json::json!({
            "destination": self.destination,
            "payload": payload,
        });
        serde_json::to_string(&value).map_err(|e| DeliveryError::Serialize(e.to_string()))
    }
}

#[async_trait]
impl Sink for StdoutSink {
    async fn send(&self, payload: &Payload) -> Result<(), DeliveryError> {
        let line = self.line(payload)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}").map_err(|_| DeliveryError::Closed)
    }
}

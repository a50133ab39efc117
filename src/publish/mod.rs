//! Message delivery to the broker
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  deliver(item)  ┌───────────┐  connect/publish/disconnect
//! │  Publisher   │────────────────▶│  Broker   │──────────────────────────▶ MQTT
//! └──────┬───────┘                 └───────────┘
//!        │ failed items
//!        ▼
//! ┌──────────────┐
//! │PendingBuffer │  FIFO, unbounded, replayed on drain
//! └──────────────┘
//! ```
//!
//! Fresh messages go through [`Publisher::publish`], which parks failures in
//! the [`PendingBuffer`]. [`Publisher::flush`] replays the buffer in order,
//! one delivery attempt per item.

pub mod broker;
mod buffer;
mod publisher;

use crate::models::Measurement;

// Re-exports
pub use broker::mqtt::MqttBroker;
pub use broker::{Broker, BrokerError, BrokerResult, BrokerSession};
pub use buffer::{DrainReport, PendingBuffer};
pub use publisher::{Publisher, Topics, Undelivered};

/// Body of a broker message
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Encoded as a JSON object
    Measurement(Measurement),
    /// Sent as raw UTF-8
    Text(String),
}

impl Payload {
    /// Encode the payload as wire bytes
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            Self::Measurement(m) => serde_json::to_vec(m),
            Self::Text(text) => Ok(text.as_bytes().to_vec()),
        }
    }
}

impl From<Measurement> for Payload {
    fn from(measurement: Measurement) -> Self {
        Self::Measurement(measurement)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A message waiting for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct PendingItem {
    pub topic: String,
    pub payload: Payload,
}

impl PendingItem {
    pub fn new(topic: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

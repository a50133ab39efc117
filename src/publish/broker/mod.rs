//! Broker capability used by the publisher
//!
//! A broker hands out one session per delivery attempt. Sessions are never
//! pooled; the publisher connects, publishes a single message and
//! disconnects every time.

pub mod mqtt;

use async_trait::async_trait;

/// Result type for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Errors that can occur while talking to the broker
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// TCP/TLS connection or handshake failed
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Broker answered the handshake with a refusal
    #[error("Connection refused by broker: {0}")]
    Refused(String),

    /// Client queue rejected the request
    #[error("Client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// Network failure while the session was open
    #[error("Connection lost: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// Operation did not complete within the broker timeout
    #[error("Broker operation timed out: {0}")]
    Timeout(String),

    /// Payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session was closed before the operation finished
    #[error("Session closed")]
    Closed,
}

impl BrokerError {
    /// Connection-establishment failures, as opposed to send failures
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Refused(_))
    }
}

/// Something that can open publish sessions
#[async_trait]
pub trait Broker: Send + Sync {
    /// Broker name for logging
    fn name(&self) -> &str;

    /// Open a new session
    async fn connect(&self) -> BrokerResult<Box<dyn BrokerSession>>;
}

/// An open connection good for one delivery
#[async_trait]
pub trait BrokerSession: Send {
    /// Send one payload to `topic`
    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> BrokerResult<()>;

    /// Close the session. Errors are logged by the implementation.
    async fn disconnect(self: Box<Self>);
}

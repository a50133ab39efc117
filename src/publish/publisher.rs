//! Publisher with one scoped broker session per message

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::broker::{Broker, BrokerError};
use super::buffer::{DrainReport, PendingBuffer};
use super::{Payload, PendingItem};
use crate::models::Measurement;

/// Destination topics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// Connectivity and speed records
    pub measurements: String,
    /// Outage alerts
    pub alerts: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            measurements: String::from("/home/net-monitor"),
            alerts: String::from("/alerts/info"),
        }
    }
}

/// A delivery that failed, handing the item back to the caller
#[derive(Debug)]
pub struct Undelivered {
    pub item: PendingItem,
    pub error: BrokerError,
}

/// Delivers messages through a [`Broker`]
///
/// Sessions are never reused: every delivery connects, publishes one
/// message and disconnects, whatever the outcome.
pub struct Publisher {
    broker: Arc<dyn Broker>,
    topics: Topics,
}

impl Publisher {
    pub fn new(broker: Arc<dyn Broker>, topics: Topics) -> Self {
        Self { broker, topics }
    }

    pub fn broker_name(&self) -> &str {
        self.broker.name()
    }

    /// Single delivery attempt; never touches the pending buffer
    pub async fn deliver(&self, item: PendingItem) -> Result<(), Undelivered> {
        let bytes = match item.payload.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                return Err(Undelivered {
                    item,
                    error: e.into(),
                })
            }
        };

        let mut session = match self.broker.connect().await {
            Ok(session) => session,
            Err(error) => return Err(Undelivered { item, error }),
        };

        let result = session.publish(&item.topic, bytes).await;
        session.disconnect().await;

        match result {
            Ok(()) => Ok(()),
            Err(error) => Err(Undelivered { item, error }),
        }
    }

    /// Deliver a fresh message, buffering it on failure
    ///
    /// Returns whether the message reached the broker.
    pub async fn publish(&self, buffer: &mut PendingBuffer, item: PendingItem) -> bool {
        debug!(topic = %item.topic, broker = self.broker.name(), "Publishing message");

        match self.deliver(item).await {
            Ok(()) => true,
            Err(Undelivered { item, error }) => {
                warn!(
                    topic = %item.topic,
                    error = %error,
                    connect_failure = error.is_connect_failure(),
                    "Failed to publish message, buffering for retry"
                );
                buffer.enqueue(item);
                false
            }
        }
    }

    /// Publish to the measurements topic
    pub async fn publish_measurement(
        &self,
        buffer: &mut PendingBuffer,
        measurement: Measurement,
    ) -> bool {
        debug!(kind = %measurement.kind(), "Publishing measurement");
        let item = PendingItem::new(self.topics.measurements.clone(), measurement);
        self.publish(buffer, item).await
    }

    /// Publish a plain-text alert to the alerts topic
    pub async fn publish_alert(&self, buffer: &mut PendingBuffer, text: impl Into<String>) -> bool {
        let item = PendingItem::new(self.topics.alerts.clone(), Payload::Text(text.into()));
        self.publish(buffer, item).await
    }

    /// Replay the pending buffer, one attempt per item
    ///
    /// Failed items go back into the buffer in order; this path never
    /// enqueues on its own.
    pub async fn flush(&self, buffer: &mut PendingBuffer) -> DrainReport {
        if buffer.is_empty() {
            info!("No pending messages to publish");
            return DrainReport::default();
        }

        info!(pending = buffer.len(), "Publishing pending messages");

        let publisher = self;
        let report = buffer
            .drain(move |item| async move {
                publisher.deliver(item).await.map_err(|undelivered| {
                    debug!(
                        topic = %undelivered.item.topic,
                        error = %undelivered.error,
                        "Pending message still undeliverable"
                    );
                    undelivered.item
                })
            })
            .await;

        if report.retained > 0 {
            warn!(
                delivered = report.delivered,
                retained = report.retained,
                "Some pending messages could not be delivered"
            );
        } else {
            info!(delivered = report.delivered, "Pending messages delivered");
        }

        report
    }
}

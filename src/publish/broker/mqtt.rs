//! MQTT broker backed by `rumqttc`
//!
//! Each session owns its own client and event loop. The event loop is
//! driven inline by the caller until the awaited packet shows up, so no
//! background task outlives the session.

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS,
};
use std::time::Duration;

use super::{Broker, BrokerError, BrokerResult, BrokerSession};
use crate::config::BrokerConfig;

/// Request channel capacity per session; one message is ever queued
const REQUEST_CAPACITY: usize = 10;

/// MQTT publish-only broker
pub struct MqttBroker {
    host: String,
    port: u16,
    client_id: String,
    keep_alive: Duration,
    timeout: Duration,
}

impl MqttBroker {
    /// Create a broker from configuration
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            client_id: config.client_id.clone(),
            keep_alive: config.keep_alive(),
            timeout: config.timeout(),
        }
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        options
    }
}

#[async_trait]
impl Broker for MqttBroker {
    fn name(&self) -> &str {
        "mqtt"
    }

    async fn connect(&self) -> BrokerResult<Box<dyn BrokerSession>> {
        let (client, eventloop) = AsyncClient::new(self.options(), REQUEST_CAPACITY);
        let mut session = MqttSession {
            client,
            eventloop,
            timeout: self.timeout,
        };

        session.await_connack().await?;
        tracing::debug!(host = %self.host, port = self.port, "MQTT session established");

        Ok(Box::new(session))
    }
}

struct MqttSession {
    client: AsyncClient,
    eventloop: EventLoop,
    timeout: Duration,
}

impl MqttSession {
    async fn await_connack(&mut self) -> BrokerResult<()> {
        let handshake = async {
            loop {
                match self.eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        return if ack.code == ConnectReturnCode::Success {
                            Ok(())
                        } else {
                            Err(BrokerError::Refused(format!("{:?}", ack.code)))
                        };
                    }
                    Ok(_) => continue,
                    Err(ConnectionError::ConnectionRefused(code)) => {
                        return Err(BrokerError::Refused(format!("{code:?}")));
                    }
                    Err(e) => return Err(BrokerError::Connect(e.to_string())),
                }
            }
        };

        tokio::time::timeout(self.timeout, handshake)
            .await
            .map_err(|_| BrokerError::Timeout("connect".to_string()))?
    }

    /// Poll the event loop until `done` matches an event
    async fn drive_until<F>(&mut self, operation: &str, done: F) -> BrokerResult<()>
    where
        F: Fn(&Event) -> bool + Send + Sync,
    {
        let drive = async {
            loop {
                match self.eventloop.poll().await {
                    Ok(event) if done(&event) => return Ok(()),
                    Ok(_) => continue,
                    Err(e) => return Err(BrokerError::Connection(e)),
                }
            }
        };

        tokio::time::timeout(self.timeout, drive)
            .await
            .map_err(|_| BrokerError::Timeout(operation.to_string()))?
    }
}

#[async_trait]
impl BrokerSession for MqttSession {
    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> BrokerResult<()> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await?;

        // QoS 0 is done once the packet is written to the socket
        self.drive_until("publish", |event| {
            matches!(event, Event::Outgoing(Outgoing::Publish(_)))
        })
        .await
    }

    async fn disconnect(self: Box<Self>) {
        let mut session = self;
        if let Err(e) = session.client.disconnect().await {
            tracing::debug!(error = %e, "MQTT disconnect request failed");
            return;
        }

        if let Err(e) = session
            .drive_until("disconnect", |event| {
                matches!(event, Event::Outgoing(Outgoing::Disconnect))
            })
            .await
        {
            tracing::debug!(error = %e, "MQTT disconnect did not complete cleanly");
        }
    }
}

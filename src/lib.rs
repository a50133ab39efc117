//! linkwatch - Internet connectivity monitor
//!
//! Probes internet reachability once a minute, measures link throughput once
//! an hour, times outages, and relays every measurement and outage alert to
//! an MQTT broker. Messages that cannot be delivered are buffered in memory
//! and replayed once connectivity returns.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration from environment variables
//! - [`models`] - Measurement records and their wire format
//! - [`probe`] - HTTP reachability and throughput probes
//! - [`outage`] - Outage detection state machine
//! - [`publish`] - Broker capability, publisher and pending buffer
//! - [`scheduler`] - The monitoring loop
//! - [`error`] - Unified error type
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use linkwatch::config::Config;
//! use linkwatch::publish::MqttBroker;
//! use linkwatch::scheduler::Monitor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let broker = Arc::new(MqttBroker::new(&config.broker));
//!     let mut monitor = Monitor::from_config(&config, broker)?;
//!     monitor.run(tokio::signal::ctrl_c()).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod outage;
pub mod probe;
pub mod publish;
pub mod scheduler;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, MonitorErrorTrait, Result};
    pub use crate::models::{ConnectivityResult, Measurement, MeasurementKind, SpeedResult};
    pub use crate::outage::{OutageState, OutageTracker, Transition};
    pub use crate::probe::{ConnectivityProbe, ProbeOutcome, ThroughputProbe};
    pub use crate::publish::{Broker, BrokerSession, MqttBroker, PendingBuffer, Publisher};
    pub use crate::scheduler::{IterationReport, Monitor};
}

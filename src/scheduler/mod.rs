//! Monitoring loop
//!
//! One sequential control flow that probes, publishes, detects outages and
//! replays undelivered messages. All mutable state lives in [`Monitor`].
//!
//! # Iteration
//!
//! ```text
//!   TargetRotation ──▶ ConnectivityProbe ──▶ publish result
//!                                                 │
//!   HourlyTrigger ──▶ ThroughputProbe ──▶ publish speed (if due)
//!                                                 │
//!                     success? ──▶ flush PendingBuffer
//!                                                 │
//!                     OutageTracker ──▶ publish alert (on resolution)
//! ```
//!
//! Iterations never overlap. [`Monitor::run`] sleeps for the configured
//! interval between them and checks for shutdown only while sleeping.
//!
//! # Modules
//!
//! - [`rotation`] - Round-robin target selection
//! - [`trigger`] - Once-per-hour speed test trigger

pub mod rotation;
pub mod trigger;

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Error, MonitorErrorTrait, Result};
use crate::models::Measurement;
use crate::outage::{OutageTracker, Transition};
use crate::probe::{
    ConnectivityProbe, HttpConnectivityProbe, HttpThroughputProbe, ProbeOutcome, ThroughputProbe,
};
use crate::publish::{Broker, DrainReport, PendingBuffer, Publisher, Topics};

pub use rotation::TargetRotation;
pub use trigger::HourlyTrigger;

/// What the speed test did this iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedTestStatus {
    /// Trigger minute not reached
    NotDue,
    /// Measured; `published` is false when the result was buffered
    Measured { published: bool },
    /// Probe failed; the sample is dropped
    Failed,
}

/// Summary of one iteration, used for logging and tests
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    /// Target probed this iteration
    pub target: String,
    /// `None` when the probe faulted and produced no result
    pub success: Option<bool>,
    /// Whether the connectivity result reached the broker directly
    pub published: bool,
    pub speed_test: SpeedTestStatus,
    /// Present when a successful probe triggered a drain
    pub drain: Option<DrainReport>,
    /// Alert text, when an outage was resolved this iteration
    pub alert: Option<String>,
    /// Messages still waiting after the iteration
    pub pending: usize,
}

/// Connectivity monitor session
///
/// Owns the pending buffer, the outage state and the rotation cursor. Every
/// method takes `&mut self`; no locking is involved.
pub struct Monitor {
    interval: Duration,
    rotation: TargetRotation,
    connectivity: Box<dyn ConnectivityProbe>,
    throughput: Box<dyn ThroughputProbe>,
    publisher: Publisher,
    buffer: PendingBuffer,
    outage: OutageTracker,
    trigger: Option<HourlyTrigger>,
}

impl Monitor {
    /// Assemble a monitor from its collaborators
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the target list is empty
    pub fn new(
        config: &Config,
        connectivity: Box<dyn ConnectivityProbe>,
        throughput: Box<dyn ThroughputProbe>,
        broker: Arc<dyn Broker>,
    ) -> Result<Self> {
        let rotation = TargetRotation::new(config.probe.targets.iter().cloned())
            .ok_or_else(|| Error::config("at least one probe target is required"))?;

        let topics = Topics {
            measurements: config.topics.measurements.clone(),
            alerts: config.topics.alerts.clone(),
        };

        Ok(Self {
            interval: config.interval(),
            rotation,
            connectivity,
            throughput,
            publisher: Publisher::new(broker, topics),
            buffer: PendingBuffer::new(),
            outage: OutageTracker::new(),
            trigger: None,
        })
    }

    /// Assemble a monitor with the HTTP probes
    pub fn from_config(config: &Config, broker: Arc<dyn Broker>) -> Result<Self> {
        let connectivity = HttpConnectivityProbe::new(&config.probe)?;
        let throughput = HttpThroughputProbe::new(&config.speedtest)?;

        Self::new(config, Box::new(connectivity), Box::new(throughput), broker)
    }

    pub fn pending(&self) -> &PendingBuffer {
        &self.buffer
    }

    pub fn outage(&self) -> &OutageTracker {
        &self.outage
    }

    /// Run one iteration at wall-clock time `now`
    ///
    /// The first call fixes the speed test minute.
    pub async fn run_iteration(&mut self, now: DateTime<Utc>) -> IterationReport {
        let target = self.rotation.next_target().to_string();

        let result = match self.connectivity.check(&target).await {
            ProbeOutcome::Fault(e) => {
                let err = Error::from(e);
                error!(
                    url = %target,
                    category = %err.category(),
                    recoverable = err.is_recoverable(),
                    error = %err,
                    "Connectivity probe failed without a result"
                );
                None
            }
            outcome => {
                debug!(url = %target, outcome = outcome.as_str(), "Connectivity probe finished");
                outcome.into_result()
            }
        };

        let success = result.as_ref().map(|r| r.success);
        let published = match &result {
            Some(r) => {
                self.publisher
                    .publish_measurement(&mut self.buffer, Measurement::from(r.clone()))
                    .await
            }
            None => false,
        };

        let speed_test = self.speed_test(now).await;

        let mut drain = None;
        let mut alert = None;
        if let Some(result) = &result {
            if result.success {
                drain = Some(self.publisher.flush(&mut self.buffer).await);
            }

            if let Transition::Resolved(resolved) = self.outage.observe(result, now) {
                let message = resolved.message();
                self.publisher
                    .publish_alert(&mut self.buffer, message.clone())
                    .await;
                alert = Some(message);
            }
        }

        let report = IterationReport {
            target,
            success,
            published,
            speed_test,
            drain,
            alert,
            pending: self.buffer.len(),
        };

        debug!(
            url = %report.target,
            success = ?report.success,
            published = report.published,
            speed_test = ?report.speed_test,
            pending = report.pending,
            outage = self.outage.is_outage(),
            "Iteration complete"
        );

        report
    }

    async fn speed_test(&mut self, now: DateTime<Utc>) -> SpeedTestStatus {
        let trigger = self
            .trigger
            .get_or_insert_with(|| HourlyTrigger::starting_at(now));
        if !trigger.fire(now) {
            return SpeedTestStatus::NotDue;
        }
        let next_in_secs = trigger.until_next(now).num_seconds();

        match self.throughput.measure().await {
            Ok(speed) => {
                info!(
                    download_mbps = speed.download_mbps,
                    upload_mbps = speed.upload_mbps,
                    ping_ms = speed.ping_ms,
                    next_in_secs,
                    "Speed test complete"
                );
                let published = self
                    .publisher
                    .publish_measurement(&mut self.buffer, Measurement::from(speed))
                    .await;
                SpeedTestStatus::Measured { published }
            }
            Err(e) => {
                let err = Error::from(e);
                warn!(
                    category = %err.category(),
                    error = %err,
                    next_in_secs,
                    "Speed test failed, dropping sample"
                );
                SpeedTestStatus::Failed
            }
        }
    }

    /// Loop until `shutdown` resolves
    ///
    /// Shutdown is observed between iterations only; a started iteration
    /// always completes.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future,
    {
        tokio::pin!(shutdown);

        info!(
            interval_secs = self.interval.as_secs(),
            targets = self.rotation.len(),
            broker = self.publisher.broker_name(),
            "Starting connectivity monitor"
        );

        loop {
            self.run_iteration(Utc::now()).await;

            tokio::select! {
                _ = &mut shutdown => {
                    info!(pending = self.buffer.len(), "Shutdown requested, stopping monitor");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

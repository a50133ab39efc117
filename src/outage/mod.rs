//! Outage detection
//!
//! A two-state machine fed with one connectivity outcome per probe:
//!
//! ```text
//!          failure
//!   ┌────┐ ─────────▶ ┌──────┐
//!   │ Up │            │ Down │
//!   └────┘ ◀───────── └──────┘
//!          success (emits resolution alert)
//! ```
//!
//! Success while `Up` and failure while `Down` change nothing.
//!
//! Entering `Down` records the start time and only logs. Leaving `Down`
//! produces exactly one [`OutageResolved`], which the scheduler publishes to
//! the alerts topic.

use chrono::{DateTime, Duration, Utc};

use crate::models::ConnectivityResult;
use crate::utils::format_elapsed;

/// Current outage status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutageState {
    pub is_outage: bool,
    pub started_at: Option<DateTime<Utc>>,
}

/// Result of feeding one outcome to the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// State unchanged
    None,
    /// Up → Down
    Started { at: DateTime<Utc> },
    /// Down → Up
    Resolved(OutageResolved),
}

/// A finished outage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutageResolved {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl OutageResolved {
    pub fn duration(&self) -> Duration {
        self.ended_at - self.started_at
    }

    /// Alert text published to the alerts topic
    pub fn message(&self) -> String {
        format!(
            "Internet outage resolved. Outage duration: {}",
            format_elapsed(self.duration())
        )
    }
}

/// Tracks outage start and end across connectivity probes
#[derive(Debug, Default)]
pub struct OutageTracker {
    state: OutageState,
}

impl OutageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OutageState {
        self.state
    }

    pub fn is_outage(&self) -> bool {
        self.state.is_outage
    }

    /// Feed a connectivity result observed at `now`
    pub fn observe(&mut self, result: &ConnectivityResult, now: DateTime<Utc>) -> Transition {
        self.record(result.success, now)
    }

    /// Feed a bare success flag observed at `now`
    pub fn record(&mut self, success: bool, now: DateTime<Utc>) -> Transition {
        match (self.state.is_outage, success) {
            (false, false) => {
                self.state = OutageState {
                    is_outage: true,
                    started_at: Some(now),
                };
                tracing::info!(started_at = %now, "Internet outage detected. Starting outage timer.");
                Transition::Started { at: now }
            }
            (true, true) => {
                let started_at = self.state.started_at.unwrap_or(now);
                self.state = OutageState::default();

                let resolved = OutageResolved {
                    started_at,
                    ended_at: now,
                };
                tracing::info!(
                    started_at = %started_at,
                    duration = %format_elapsed(resolved.duration()),
                    "Internet outage resolved"
                );
                Transition::Resolved(resolved)
            }
            _ => Transition::None,
        }
    }
}

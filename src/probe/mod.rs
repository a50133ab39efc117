//! Connectivity and throughput probes
//!
//! Probes never panic or bubble errors into the scheduler. A connectivity
//! check always yields a [`ProbeOutcome`]; a throughput test yields a
//! `Result` whose error the scheduler logs and drops.
//!
//! # Modules
//!
//! - [`http`] - HTTP reachability check against a single target
//! - [`speed`] - HTTP throughput test (latency, download, upload)

pub mod http;
pub mod speed;

use async_trait::async_trait;

use crate::models::{ConnectivityResult, SpeedResult};
use crate::utils::error::ProbeError;

pub use http::HttpConnectivityProbe;
pub use speed::HttpThroughputProbe;

/// Outcome of one reachability check
#[derive(Debug)]
pub enum ProbeOutcome {
    /// Target answered with a success status
    Reachable(ConnectivityResult),
    /// Request-level failure; still a measurement
    Unreachable(ConnectivityResult),
    /// The probe itself failed; no measurement this round
    Fault(ProbeError),
}

impl ProbeOutcome {
    /// Measurement produced, if any
    pub fn into_result(self) -> Option<ConnectivityResult> {
        match self {
            Self::Reachable(r) | Self::Unreachable(r) => Some(r),
            Self::Fault(_) => None,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reachable(_) => "reachable",
            Self::Unreachable(_) => "unreachable",
            Self::Fault(_) => "fault",
        }
    }
}

/// Reachability check against one target
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn check(&self, target: &str) -> ProbeOutcome;
}

/// Link throughput measurement
#[async_trait]
pub trait ThroughputProbe: Send + Sync {
    async fn measure(&self) -> Result<SpeedResult, ProbeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_outcome_carries_result() {
        let ok = ProbeOutcome::Reachable(ConnectivityResult::reachable(Utc::now(), 200, 1.0));
        assert_eq!(ok.as_str(), "reachable");
        assert!(ok.into_result().is_some_and(|r| r.success));

        let failed = ProbeOutcome::Unreachable(ConnectivityResult::unreachable(
            Utc::now(),
            None,
            1.0,
            "timeout",
        ));
        assert_eq!(failed.as_str(), "unreachable");
        assert!(failed.into_result().is_some_and(|r| !r.success));
    }

    #[test]
    fn test_fault_has_no_result() {
        let outcome = ProbeOutcome::Fault(ProbeError::Other("boom".to_string()));
        assert_eq!(outcome.as_str(), "fault");
        assert!(outcome.into_result().is_none());
    }
}

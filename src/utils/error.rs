//! Error types for the probe layer
//!
//! Request-level failures are not errors here: they become failed
//! measurements. These types cover the cases where a probe could not
//! produce a measurement at all.

use thiserror::Error;

/// Errors that prevent a probe from producing a measurement
#[derive(Error, Debug)]
pub enum ProbeError {
    /// HTTP client could not be built or used
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// Target URL is not a valid absolute URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Probe did not finish within its time budget
    #[error("Probe timed out after {0} seconds")]
    Timeout(u64),

    /// Throughput endpoint answered with an error status
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Transfer completed but no usable sample could be computed
    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    /// Anything else the probe library reported
    #[error("Probe failed: {0}")]
    Other(String),
}

impl ProbeError {
    /// Whether the next scheduled probe has a chance of succeeding
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Client(e) => !e.is_builder(),
            Self::InvalidUrl(_) => false,
            Self::Timeout(_) | Self::ServerError(_) | Self::InvalidSample(_) => true,
            Self::Other(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_not_recoverable() {
        assert!(!ProbeError::InvalidUrl("nope".to_string()).is_recoverable());
    }

    #[test]
    fn test_timeout_is_recoverable() {
        let err = ProbeError::Timeout(45);
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Probe timed out after 45 seconds");
    }
}

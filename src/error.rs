//! Unified error handling for the linkwatch crate
//!
//! This module provides a unified error type that consolidates the
//! domain-specific errors into a single `Error` enum, while keeping the
//! module errors usable on their own.
//!
//! # Architecture
//!
//! - [`MonitorErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use linkwatch::error::{Error, MonitorErrorTrait};
//!
//! fn report(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = %err.category(), "Retrying next iteration: {err}");
//!     } else {
//!         tracing::error!("Fatal error: {err}");
//!     }
//! }
//! ```

use std::fmt;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::publish::BrokerError;
pub use crate::utils::error::ProbeError;

/// Common trait for all linkwatch error types
pub trait MonitorErrorTrait: std::error::Error {
    /// Check if this error is recoverable (a later iteration may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Probe and HTTP errors
    Network,
    /// Broker connection and publish errors
    Broker,
    /// Configuration and validation errors
    Config,
    /// Payload encoding errors
    Serialization,
}

impl ErrorCategory {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Broker => "broker",
            Self::Config => "config",
            Self::Serialization => "serialization",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the linkwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Connectivity or throughput probe errors
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Broker errors
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl MonitorErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Probe(e) => e.is_recoverable(),
            Self::Broker(BrokerError::Serialization(_)) => false,
            Self::Broker(_) => true,
            Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Probe(_) => ErrorCategory::Network,
            Self::Broker(BrokerError::Serialization(_)) => ErrorCategory::Serialization,
            Self::Broker(_) => ErrorCategory::Broker,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let probe_err = Error::Probe(ProbeError::Timeout(5));
        assert_eq!(probe_err.category(), ErrorCategory::Network);

        let broker_err = Error::Broker(BrokerError::Closed);
        assert_eq!(broker_err.category(), ErrorCategory::Broker);
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::Probe(ProbeError::Timeout(5)).is_recoverable());
        assert!(Error::Broker(BrokerError::Connect("refused".to_string())).is_recoverable());
        assert!(!Error::Probe(ProbeError::InvalidUrl("x".to_string())).is_recoverable());
    }

    #[test]
    fn test_serialization_failure_inside_broker() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::Broker(BrokerError::Serialization(json_err));

        assert_eq!(err.category(), ErrorCategory::Serialization);
        assert!(!err.is_recoverable());
        assert_eq!(err.category().to_string(), "serialization");
    }

    #[test]
    fn test_error_conversion() {
        let unified: Error = ProbeError::ServerError(503).into();
        assert!(matches!(unified, Error::Probe(_)));

        let unified: Error = BrokerError::Closed.into();
        assert!(matches!(unified, Error::Broker(_)));
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("MQTT_SERVER environment variable is not set");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
    }
}

//! HTTP reachability probe
//!
//! Classification of `reqwest` failures:
//! - timeout, connect (including DNS), redirect and body errors, and any
//!   4xx/5xx status are request-level failures and produce an unsuccessful
//!   [`ConnectivityResult`]
//! - builder errors and malformed targets are probe faults

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::{Duration, Instant};

use super::{ConnectivityProbe, ProbeOutcome};
use crate::config::ProbeConfig;
use crate::models::ConnectivityResult;
use crate::utils::error::ProbeError;
use crate::utils::{extract_domain, truncate_text};

/// Reachability check with a fixed request timeout
pub struct HttpConnectivityProbe {
    client: Client,
    timeout: Duration,
    max_error_text: usize,
}

impl HttpConnectivityProbe {
    /// Create a probe from configuration
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Client` if the HTTP client cannot be created
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ProbeError::Client)?;

        Ok(Self {
            client,
            timeout: config.timeout(),
            max_error_text: config.max_error_text,
        })
    }

    fn elapsed_ms(started: Instant) -> f64 {
        started.elapsed().as_secs_f64() * 1000.0
    }

    fn classify_error(
        &self,
        err: reqwest::Error,
        timestamp: DateTime<Utc>,
        started: Instant,
    ) -> ProbeOutcome {
        if err.is_builder() {
            return ProbeOutcome::Fault(ProbeError::Client(err));
        }

        if err.is_timeout()
            || err.is_connect()
            || err.is_request()
            || err.is_redirect()
            || err.is_body()
            || err.is_decode()
            || err.is_status()
        {
            let error_text = if err.is_timeout() {
                format!("request timed out after {}s", self.timeout.as_secs())
            } else {
                err.to_string()
            };

            return ProbeOutcome::Unreachable(ConnectivityResult::unreachable(
                timestamp,
                err.status().map(|s| s.as_u16()),
                Self::elapsed_ms(started),
                truncate_text(&error_text, self.max_error_text),
            ));
        }

        ProbeOutcome::Fault(ProbeError::Other(err.to_string()))
    }
}

#[async_trait]
impl ConnectivityProbe for HttpConnectivityProbe {
    async fn check(&self, target: &str) -> ProbeOutcome {
        let host = match extract_domain(target) {
            Ok(host) => host,
            Err(_) => return ProbeOutcome::Fault(ProbeError::InvalidUrl(target.to_string())),
        };

        tracing::info!(url = %target, host = %host, "Testing internet connection");

        let timestamp = Utc::now();
        let started = Instant::now();

        let response = match self.client.get(target).send().await {
            Ok(response) => response,
            Err(e) => return self.classify_error(e, timestamp, started),
        };

        let status = response.status();
        let elapsed = Self::elapsed_ms(started);

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            let error_text = if body.trim().is_empty() {
                status.to_string()
            } else {
                truncate_text(body.trim(), self.max_error_text)
            };

            return ProbeOutcome::Unreachable(ConnectivityResult::unreachable(
                timestamp,
                Some(status.as_u16()),
                elapsed,
                error_text,
            ));
        }

        ProbeOutcome::Reachable(ConnectivityResult::reachable(
            timestamp,
            status.as_u16(),
            elapsed,
        ))
    }
}

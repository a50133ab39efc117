//! HTTP throughput probe
//!
//! Latency is the fastest of a few small GETs. Download and upload rates come
//! from timing one large transfer in each direction. The whole test runs
//! under a single time budget.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::time::{Duration, Instant};

use super::ThroughputProbe;
use crate::config::SpeedTestConfig;
use crate::models::SpeedResult;
use crate::utils::error::ProbeError;

/// Convert a transfer of `bytes` over `elapsed` into megabits per second
pub fn megabits_per_second(bytes: usize, elapsed: Duration) -> Result<f64, ProbeError> {
    let secs = elapsed.as_secs_f64();
    if bytes == 0 {
        return Err(ProbeError::InvalidSample("empty transfer".to_string()));
    }
    if secs <= 0.0 {
        return Err(ProbeError::InvalidSample("zero-length interval".to_string()));
    }
    Ok(bytes as f64 * 8.0 / secs / 1_000_000.0)
}

/// Throughput test against configurable HTTP endpoints
pub struct HttpThroughputProbe {
    client: Client,
    config: SpeedTestConfig,
}

impl HttpThroughputProbe {
    /// Create a throughput probe
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::InvalidUrl` for a malformed endpoint and
    /// `ProbeError::Client` if the HTTP client cannot be created
    pub fn new(config: &SpeedTestConfig) -> Result<Self, ProbeError> {
        for endpoint in [&config.ping_url, &config.download_url, &config.upload_url] {
            url::Url::parse(endpoint).map_err(|_| ProbeError::InvalidUrl(endpoint.clone()))?;
        }

        let client = Client::builder()
            .user_agent(format!("linkwatch/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProbeError::Client)?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn check_status(response: &reqwest::Response) -> Result<(), ProbeError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::ServerError(status.as_u16()))
        }
    }

    async fn ping(&self) -> Result<f64, ProbeError> {
        let mut best: Option<Duration> = None;

        for _ in 0..self.config.ping_samples.max(1) {
            let started = Instant::now();
            let response = self
                .client
                .get(&self.config.ping_url)
                .send()
                .await
                .map_err(ProbeError::Client)?;
            Self::check_status(&response)?;
            response.bytes().await.map_err(ProbeError::Client)?;

            let elapsed = started.elapsed();
            best = Some(best.map_or(elapsed, |b| b.min(elapsed)));
        }

        best.map(|d| d.as_secs_f64() * 1000.0)
            .ok_or_else(|| ProbeError::InvalidSample("no latency samples".to_string()))
    }

    async fn download(&self) -> Result<f64, ProbeError> {
        let started = Instant::now();
        let response = self
            .client
            .get(&self.config.download_url)
            .send()
            .await
            .map_err(ProbeError::Client)?;
        Self::check_status(&response)?;

        let body = response.bytes().await.map_err(ProbeError::Client)?;
        megabits_per_second(body.len(), started.elapsed())
    }

    async fn upload(&self) -> Result<f64, ProbeError> {
        let payload = vec![0u8; self.config.upload_bytes];
        let size = payload.len();

        let started = Instant::now();
        let response = self
            .client
            .post(&self.config.upload_url)
            .body(payload)
            .send()
            .await
            .map_err(ProbeError::Client)?;
        Self::check_status(&response)?;
        let elapsed = started.elapsed();

        megabits_per_second(size, elapsed)
    }

    async fn run(&self) -> Result<SpeedResult, ProbeError> {
        let timestamp = Utc::now();

        let ping_ms = self.ping().await?;
        let download_mbps = self.download().await?;
        let upload_mbps = self.upload().await?;

        Ok(SpeedResult::new(timestamp, download_mbps, upload_mbps, ping_ms))
    }
}

#[async_trait]
impl ThroughputProbe for HttpThroughputProbe {
    async fn measure(&self) -> Result<SpeedResult, ProbeError> {
        tracing::info!("Running speed test");

        match tokio::time::timeout(self.config.timeout(), self.run()).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.config.timeout_secs)),
        }
    }
}

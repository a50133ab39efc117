//! Configuration management for linkwatch
//!
//! All settings come from environment variables. Only the broker address is
//! required; everything else has a default.

use anyhow::{Context, Result};
use std::time::Duration;

/// Reachability targets, probed round-robin one per iteration
pub const DEFAULT_TARGETS: &[&str] = &[
    "https://www.google.com",
    "https://www.duckduckgo.com",
    "https://www.cloudflare.com/",
    "https://www.bing.com",
];

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Broker connection settings
    pub broker: BrokerConfig,

    /// Destination topics
    pub topics: TopicsConfig,

    /// Connectivity probe settings
    pub probe: ProbeConfig,

    /// Throughput test settings
    pub speedtest: SpeedTestConfig,

    /// Loop cadence
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// MQTT broker configuration
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Broker host name or address
    pub host: String,

    /// Broker TCP port
    pub port: u16,

    /// MQTT client identifier
    pub client_id: String,

    /// Keep-alive interval in seconds
    pub keep_alive_secs: u64,

    /// Timeout for connect, publish and disconnect, in seconds
    pub timeout_secs: u64,
}

/// Topic names
#[derive(Debug, Clone)]
pub struct TopicsConfig {
    /// Connectivity and speed records
    pub measurements: String,

    /// Outage alerts
    pub alerts: String,
}

/// Connectivity probe configuration
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Rotating target list
    pub targets: Vec<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User agent string
    pub user_agent: String,

    /// Longest error body kept in a failed result
    pub max_error_text: usize,
}

/// Throughput test configuration
#[derive(Debug, Clone)]
pub struct SpeedTestConfig {
    /// Small endpoint used for latency samples
    pub ping_url: String,

    /// Large download used for the download rate
    pub download_url: String,

    /// Endpoint accepting the upload payload
    pub upload_url: String,

    /// Upload payload size in bytes
    pub upload_bytes: usize,

    /// Latency samples taken; the minimum is reported
    pub ping_samples: u32,

    /// Budget for the whole test, in seconds
    pub timeout_secs: u64,
}

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Seconds between iterations
    pub interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Fails when `MQTT_SERVER` is unset or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let defaults = Self::default();

        let host = lookup("MQTT_SERVER")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .context("MQTT_SERVER environment variable is not set")?;

        let port = lookup("MQTT_PORT")
            .and_then(|v| v.trim().parse::<u16>().ok())
            .unwrap_or(defaults.broker.port);

        let client_id = lookup("LINKWATCH_MQTT_CLIENT_ID")
            .unwrap_or_else(|| format!("linkwatch-{}", uuid::Uuid::new_v4().simple()));

        let measurements = lookup("LINKWATCH_MEASUREMENTS_TOPIC")
            .unwrap_or(defaults.topics.measurements);
        let alerts = lookup("LINKWATCH_ALERTS_TOPIC").unwrap_or(defaults.topics.alerts);

        let speedtest = SpeedTestConfig {
            ping_url: lookup("LINKWATCH_SPEEDTEST_PING_URL").unwrap_or(defaults.speedtest.ping_url),
            download_url: lookup("LINKWATCH_SPEEDTEST_DOWNLOAD_URL")
                .unwrap_or(defaults.speedtest.download_url),
            upload_url: lookup("LINKWATCH_SPEEDTEST_UPLOAD_URL")
                .unwrap_or(defaults.speedtest.upload_url),
            upload_bytes: parsed("LINKWATCH_SPEEDTEST_UPLOAD_BYTES")
                .map(|v| v as usize)
                .unwrap_or(defaults.speedtest.upload_bytes),
            ping_samples: defaults.speedtest.ping_samples,
            timeout_secs: parsed("LINKWATCH_SPEEDTEST_TIMEOUT_SECS")
                .unwrap_or(defaults.speedtest.timeout_secs),
        };

        let config = Self {
            broker: BrokerConfig {
                host,
                port,
                client_id,
                keep_alive_secs: defaults.broker.keep_alive_secs,
                timeout_secs: parsed("LINKWATCH_BROKER_TIMEOUT_SECS")
                    .unwrap_or(defaults.broker.timeout_secs),
            },
            topics: TopicsConfig {
                measurements,
                alerts,
            },
            probe: ProbeConfig {
                timeout_secs: parsed("LINKWATCH_PROBE_TIMEOUT_SECS")
                    .unwrap_or(defaults.probe.timeout_secs),
                ..defaults.probe
            },
            speedtest,
            scheduler: SchedulerConfig {
                interval_secs: parsed("LINKWATCH_INTERVAL_SECS")
                    .unwrap_or(defaults.scheduler.interval_secs),
            },
            logging: LoggingConfig {
                level: lookup("LINKWATCH_LOG_LEVEL").unwrap_or(defaults.logging.level),
                format: lookup("LINKWATCH_LOG_FORMAT").unwrap_or(defaults.logging.format),
            },
        };

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.broker.host.trim().is_empty() {
            anyhow::bail!("broker host must not be empty");
        }

        if self.broker.port == 0 {
            anyhow::bail!("broker port must be greater than 0");
        }

        if self.topics.measurements.is_empty() || self.topics.alerts.is_empty() {
            anyhow::bail!("topic names must not be empty");
        }

        if self.probe.targets.is_empty() {
            anyhow::bail!("at least one probe target is required");
        }

        if self.probe.timeout_secs == 0 {
            anyhow::bail!("probe timeout must be greater than 0");
        }

        if self.scheduler.interval_secs == 0 {
            anyhow::bail!("interval must be greater than 0");
        }

        if self.probe.timeout_secs >= self.scheduler.interval_secs {
            anyhow::bail!("probe timeout must be shorter than the interval");
        }

        if self.speedtest.timeout_secs == 0 {
            anyhow::bail!("speed test timeout must be greater than 0");
        }

        Ok(())
    }

    /// Get iteration interval as Duration
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.interval_secs)
    }
}

impl BrokerConfig {
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ProbeConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SpeedTestConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker: BrokerConfig {
                host: String::from("localhost"),
                port: 1883,
                client_id: String::from("linkwatch"),
                keep_alive_secs: 30,
                timeout_secs: 10,
            },
            topics: TopicsConfig {
                measurements: String::from("/home/net-monitor"),
                alerts: String::from("/alerts/info"),
            },
            probe: ProbeConfig {
                targets: DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect(),
                timeout_secs: 5,
                user_agent: format!("linkwatch/{}", env!("CARGO_PKG_VERSION")),
                max_error_text: 512,
            },
            speedtest: SpeedTestConfig {
                ping_url: String::from("https://speed.cloudflare.com/__down?bytes=0"),
                download_url: String::from("https://speed.cloudflare.com/__down?bytes=25000000"),
                upload_url: String::from("https://speed.cloudflare.com/__up"),
                upload_bytes: 10_000_000,
                ping_samples: 3,
                timeout_secs: 45,
            },
            scheduler: SchedulerConfig { interval_secs: 60 },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

// Core measurement records published to the broker

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::utils::round2;

/// Measurement discriminator carried on the wire as the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementKind {
    Connectivity = 1,
    Speed = 2,
}

impl MeasurementKind {
    /// Numeric wire code
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connectivity => "connectivity",
            Self::Speed => "speed",
        }
    }
}

impl std::fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Zero-sized `type` field fixed to a single [`MeasurementKind`].
///
/// Deserialization rejects any other code, which keeps the untagged
/// [`Measurement`] enum from confusing the two shapes.
macro_rules! kind_tag {
    ($name:ident, $kind:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        struct $name;

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u8($kind.code())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let code = u8::deserialize(deserializer)?;
                if code == $kind.code() {
                    Ok($name)
                } else {
                    Err(de::Error::custom(format!(
                        "expected measurement type {}, got {code}",
                        $kind.code()
                    )))
                }
            }
        }
    };
}

kind_tag!(ConnectivityTag, MeasurementKind::Connectivity);
kind_tag!(SpeedTag, MeasurementKind::Speed);

/// ISO 8601 in UTC with millisecond precision and a `Z` suffix
mod timestamp_millis {
    use super::*;

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

/// Outcome of one reachability probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityResult {
    #[serde(with = "timestamp_millis")]
    pub timestamp: DateTime<Utc>,
    /// HTTP status, when the target answered at all
    pub status: Option<u16>,
    pub response_time_ms: f64,
    /// Empty on success
    pub error_text: String,
    pub success: bool,
    #[serde(rename = "type")]
    kind: ConnectivityTag,
}

impl ConnectivityResult {
    /// Target answered with a success status
    pub fn reachable(timestamp: DateTime<Utc>, status: u16, response_time_ms: f64) -> Self {
        Self {
            timestamp,
            status: Some(status),
            response_time_ms: round2(response_time_ms.max(0.0)),
            error_text: String::new(),
            success: true,
            kind: ConnectivityTag,
        }
    }

    /// Request-level failure (timeout, refused connection, error status)
    pub fn unreachable(
        timestamp: DateTime<Utc>,
        status: Option<u16>,
        response_time_ms: f64,
        error_text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            status,
            response_time_ms: round2(response_time_ms.max(0.0)),
            error_text: error_text.into(),
            success: false,
            kind: ConnectivityTag,
        }
    }
}

/// Outcome of one throughput test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedResult {
    #[serde(with = "timestamp_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "download_speed")]
    pub download_mbps: f64,
    #[serde(rename = "upload_speed")]
    pub upload_mbps: f64,
    #[serde(rename = "ping")]
    pub ping_ms: f64,
    #[serde(rename = "type")]
    kind: SpeedTag,
}

impl SpeedResult {
    /// Create a speed sample; values are clamped at zero and rounded
    pub fn new(timestamp: DateTime<Utc>, download_mbps: f64, upload_mbps: f64, ping_ms: f64) -> Self {
        Self {
            timestamp,
            download_mbps: round2(download_mbps.max(0.0)),
            upload_mbps: round2(upload_mbps.max(0.0)),
            ping_ms: round2(ping_ms.max(0.0)),
            kind: SpeedTag,
        }
    }
}

/// Any record published to the measurements topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    Connectivity(ConnectivityResult),
    Speed(SpeedResult),
}

impl Measurement {
    pub fn kind(&self) -> MeasurementKind {
        match self {
            Self::Connectivity(_) => MeasurementKind::Connectivity,
            Self::Speed(_) => MeasurementKind::Speed,
        }
    }
}

impl From<ConnectivityResult> for Measurement {
    fn from(result: ConnectivityResult) -> Self {
        Self::Connectivity(result)
    }
}

impl From<SpeedResult> for Measurement {
    fn from(result: SpeedResult) -> Self {
        Self::Speed(result)
    }
}

//! Typed sensor readings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::timestamp;

/// One reading of a sensor, rebuilt on every aggregation cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading<T> {
    /// Sensor-specific payload
    pub value: T,
    /// Capture time; `None` when unknown
    pub timestamp: Option<DateTime<Utc>>,
    /// Whether every required field parsed and validated
    pub is_valid: bool,
}

impl<T> SensorReading<T> {
    /// A fully parsed reading
    pub fn valid(value: T, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            timestamp: Some(timestamp),
            is_valid: true,
        }
    }

    /// A fallback reading with unknown capture time
    pub fn fallback(value: T) -> Self {
        Self {
            value,
            timestamp: None,
            is_valid: false,
        }
    }

    /// Age at `now` in milliseconds, infinite when the timestamp is unknown
    pub fn age_millis(&self, now: DateTime<Utc>) -> f64 {
        timestamp::age_millis(self.timestamp, now)
    }

    /// Whether the reading is no older than `threshold`
    pub fn is_fresh(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        timestamp::is_fresh(self.timestamp, now, threshold)
    }
}

/// MQ-3 alcohol sensor payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlcoholReading {
    /// Raw ADC level from the log
    pub raw_level: u32,
    /// Normalized level (`raw_level / 180`)
    pub level: f64,
}

/// Front camera visibility payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityReading {
    /// Visibility score in percent
    pub score: u8,
}

/// Driver state classified from the dash camera alert text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DriverState {
    Awake,
    Drowsy,
    Sleepy,
    #[serde(rename = "No Face Detected")]
    NoFaceDetected,
    #[default]
    Unknown,
}

impl DriverState {
    /// Classify free alert text; first match wins, case-insensitive
    pub fn classify(alert: &str) -> Self {
        let alert = alert.to_lowercase();
        if alert.contains("awake") {
            DriverState::Awake
        } else if alert.contains("drowsiness") {
            DriverState::Drowsy
        } else if alert.contains("sleepiness") {
            DriverState::Sleepy
        } else if alert.contains("no driver") {
            DriverState::NoFaceDetected
        } else {
            DriverState::Unknown
        }
    }

    /// Whether this state should raise a drowsiness alert
    pub fn is_impaired(&self) -> bool {
        !matches!(self, DriverState::Awake | DriverState::NoFaceDetected)
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DriverState::Awake => "Awake",
            DriverState::Drowsy => "Drowsy",
            DriverState::Sleepy => "Sleepy",
            DriverState::NoFaceDetected => "No Face Detected",
            DriverState::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Dash camera payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrowsinessReading {
    pub state: DriverState,
}

/// GPS position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// OBD/GPS payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObdReading {
    /// Vehicle speed (km/h), rounded
    pub speed_kmh: f64,
    /// Position reported with the speed sample
    pub coordinates: Coordinates,
    /// Valid and recent enough to count as a live link
    pub is_connected: bool,
}

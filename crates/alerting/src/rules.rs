//! Alert Rule Evaluation

use chrono::{DateTime, Utc};
use incident_history::Severity;
use sensor_extract::{
    AlcoholReading, DriverState, DrowsinessReading, ObdReading, SensorReading, VisibilityReading,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Speed above which a Medium alert fires (km/h)
    pub speed_warning_kmh: f64,
    /// Speed above which the alert becomes High (km/h)
    pub speed_critical_kmh: f64,
    /// Normalized alcohol level (`raw / 180`) at or above which a High alert fires
    pub alcohol_limit: f64,
    /// Visibility score below which a Medium alert fires (%)
    pub visibility_warning: u8,
    /// Visibility score below which the alert becomes High (%)
    pub visibility_critical: u8,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            speed_warning_kmh: 80.0,
            speed_critical_kmh: 130.0,
            alcohol_limit: 1.0,
            visibility_warning: 60,
            visibility_critical: 30,
        }
    }
}

impl AlertConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            speed_warning_kmh: 60.0,
            speed_critical_kmh: 100.0,
            alcohol_limit: 0.75,
            visibility_warning: 70,
            visibility_critical: 40,
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            speed_warning_kmh: 100.0,
            speed_critical_kmh: 150.0,
            alcohol_limit: 1.25,
            visibility_warning: 50,
            visibility_critical: 20,
        }
    }
}

/// Kind of live alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    #[serde(rename = "High Speed")]
    HighSpeed,
    #[serde(rename = "Alcohol Detected")]
    AlcoholDetected,
    #[serde(rename = "Low Visibility")]
    LowVisibility,
    #[serde(rename = "Driver Drowsiness")]
    DriverDrowsiness,
    #[serde(rename = "Driver Not Detected")]
    DriverNotDetected,
}

impl AlertKind {
    /// Prefix of synthetic alert ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            AlertKind::HighSpeed => "speed",
            AlertKind::AlcoholDetected => "alcohol",
            AlertKind::LowVisibility => "visibility",
            AlertKind::DriverDrowsiness => "drowsy",
            AlertKind::DriverNotDetected => "noface",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertKind::HighSpeed => "High Speed",
            AlertKind::AlcoholDetected => "Alcohol Detected",
            AlertKind::LowVisibility => "Low Visibility",
            AlertKind::DriverDrowsiness => "Driver Drowsiness",
            AlertKind::DriverNotDetected => "Driver Not Detected",
        })
    }
}

/// A transient alert raised for the current cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    pub description: String,
    pub time: DateTime<Utc>,
}

impl LiveAlert {
    fn new(kind: AlertKind, severity: Severity, description: String, now: DateTime<Utc>) -> Self {
        Self {
            id: format!("{}-{}", kind.id_prefix(), now.timestamp_millis()),
            kind,
            severity,
            description,
            time: now,
        }
    }
}

/// Latest readings of every live sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveReadings {
    pub alcohol: SensorReading<AlcoholReading>,
    pub visibility: SensorReading<VisibilityReading>,
    pub drowsiness: SensorReading<DrowsinessReading>,
    pub obd: SensorReading<ObdReading>,
}

/// Rule set for live alerts
#[derive(Debug, Clone, Default)]
pub struct AlertRules {
    config: AlertConfig,
}

impl AlertRules {
    /// Create a rule set
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating alert rules with config: {:?}", config);
        Self { config }
    }

    /// Thresholds in use
    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Evaluate every rule against readings no older than `freshness`
    pub fn evaluate(
        &self,
        readings: &LiveReadings,
        now: DateTime<Utc>,
        freshness: Duration,
    ) -> Vec<LiveAlert> {
        let mut alerts = Vec::new();

        if readings.obd.is_fresh(now, freshness) {
            alerts.extend(self.check_speed(&readings.obd.value, now));
        }
        if readings.alcohol.is_fresh(now, freshness) {
            alerts.extend(self.check_alcohol(&readings.alcohol.value, now));
        }
        if readings.visibility.is_fresh(now, freshness) {
            alerts.extend(self.check_visibility(&readings.visibility.value, now));
        }
        if readings.drowsiness.is_fresh(now, freshness) {
            alerts.extend(self.check_driver(&readings.drowsiness.value, now));
        }

        debug!("Evaluated live alert rules: {} alert(s)", alerts.len());
        alerts
    }

    fn check_speed(&self, obd: &ObdReading, now: DateTime<Utc>) -> Option<LiveAlert> {
        if obd.speed_kmh <= self.config.speed_warning_kmh {
            return None;
        }
        let severity = if obd.speed_kmh > self.config.speed_critical_kmh {
            Severity::High
        } else {
            Severity::Medium
        };
        Some(LiveAlert::new(
            AlertKind::HighSpeed,
            severity,
            format!("Driving at {} km/h", obd.speed_kmh),
            now,
        ))
    }

    fn check_alcohol(&self, alcohol: &AlcoholReading, now: DateTime<Utc>) -> Option<LiveAlert> {
        if alcohol.level < self.config.alcohol_limit {
            return None;
        }
        Some(LiveAlert::new(
            AlertKind::AlcoholDetected,
            Severity::High,
            format!(
                "Alcohol level {:.2} (raw {}) at or above limit {:.2}",
                alcohol.level, alcohol.raw_level, self.config.alcohol_limit
            ),
            now,
        ))
    }

    fn check_visibility(
        &self,
        visibility: &VisibilityReading,
        now: DateTime<Utc>,
    ) -> Option<LiveAlert> {
        if visibility.score >= self.config.visibility_warning {
            return None;
        }
        let severity = if visibility.score < self.config.visibility_critical {
            Severity::High
        } else {
            Severity::Medium
        };
        Some(LiveAlert::new(
            AlertKind::LowVisibility,
            severity,
            format!("Visibility: {}%", visibility.score),
            now,
        ))
    }

    fn check_driver(&self, drowsiness: &DrowsinessReading, now: DateTime<Utc>) -> Option<LiveAlert> {
        match drowsiness.state {
            DriverState::NoFaceDetected => Some(LiveAlert::new(
                AlertKind::DriverNotDetected,
                Severity::Low,
                "No face detected in camera".to_string(),
                now,
            )),
            state if state.is_impaired() => Some(LiveAlert::new(
                AlertKind::DriverDrowsiness,
                Severity::High,
                format!("Driver state: {}", state),
                now,
            )),
            _ => None,
        }
    }
}

//! Dashboard Snapshot Types

use alerting::LiveAlert;
use chrono::{DateTime, Utc};
use incident_history::{Incident, Severity};
use sensor_extract::{
    AlcoholReading, Coordinates, DriverState, DrowsinessReading, ObdReading, SensorReading,
    VisibilityReading,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where an active incident came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentSource {
    /// Raised this cycle from fresh readings
    Live,
    /// Recorded in the incident log
    History,
}

/// Entry of the active incident list shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveIncident {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub time: DateTime<Utc>,
    pub source: IncidentSource,
    /// Still ongoing (live alerts) rather than a past record
    pub continuous: bool,
}

impl From<LiveAlert> for ActiveIncident {
    fn from(alert: LiveAlert) -> Self {
        Self {
            id: alert.id,
            kind: alert.kind.to_string(),
            severity: alert.severity,
            description: alert.description,
            location: None,
            time: alert.time,
            source: IncidentSource::Live,
            continuous: true,
        }
    }
}

impl From<Incident> for ActiveIncident {
    fn from(incident: Incident) -> Self {
        Self {
            id: incident.id.to_string(),
            kind: incident.kind,
            severity: incident.severity,
            description: incident.description,
            location: Some(incident.location),
            time: incident.time,
            source: IncidentSource::History,
            continuous: false,
        }
    }
}

/// Display status of one sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorStatus {
    pub last_update: Option<DateTime<Utc>>,
    /// Age of the reading in milliseconds; `None` when the time is unknown
    pub age_ms: Option<u64>,
    pub is_valid: bool,
    pub online: bool,
}

impl SensorStatus {
    /// Status of `reading` at `now`; online when no older than `display`
    pub fn of<T>(reading: &SensorReading<T>, now: DateTime<Utc>, display: Duration) -> Self {
        let age = reading.age_millis(now);
        Self {
            last_update: reading.timestamp,
            age_ms: age.is_finite().then(|| age.max(0.0) as u64),
            is_valid: reading.is_valid,
            online: reading.is_fresh(now, display),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorsStatus {
    pub alcohol: SensorStatus,
    pub visibility: SensorStatus,
    pub drowsiness: SensorStatus,
    pub obd: SensorStatus,
}

/// Everything the live dashboard shows, built once per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub alcohol: SensorReading<AlcoholReading>,
    pub visibility: SensorReading<VisibilityReading>,
    pub drowsiness: SensorReading<DrowsinessReading>,
    pub obd: SensorReading<ObdReading>,
    pub sensors: SensorsStatus,

    pub alcohol_level: f64,
    pub visibility_score: u8,
    pub drowsiness_state: DriverState,
    pub speed: f64,
    pub coordinates: Coordinates,
    pub is_connected: bool,

    pub driver_score: f64,
    pub total_incidents: usize,
    pub monthly_incidents: usize,
    /// Incidents inside the scoring window
    pub recent_incidents: usize,
    pub active_incidents: Vec<ActiveIncident>,
    pub historical_incidents: Vec<Incident>,

    pub generated_at: DateTime<Utc>,
}

//! Aggregator Configuration

use alerting::AlertConfig;
use incident_history::ScoringConfig;
use sensor_extract::timestamp::DEFAULT_SOURCE_OFFSET_MINUTES;
use sensor_extract::{Coordinates, TimestampNormalizer, ValidationConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AggregateError;

/// Longest accepted scoring window (100 years)
pub const MAX_WINDOW_HOURS: u32 = 24 * 365 * 100;

/// Log locations, relative to the log source root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogPaths {
    pub alcohol: String,
    pub visibility: String,
    pub drowsiness: String,
    pub obd: String,
    pub history: String,
}

impl Default for LogPaths {
    fn default() -> Self {
        Self {
            alcohol: "section_4_test_drive/mq3_data.csv".to_string(),
            visibility: "section_1_test_drive/visibility_log.csv".to_string(),
            drowsiness: "section_2_test_drive/drowsiness_log.csv".to_string(),
            obd: "obd_data/trackLog.csv".to_string(),
            history: "master_log.csv".to_string(),
        }
    }
}

/// How old a reading may be before it stops counting
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessPolicy {
    /// Maximum age for a reading to raise alerts (seconds)
    pub alerting_secs: u64,
    /// Maximum age for a sensor to be shown as online (seconds)
    pub display_secs: u64,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            alerting_secs: 15,
            display_secs: 90,
        }
    }
}

impl FreshnessPolicy {
    pub fn alerting(&self) -> Duration {
        Duration::from_secs(self.alerting_secs)
    }

    pub fn display(&self) -> Duration {
        Duration::from_secs(self.display_secs)
    }
}

/// Aggregator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub paths: LogPaths,
    /// Lines fetched from the end of each sensor log
    pub tail_lines: usize,
    /// Lines fetched from the incident log; `None` reads it whole
    pub history_tail_lines: Option<usize>,
    /// Per-fetch timeout (seconds)
    pub fetch_timeout_secs: u64,
    /// Offset assumed for timestamps without one (minutes east of UTC)
    pub source_offset_minutes: i32,
    pub freshness: FreshnessPolicy,
    /// Maximum OBD age for a live link (seconds)
    pub obd_live_secs: u64,
    /// Location shown when no live GPS fix is available
    pub default_coordinates: Coordinates,
    /// Maximum entries in `active_incidents`
    pub active_incident_limit: usize,
    pub scoring: ScoringConfig,
    pub alerts: AlertConfig,
    pub validation: ValidationConfig,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            paths: LogPaths::default(),
            tail_lines: 100,
            history_tail_lines: None,
            fetch_timeout_secs: 20,
            source_offset_minutes: DEFAULT_SOURCE_OFFSET_MINUTES,
            freshness: FreshnessPolicy::default(),
            obd_live_secs: 60,
            default_coordinates: Coordinates { lat: 0.0, lng: 0.0 },
            active_incident_limit: 4,
            scoring: ScoringConfig::default(),
            alerts: AlertConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl AggregatorConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn obd_live_window(&self) -> Duration {
        Duration::from_secs(self.obd_live_secs)
    }

    /// Normalizer for the configured source offset
    pub fn normalizer(&self) -> Result<TimestampNormalizer, AggregateError> {
        TimestampNormalizer::new(self.source_offset_minutes).ok_or_else(|| {
            AggregateError::InvalidConfig(format!(
                "source_offset_minutes {} is not a valid UTC offset",
                self.source_offset_minutes
            ))
        })
    }

    /// Check every value the aggregator depends on
    pub fn validate(&self) -> Result<(), AggregateError> {
        fn invalid(msg: impl Into<String>) -> Result<(), AggregateError> {
            Err(AggregateError::InvalidConfig(msg.into()))
        }

        self.normalizer()?;

        if self.tail_lines == 0 || self.history_tail_lines == Some(0) {
            return invalid("tail line counts must be positive");
        }
        if self.fetch_timeout_secs == 0 {
            return invalid("fetch_timeout_secs must be positive");
        }
        if self.active_incident_limit == 0 {
            return invalid("active_incident_limit must be positive");
        }
        if self.scoring.window_hours == 0 || self.scoring.window_hours > MAX_WINDOW_HOURS {
            return invalid(format!(
                "scoring.window_hours must be within 1..={}",
                MAX_WINDOW_HOURS
            ));
        }
        if !(self.scoring.penalty_divisor.is_finite() && self.scoring.penalty_divisor > 0.0) {
            return invalid("scoring.penalty_divisor must be a positive number");
        }
        let penalties = [
            self.scoring.high_penalty,
            self.scoring.medium_penalty,
            self.scoring.low_penalty,
            self.scoring.clean_bonus_cap,
        ];
        if penalties.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return invalid("scoring penalties and bonus cap must be non-negative");
        }
        if self.alerts.speed_warning_kmh > self.alerts.speed_critical_kmh {
            return invalid("alerts.speed_warning_kmh exceeds speed_critical_kmh");
        }
        if self.alerts.visibility_critical > self.alerts.visibility_warning {
            return invalid("alerts.visibility_critical exceeds visibility_warning");
        }
        if !(self.alerts.alcohol_limit.is_finite() && self.alerts.alcohol_limit > 0.0) {
            return invalid("alerts.alcohol_limit must be a positive number");
        }
        let coords = self.default_coordinates;
        if !(-90.0..=90.0).contains(&coords.lat) || !(-180.0..=180.0).contains(&coords.lng) {
            return invalid("default_coordinates out of range");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AggregatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tail_lines, 100);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(20));
        assert_eq!(config.freshness.alerting(), Duration::from_secs(15));
        assert_eq!(config.freshness.display(), Duration::from_secs(90));
    }

    #[test]
    fn test_invalid_offset() {
        let config = AggregatorConfig {
            source_offset_minutes: 24 * 60,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AggregateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = AggregatorConfig::default();
        config.scoring.penalty_divisor = 0.0;
        assert!(config.validate().is_err());

        let mut config = AggregatorConfig::default();
        config.scoring.window_hours = u32::MAX;
        assert!(config.validate().is_err());
        config.scoring.window_hours = MAX_WINDOW_HOURS;
        assert!(config.validate().is_ok());

        let mut config = AggregatorConfig::default();
        config.alerts.speed_warning_kmh = 200.0;
        assert!(config.validate().is_err());

        let config = AggregatorConfig {
            tail_lines: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AggregatorConfig {
            default_coordinates: Coordinates { lat: 91.0, lng: 0.0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

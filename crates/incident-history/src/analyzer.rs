//! Safety score analysis over the incident log

use chrono::{DateTime, Datelike, Duration, Utc};
use sensor_extract::TimestampNormalizer;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::incident::{parse_incidents, Incident, Severity};

/// Scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Lookback window for scoring and display (hours)
    pub window_hours: u32,
    /// Penalty per in-window High incident
    pub high_penalty: f64,
    /// Penalty per in-window Medium incident
    pub medium_penalty: f64,
    /// Penalty per in-window Low incident
    pub low_penalty: f64,
    /// Total penalty is divided by this before subtracting from 100
    pub penalty_divisor: f64,
    /// Maximum incidents returned for display
    pub display_limit: usize,
    /// Cap on the clean-driving bonus (points); 0 disables it
    pub clean_bonus_cap: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            window_hours: 48,
            high_penalty: 0.15,
            medium_penalty: 0.08,
            low_penalty: 0.0,
            penalty_divisor: 2.0,
            display_limit: 4,
            clean_bonus_cap: 0.0,
        }
    }
}

impl ScoringConfig {
    /// Penalty for one incident of `severity`
    pub fn penalty(&self, severity: Severity) -> f64 {
        match severity {
            Severity::High => self.high_penalty,
            Severity::Medium => self.medium_penalty,
            Severity::Low => self.low_penalty,
        }
    }

    /// Lookback window as a duration
    pub fn window(&self) -> Duration {
        Duration::hours(i64::from(self.window_hours))
    }

    /// Start of the lookback window ending at `now`, clamped to the earliest time
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Result of one history analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    /// Every row with a parseable time
    pub total_incidents: usize,
    /// Incidents in the current calendar month (source-local calendar)
    pub monthly_incidents: usize,
    /// Incidents inside the scoring window
    pub windowed_incidents: usize,
    /// Safety score in [0, 100]
    pub driver_score: f64,
    /// Most recent in-window incidents, newest first
    pub recent_incidents: Vec<Incident>,
}

impl HistorySummary {
    /// Summary used when the log is missing or empty; a perfect score
    pub fn neutral() -> Self {
        Self {
            total_incidents: 0,
            monthly_incidents: 0,
            windowed_incidents: 0,
            driver_score: 100.0,
            recent_incidents: Vec::new(),
        }
    }
}

impl Default for HistorySummary {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Incident history analyzer
#[derive(Debug, Clone)]
pub struct HistoryAnalyzer {
    config: ScoringConfig,
    normalizer: TimestampNormalizer,
}

impl HistoryAnalyzer {
    /// Create a new analyzer
    pub fn new(config: ScoringConfig, normalizer: TimestampNormalizer) -> Self {
        Self { config, normalizer }
    }

    /// Scoring configuration in use
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Parse the raw log into incidents
    pub fn parse(&self, raw_log: &str) -> Vec<Incident> {
        parse_incidents(raw_log, &self.normalizer)
    }

    /// Parse and summarize the raw log at `now`
    pub fn analyze(&self, raw_log: &str, now: DateTime<Utc>) -> HistorySummary {
        if raw_log.trim().is_empty() {
            return HistorySummary::neutral();
        }
        let incidents = self.parse(raw_log);
        self.summarize(&incidents, now)
    }

    /// Summarize already-parsed incidents at `now`
    pub fn summarize(&self, incidents: &[Incident], now: DateTime<Utc>) -> HistorySummary {
        let window_start = self.config.window_start(now);

        let mut windowed: Vec<&Incident> = incidents
            .iter()
            .filter(|incident| incident.time >= window_start && incident.time <= now)
            .collect();
        windowed.sort_by(|a, b| b.time.cmp(&a.time));

        let driver_score = self.score(&windowed, now);

        let local_now = now.with_timezone(&self.normalizer.offset());
        let monthly_incidents = incidents
            .iter()
            .filter(|incident| {
                let local = incident.time.with_timezone(&self.normalizer.offset());
                local.year() == local_now.year() && local.month() == local_now.month()
            })
            .count();

        debug!(
            total = incidents.len(),
            windowed = windowed.len(),
            score = driver_score,
            "Analyzed incident history"
        );

        HistorySummary {
            total_incidents: incidents.len(),
            monthly_incidents,
            windowed_incidents: windowed.len(),
            driver_score,
            recent_incidents: windowed
                .iter()
                .take(self.config.display_limit)
                .map(|incident| (*incident).clone())
                .collect(),
        }
    }

    /// Score in-window incidents (sorted newest first)
    fn score(&self, windowed: &[&Incident], now: DateTime<Utc>) -> f64 {
        let penalty: f64 = windowed
            .iter()
            .map(|incident| self.config.penalty(incident.severity))
            .sum();

        let divisor = if self.config.penalty_divisor > 0.0 {
            self.config.penalty_divisor
        } else {
            1.0
        };

        let score = 100.0 - penalty / divisor + self.clean_bonus(windowed, now);
        score.clamp(0.0, 100.0)
    }

    /// Bonus for whole hours driven since the last incident
    fn clean_bonus(&self, windowed: &[&Incident], now: DateTime<Utc>) -> f64 {
        if self.config.clean_bonus_cap <= 0.0 {
            return 0.0;
        }

        let last = windowed
            .first()
            .map(|incident| incident.time)
            .unwrap_or_else(|| self.config.window_start(now));
        let clean_hours = (now - last).num_hours();
        if clean_hours < 1 {
            return 0.0;
        }

        (clean_hours as f64).min(self.config.clean_bonus_cap)
    }
}

impl Default for HistoryAnalyzer {
    fn default() -> Self {
        Self::new(ScoringConfig::default(), TimestampNormalizer::default())
    }
}

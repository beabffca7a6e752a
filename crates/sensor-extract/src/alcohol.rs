//! MQ-3 alcohol sensor extractor
//!
//! Log rows look like `2025-06-01 14:30:00,"MQ3 ... Sensor Value: 412 ..."`.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ExtractError;
use crate::reading::AlcoholReading;
use crate::timestamp::TimestampNormalizer;
use crate::Extractor;

/// Raw level that maps to a normalized level of 1.0
pub const ALCOHOL_SCALE: f64 = 180.0;

static SENSOR_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Sensor Value:\s*(\d+)").expect("sensor value pattern is valid")
});

/// Extractor for the alcohol log
#[derive(Debug, Clone)]
pub struct AlcoholExtractor {
    normalizer: TimestampNormalizer,
    scale: f64,
}

impl AlcoholExtractor {
    /// Create an extractor with the default `/180` normalization
    pub fn new(normalizer: TimestampNormalizer) -> Self {
        Self {
            normalizer,
            scale: ALCOHOL_SCALE,
        }
    }

    /// Normalize a raw ADC level
    pub fn normalize_level(&self, raw_level: u32) -> f64 {
        raw_level as f64 / self.scale
    }
}

impl Extractor for AlcoholExtractor {
    type Output = AlcoholReading;

    fn name(&self) -> &'static str {
        "alcohol"
    }

    fn parse_line(
        &self,
        line: &str,
        _now: DateTime<Utc>,
    ) -> Result<(AlcoholReading, DateTime<Utc>), ExtractError> {
        let (raw_ts, sensor_text) = line
            .split_once(',')
            .ok_or(ExtractError::MissingColumns { expected: 2, found: 1 })?;

        let timestamp = self
            .normalizer
            .normalize(raw_ts)
            .ok_or_else(|| ExtractError::InvalidTimestamp(raw_ts.to_string()))?;

        let digits = SENSOR_VALUE
            .captures(sensor_text)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| ExtractError::PatternNotFound(sensor_text.to_string()))?
            .as_str();

        let raw_level = digits
            .parse::<u32>()
            .map_err(|_| ExtractError::InvalidNumber {
                field: "alcohol",
                raw: digits.to_string(),
            })?;

        Ok((
            AlcoholReading {
                raw_level,
                level: self.normalize_level(raw_level),
            },
            timestamp,
        ))
    }

    fn fallback(&self) -> AlcoholReading {
        AlcoholReading::default()
    }
}

//! Sensor Log Extraction
//!
//! Turns the tail of each onboard sensor log into a typed reading:
//! - Timestamp normalization (naive local, explicit offset, comma-joined)
//! - Alcohol (MQ-3) sensor level
//! - Front camera visibility score
//! - Dash camera drowsiness state
//! - OBD/GPS speed and position
//!
//! Extractors never fail past their own boundary: any parse or validation
//! error yields the sensor's documented fallback reading.

mod alcohol;
mod drowsiness;
mod error;
mod obd;
mod reading;
pub mod timestamp;
mod validator;
mod visibility;

pub use alcohol::{AlcoholExtractor, ALCOHOL_SCALE};
pub use drowsiness::DrowsinessExtractor;
pub use error::ExtractError;
pub use obd::{ObdExtractor, OBD_LIVE_WINDOW, OBD_MIN_COLUMNS};
pub use reading::{
    AlcoholReading, Coordinates, DriverState, DrowsinessReading, ObdReading, SensorReading,
    VisibilityReading,
};
pub use timestamp::{age_millis, is_fresh, normalize, TimestampNormalizer};
pub use validator::{ValidationConfig, Validator};
pub use visibility::VisibilityExtractor;

use chrono::{DateTime, Utc};
use tracing::debug;

/// Common behaviour of the per-sensor extractors
pub trait Extractor {
    /// Typed payload of a reading
    type Output;

    /// Sensor name used in logs and metrics
    fn name(&self) -> &'static str;

    /// Parse one log line into a payload and its capture time
    fn parse_line(
        &self,
        line: &str,
        now: DateTime<Utc>,
    ) -> Result<(Self::Output, DateTime<Utc>), ExtractError>;

    /// Payload substituted when the log cannot be read or parsed
    fn fallback(&self) -> Self::Output;

    /// Extract the latest reading from a raw tail window
    fn extract(&self, raw: &str, now: DateTime<Utc>) -> SensorReading<Self::Output> {
        let parsed = latest_line(raw)
            .ok_or(ExtractError::Empty)
            .and_then(|line| self.parse_line(line, now));

        match parsed {
            Ok((value, timestamp)) => SensorReading::valid(value, timestamp),
            Err(e) => {
                debug!(sensor = self.name(), error = %e, "Using fallback reading");
                self.fallback_reading()
            }
        }
    }

    /// The fallback payload wrapped as an invalid, untimed reading
    fn fallback_reading(&self) -> SensorReading<Self::Output> {
        SensorReading::fallback(self.fallback())
    }
}

/// Last non-empty line of an append-only log window
pub fn latest_line(raw: &str) -> Option<&str> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
}

/// Parse a field as a finite number
pub(crate) fn parse_finite(field: &'static str, raw: &str) -> Result<f64, ExtractError> {
    let trimmed = raw.trim().trim_matches('"');
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ExtractError::InvalidNumber {
            field,
            raw: trimmed.to_string(),
        })
}

/// Split a single CSV line with quoting support and ragged column counts
pub(crate) fn split_csv_line(line: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => Ok(record.iter().map(str::to_string).collect()),
        Some(Err(e)) => Err(ExtractError::Csv(e.to_string())),
        None => Err(ExtractError::Empty),
    }
}

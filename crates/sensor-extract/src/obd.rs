//! OBD/GPS track log extractor
//!
//! The track log is a fixed-layout CSV with at least 30 columns:
//! device time at 1, longitude at 2, latitude at 3, speed (km/h) at 29.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::ExtractError;
use crate::reading::{Coordinates, ObdReading};
use crate::timestamp::{is_fresh, TimestampNormalizer};
use crate::validator::Validator;
use crate::{parse_finite, Extractor};

/// Minimum number of columns in a track log row
pub const OBD_MIN_COLUMNS: usize = 30;

/// Maximum age for an OBD reading to count as a live link
pub const OBD_LIVE_WINDOW: Duration = Duration::from_secs(60);

const TIMESTAMP_COLUMN: usize = 1;
const LONGITUDE_COLUMN: usize = 2;
const LATITUDE_COLUMN: usize = 3;
const SPEED_COLUMN: usize = 29;

/// Extractor for the OBD/GPS track log
#[derive(Debug, Clone)]
pub struct ObdExtractor {
    normalizer: TimestampNormalizer,
    validator: Validator,
    default_coordinates: Coordinates,
    live_window: Duration,
}

impl ObdExtractor {
    pub fn new(
        normalizer: TimestampNormalizer,
        validator: Validator,
        default_coordinates: Coordinates,
    ) -> Self {
        Self {
            normalizer,
            validator,
            default_coordinates,
            live_window: OBD_LIVE_WINDOW,
        }
    }

    /// Override the live-link window
    pub fn with_live_window(mut self, live_window: Duration) -> Self {
        self.live_window = live_window;
        self
    }

    /// Location reported when no live position is available
    pub fn default_coordinates(&self) -> Coordinates {
        self.default_coordinates
    }
}

impl Extractor for ObdExtractor {
    type Output = ObdReading;

    fn name(&self) -> &'static str {
        "obd"
    }

    fn parse_line(
        &self,
        line: &str,
        now: DateTime<Utc>,
    ) -> Result<(ObdReading, DateTime<Utc>), ExtractError> {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < OBD_MIN_COLUMNS {
            return Err(ExtractError::MissingColumns {
                expected: OBD_MIN_COLUMNS,
                found: parts.len(),
            });
        }

        let raw_ts = parts[TIMESTAMP_COLUMN];
        let timestamp = self
            .normalizer
            .normalize(raw_ts)
            .ok_or_else(|| ExtractError::InvalidTimestamp(raw_ts.to_string()))?;

        let lng = self
            .validator
            .validate_longitude(parse_finite("longitude", parts[LONGITUDE_COLUMN])?)?;
        let lat = self
            .validator
            .validate_latitude(parse_finite("latitude", parts[LATITUDE_COLUMN])?)?;
        let speed = self
            .validator
            .validate_speed(parse_finite("speed", parts[SPEED_COLUMN])?)?;

        let is_connected = is_fresh(Some(timestamp), now, self.live_window);

        Ok((
            ObdReading {
                speed_kmh: speed.round(),
                coordinates: Coordinates { lat, lng },
                is_connected,
            },
            timestamp,
        ))
    }

    fn fallback(&self) -> ObdReading {
        ObdReading {
            speed_kmh: 0.0,
            coordinates: self.default_coordinates,
            is_connected: false,
        }
    }
}

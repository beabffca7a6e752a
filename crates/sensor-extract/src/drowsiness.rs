//! Dash camera drowsiness extractor
//!
//! Rows are ragged; only the timestamp (column 1) and the free-text alert
//! (column 6) are used.

use chrono::{DateTime, Utc};

use crate::error::ExtractError;
use crate::reading::{DriverState, DrowsinessReading};
use crate::timestamp::TimestampNormalizer;
use crate::{split_csv_line, Extractor};

const TIMESTAMP_COLUMN: usize = 1;
const ALERT_COLUMN: usize = 6;

/// Extractor for the drowsiness log
#[derive(Debug, Clone)]
pub struct DrowsinessExtractor {
    normalizer: TimestampNormalizer,
}

impl DrowsinessExtractor {
    pub fn new(normalizer: TimestampNormalizer) -> Self {
        Self { normalizer }
    }
}

impl Extractor for DrowsinessExtractor {
    type Output = DrowsinessReading;

    fn name(&self) -> &'static str {
        "drowsiness"
    }

    fn parse_line(
        &self,
        line: &str,
        _now: DateTime<Utc>,
    ) -> Result<(DrowsinessReading, DateTime<Utc>), ExtractError> {
        let cols = split_csv_line(line)?;
        if cols.len() <= ALERT_COLUMN {
            return Err(ExtractError::MissingColumns {
                expected: ALERT_COLUMN + 1,
                found: cols.len(),
            });
        }

        let raw_ts = &cols[TIMESTAMP_COLUMN];
        let timestamp = self
            .normalizer
            .normalize(raw_ts)
            .ok_or_else(|| ExtractError::InvalidTimestamp(raw_ts.clone()))?;

        Ok((
            DrowsinessReading {
                state: DriverState::classify(&cols[ALERT_COLUMN]),
            },
            timestamp,
        ))
    }

    fn fallback(&self) -> DrowsinessReading {
        DrowsinessReading::default()
    }
}

//! Front camera visibility extractor
//!
//! Log rows: `date,time,<ignored>,scorePercent[,...]`.

use chrono::{DateTime, Utc};

use crate::error::ExtractError;
use crate::reading::VisibilityReading;
use crate::timestamp::TimestampNormalizer;
use crate::validator::Validator;
use crate::{parse_finite, split_csv_line, Extractor};

/// Extractor for the visibility log
#[derive(Debug, Clone)]
pub struct VisibilityExtractor {
    normalizer: TimestampNormalizer,
    validator: Validator,
}

impl VisibilityExtractor {
    pub fn new(normalizer: TimestampNormalizer, validator: Validator) -> Self {
        Self {
            normalizer,
            validator,
        }
    }
}

impl Extractor for VisibilityExtractor {
    type Output = VisibilityReading;

    fn name(&self) -> &'static str {
        "visibility"
    }

    fn parse_line(
        &self,
        line: &str,
        _now: DateTime<Utc>,
    ) -> Result<(VisibilityReading, DateTime<Utc>), ExtractError> {
        let cols = split_csv_line(line)?;
        if cols.len() < 4 {
            return Err(ExtractError::MissingColumns {
                expected: 4,
                found: cols.len(),
            });
        }

        let raw_ts = format!("{} {}", cols[0], cols[1]);
        let timestamp = self
            .normalizer
            .normalize(&raw_ts)
            .ok_or(ExtractError::InvalidTimestamp(raw_ts))?;

        let score = parse_finite("visibility", &cols[3])?.round();
        let score = self.validator.validate_visibility(score)?;

        Ok((VisibilityReading { score: score as u8 }, timestamp))
    }

    fn fallback(&self) -> VisibilityReading {
        VisibilityReading::default()
    }
}

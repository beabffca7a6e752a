//! Timestamp Normalization
//!
//! Sensor writers emit inconsistent formats: naive local datetimes, datetimes
//! with an explicit offset, and comma-joined `date,time` pairs. Everything is
//! normalized here to an absolute UTC instant. Strings without offset
//! information are wall-clock time in the source offset (UTC+05:30 unless
//! configured otherwise).

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use std::time::Duration;

/// Offset assumed for naive log timestamps (IST, minutes east of UTC)
pub const DEFAULT_SOURCE_OFFSET_MINUTES: i32 = 330;

/// Formats that carry their own offset. Spaces match any run of whitespace.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f %z",
    "%Y/%m/%d %H:%M:%S%.f %z",
    "%a %b %d %Y %H:%M:%S GMT%z",
];

/// Naive wall-clock formats, tried in order
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%d-%b-%Y %H:%M:%S%.f",
];

/// Normalizer bound to one source offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampNormalizer {
    offset: FixedOffset,
}

impl TimestampNormalizer {
    /// Create a normalizer for naive timestamps at `offset_minutes` east of UTC.
    ///
    /// Returns `None` when the offset is outside ±24h.
    pub fn new(offset_minutes: i32) -> Option<Self> {
        offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
    }

    /// Offset applied to naive timestamps
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Normalize a raw timestamp string to UTC; `None` when unparseable
    pub fn normalize(&self, raw: &str) -> Option<DateTime<Utc>> {
        let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
            return Some(dt.with_timezone(&Utc));
        }

        let cleaned = collapse_separators(strip_zone_name(trimmed));
        let with_offset = utc_suffix_as_offset(&cleaned);
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(&with_offset, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&cleaned, fmt).ok())
            .and_then(|naive| self.offset.from_local_datetime(&naive).single())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl Default for TimestampNormalizer {
    fn default() -> Self {
        Self {
            offset: FixedOffset::east_opt(DEFAULT_SOURCE_OFFSET_MINUTES * 60)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

/// Normalize `raw` assuming naive strings are at `assumed_offset_minutes`
pub fn normalize(raw: &str, assumed_offset_minutes: i32) -> Option<DateTime<Utc>> {
    TimestampNormalizer::new(assumed_offset_minutes).and_then(|n| n.normalize(raw))
}

/// Age of `instant` relative to `now` in milliseconds.
///
/// Unknown instants are infinitely old so every freshness check fails closed.
pub fn age_millis(instant: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match instant {
        Some(ts) => (now - ts).num_milliseconds() as f64,
        None => f64::INFINITY,
    }
}

/// Whether `instant` is no older than `threshold` at `now`
pub fn is_fresh(instant: Option<DateTime<Utc>>, now: DateTime<Utc>, threshold: Duration) -> bool {
    age_millis(instant, now) <= threshold.as_millis() as f64
}

/// Drop a trailing parenthesized zone name, as in `GMT+0530 (India Standard Time)`
fn strip_zone_name(s: &str) -> &str {
    match (s.ends_with(')'), s.rfind('(')) {
        (true, Some(open)) => s[..open].trim_end(),
        _ => s,
    }
}

/// Treat commas as date/time separators and collapse whitespace runs
fn collapse_separators(s: &str) -> String {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rewrite a trailing `Z`, `UTC` or `GMT` designator as `+00:00`
fn utc_suffix_as_offset(s: &str) -> String {
    for suffix in [" UTC", " GMT", "Z", "z"] {
        if let Some(stripped) = s.strip_suffix(suffix) {
            return format!("{} +00:00", stripped.trim_end());
        }
    }
    s.to_string()
}

//! Incident History
//!
//! Parses the master incident log appended by the onboard analytics and
//! derives the driver safety score:
//! - Severity-weighted penalties over a lookback window (48h by default)
//! - Most recent in-window incidents for display
//! - Monthly and all-time incident counts

mod analyzer;
mod incident;

pub use analyzer::{HistoryAnalyzer, HistorySummary, ScoringConfig};
pub use incident::{parse_incidents, Incident, Severity};

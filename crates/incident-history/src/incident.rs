//! Incident records and log parsing

use chrono::{DateTime, Utc};
use sensor_extract::TimestampNormalizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Incident severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Parse a severity label, case-insensitive
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        })
    }
}

/// One row of the master incident log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// 1-based position among the log's data rows
    pub id: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub location: String,
    pub description: String,
    pub time: DateTime<Utc>,
}

/// Parse `datetime,type,severity,location,description` rows.
///
/// A leading row whose datetime does not parse is a header. Any later row
/// whose datetime does not parse is dropped, never defaulted.
pub fn parse_incidents(raw: &str, normalizer: &TimestampNormalizer) -> Vec<Incident> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let mut incidents = Vec::new();
    let mut header_rows = 0;

    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!(row = index, error = %e, "Skipping unreadable incident row");
                continue;
            }
        };

        let time = match record.get(0).and_then(|raw| normalizer.normalize(raw)) {
            Some(time) => time,
            None => {
                if index == 0 {
                    header_rows = 1;
                } else {
                    debug!(row = index, "Dropping incident with unparseable time");
                }
                continue;
            }
        };

        let field = |i: usize| record.get(i).unwrap_or_default().trim().to_string();
        let severity_label = field(2);
        let severity = Severity::parse(&severity_label).unwrap_or_else(|| {
            debug!(row = index, severity = %severity_label, "Unknown severity, treating as Low");
            Severity::Low
        });
        let description = record
            .iter()
            .skip(4)
            .collect::<Vec<_>>()
            .join(",")
            .trim()
            .to_string();

        incidents.push(Incident {
            id: index + 1 - header_rows,
            kind: field(1),
            severity,
            location: field(3),
            description,
            time,
        });
    }

    incidents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_header() {
        let raw = "datetime,fault_type,severity,location,description\n\
                   2025-06-01 14:30:00,Harsh Braking,High,Ring Road,Decel 0.6g\n\
                   2025-06-01 15:00:00,Overspeed,medium,NH48,92 km/h\n";
        let incidents = parse_incidents(raw, &TimestampNormalizer::default());

        assert_eq!(incidents.len(), 2);
        assert_eq!(incidents[0].id, 1);
        assert_eq!(incidents[0].kind, "Harsh Braking");
        assert_eq!(incidents[0].severity, Severity::High);
        assert_eq!(incidents[0].time.to_rfc3339(), "2025-06-01T09:00:00+00:00");
        assert_eq!(incidents[1].id, 2);
        assert_eq!(incidents[1].severity, Severity::Medium);
    }

    #[test]
    fn test_parse_without_header() {
        let raw = "2025-06-01 14:30:00,Overspeed,Low,NH48,ok\n";
        let incidents = parse_incidents(raw, &TimestampNormalizer::default());
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].id, 1);
    }

    #[test]
    fn test_malformed_rows_are_dropped() {
        let raw = "datetime,fault_type,severity,location,description\n\
                   yesterday-ish,Overspeed,High,NH48,bad date\n\
                   2025-06-01 14:30:00,Overspeed,High,NH48,good\n";
        let incidents = parse_incidents(raw, &TimestampNormalizer::default());
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].description, "good");
        assert_eq!(incidents[0].id, 2);
    }

    #[test]
    fn test_short_rows_and_unquoted_commas() {
        let raw = "2025-06-01 14:30:00,Lane Drift,Severe\n\
                   2025-06-01 14:31:00,Overspeed,High,NH48,92 km/h, zone 60\n";
        let incidents = parse_incidents(raw, &TimestampNormalizer::default());

        assert_eq!(incidents.len(), 2);
        assert_eq!(incidents[0].severity, Severity::Low);
        assert_eq!(incidents[0].location, "");
        assert_eq!(incidents[1].description, "92 km/h, zone 60");
    }

    #[test]
    fn test_description_keeps_original_commas() {
        let raw = "2025-06-01 14:30:00 , Engine , High , Depot , Speed 1,200 rpm \n";
        let incident = &parse_incidents(raw, &TimestampNormalizer::default())[0];

        assert_eq!(incident.kind, "Engine");
        assert_eq!(incident.severity, Severity::High);
        assert_eq!(incident.location, "Depot");
        assert_eq!(incident.description, "Speed 1,200 rpm");
    }

    #[test]
    fn test_severity_ordering_and_display() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::parse(" HIGH "), Some(Severity::High));
        assert_eq!(Severity::parse("critical"), None);
        assert_eq!(Severity::Medium.to_string(), "Medium");
    }

    #[test]
    fn test_incident_json_uses_type_field() {
        let raw = "2025-06-01 14:30:00,Overspeed,High,NH48,92 km/h\n";
        let incident = &parse_incidents(raw, &TimestampNormalizer::default())[0];
        let json = serde_json::to_value(incident).unwrap();
        assert_eq!(json["type"], "Overspeed");
        assert_eq!(json["severity"], "High");
    }
}

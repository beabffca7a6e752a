//! Dashboard Aggregation
//!
//! Correlates every onboard data source into one snapshot per request:
//! - Alcohol, visibility, drowsiness and OBD/GPS readings
//! - Incident history and driver safety score
//! - Live alerts from fresh readings
//!
//! Sources are fetched concurrently and independently; a failing source
//! degrades to its fallback without affecting the others.

mod aggregator;
mod config;
mod error;
mod snapshot;

pub use aggregator::Aggregator;
pub use config::{AggregatorConfig, FreshnessPolicy, LogPaths};
pub use error::AggregateError;
pub use snapshot::{ActiveIncident, DashboardSnapshot, IncidentSource, SensorStatus, SensorsStatus};

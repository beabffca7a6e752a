//! Alerting System
//!
//! Evaluates fixed safety rules against the latest sensor readings. Only
//! fresh readings can raise an alert; stale or unknown data never does.

mod rules;

pub use rules::{AlertConfig, AlertKind, AlertRules, LiveAlert, LiveReadings};

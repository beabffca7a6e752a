//! Range Validation for Parsed Sensor Values

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Speed valid range (km/h)
    pub speed_range: (f64, f64),
    /// Latitude valid range (degrees)
    pub latitude_range: (f64, f64),
    /// Longitude valid range (degrees)
    pub longitude_range: (f64, f64),
    /// Visibility score valid range (%)
    pub visibility_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            speed_range: (0.0, 300.0),
            latitude_range: (-90.0, 90.0),
            longitude_range: (-180.0, 180.0),
            visibility_range: (0.0, 100.0),
        }
    }
}

/// Range validator for parsed sensor fields
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<f64, ExtractError> {
        if !value.is_finite() || value < range.0 || value > range.1 {
            Err(ExtractError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(value)
        }
    }

    /// Validate speed
    pub fn validate_speed(&self, speed: f64) -> Result<f64, ExtractError> {
        self.validate_range("speed", speed, self.config.speed_range)
    }

    /// Validate latitude
    pub fn validate_latitude(&self, lat: f64) -> Result<f64, ExtractError> {
        self.validate_range("latitude", lat, self.config.latitude_range)
    }

    /// Validate longitude
    pub fn validate_longitude(&self, lng: f64) -> Result<f64, ExtractError> {
        self.validate_range("longitude", lng, self.config.longitude_range)
    }

    /// Validate visibility score
    pub fn validate_visibility(&self, score: f64) -> Result<f64, ExtractError> {
        self.validate_range("visibility", score, self.config.visibility_range)
    }
}

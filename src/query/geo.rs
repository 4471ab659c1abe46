//! Geographical points for location-based clauses.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ValidationResult;
use crate::validation::validate_geo_point;

/// A geographical point with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
    /// Longitude in degrees (-180 to 180)
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new geographical point.
    pub fn new(lat: f64, lon: f64) -> ValidationResult<Self> {
        validate_geo_point(lat, lon, "geo_point")?;
        Ok(GeoPoint { lat, lon })
    }

    /// Re-check a point that may have been built from its public fields.
    pub fn validate(&self, context: &str) -> ValidationResult<()> {
        validate_geo_point(self.lat, self.lon, context)
    }

    /// The `{lat, lon}` object form understood by the backend.
    pub fn to_value(&self) -> Value {
        json!({ "lat": self.lat, "lon": self.lon })
    }
}

//! Client identifiers and coordinate payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use beacon_core::error::AppError;

/// Client identifier taken from the `/ws/{client_id}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(i64);

impl ClientId {
    /// Wraps a raw identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for ClientId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reported position, exactly as it is relayed to viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coordinate(String);

impl Coordinate {
    /// Accepts any payload text as an opaque coordinate.
    pub fn opaque(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Accepts payload text only if it parses as a valid [`GeoPoint`].
    pub fn strict(text: &str) -> Result<Self, AppError> {
        GeoPoint::parse(text)?;
        Ok(Self(text.to_string()))
    }

    /// Returns the payload text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured latitude/longitude pair.
///
/// Missing fields default to `0`, matching the coordinate echo endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    /// Longitude in decimal degrees.
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl GeoPoint {
    /// Parses `"lat,lng"` text or a JSON `{"latitude":..,"longitude":..}`
    /// object and checks both values are finite and in range.
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let text = text.trim();
        let point = if text.starts_with('{') {
            serde_json::from_str::<GeoPoint>(text)
                .map_err(|e| AppError::validation(format!("Invalid coordinate object: {e}")))?
        } else {
            let (lat, lng) = text
                .split_once(',')
                .ok_or_else(|| AppError::validation("Coordinate must be \"latitude,longitude\""))?;
            GeoPoint {
                latitude: parse_degrees(lat, "latitude")?,
                longitude: parse_degrees(lng, "longitude")?,
            }
        };
        point.check()?;
        Ok(point)
    }

    /// Validates ranges.
    pub fn check(&self) -> Result<(), AppError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(AppError::validation("Coordinate values must be finite"));
        }
        self.validate()
            .map_err(|e| AppError::validation(format!("Coordinate out of range: {e}")))
    }
}

fn parse_degrees(raw: &str, field: &str) -> Result<f64, AppError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| AppError::validation(format!("Invalid {field}: {:?}", raw.trim())))
}

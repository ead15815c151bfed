use serde::{Deserialize, Serialize};

/// WGS84 point. Longitude is `lng` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Reject points outside the valid latitude and longitude ranges (NaN included).
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoordinateError::Latitude(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoordinateError::Longitude(self.lng));
        }
        Ok(())
    }

    /// Whether both axes are within `tolerance` degrees of `other`.
    pub fn is_near(&self, other: &Coordinates, tolerance: f64) -> bool {
        (self.lat - other.lat).abs() < tolerance && (self.lng - other.lng).abs() < tolerance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("invalid latitude: {0}. Must be between -90 and 90.")]
    Latitude(f64),
    #[error("invalid longitude: {0}. Must be between -180 and 180.")]
    Longitude(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeographicBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeographicBounds {
    /// Inclusive on every edge.
    pub fn contains(&self, point: &Coordinates) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }
}

pub const PHILIPPINE_BOUNDS: GeographicBounds = GeographicBounds {
    north: 21.2,
    south: 4.5,
    east: 127.0,
    west: 116.0,
};

pub fn is_within_philippines(point: &Coordinates) -> bool {
    PHILIPPINE_BOUNDS.contains(point)
}

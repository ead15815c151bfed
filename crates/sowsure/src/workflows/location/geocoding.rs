use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::bounds::{Coordinates, GeographicBounds, PHILIPPINE_BOUNDS};
use crate::integrations::{CollaboratorError, Geocoder};

const MIN_ADDRESS_CHARS: usize = 3;
const MAX_ADDRESS_CHARS: usize = 200;

/// Ranked geocoding hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    pub coordinates: Coordinates,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address cannot be empty")]
    Empty,
    #[error("address must be at least 3 characters long")]
    TooShort,
    #[error("address cannot exceed 200 characters")]
    TooLong,
    #[error("address must contain some letters (not just numbers and punctuation)")]
    NoLetters,
}

/// Check a free-text address and return it trimmed.
pub fn validate_address(raw: &str) -> Result<&str, AddressError> {
    let trimmed = raw.trim();
    let length = trimmed.chars().count();

    if length == 0 {
        Err(AddressError::Empty)
    } else if length < MIN_ADDRESS_CHARS {
        Err(AddressError::TooShort)
    } else if length > MAX_ADDRESS_CHARS {
        Err(AddressError::TooLong)
    } else if !trimmed.chars().any(char::is_alphabetic) {
        Err(AddressError::NoLetters)
    } else {
        Ok(trimmed)
    }
}

struct GazetteerEntry {
    city: &'static str,
    display_name: &'static str,
    lat: f64,
    lng: f64,
}

const GAZETTEER: [GazetteerEntry; 8] = [
    GazetteerEntry {
        city: "Manila",
        display_name: "Manila, Metro Manila, Philippines",
        lat: 14.5995,
        lng: 120.9842,
    },
    GazetteerEntry {
        city: "Quezon City",
        display_name: "Quezon City, Metro Manila, Philippines",
        lat: 14.6760,
        lng: 121.0437,
    },
    GazetteerEntry {
        city: "Cebu City",
        display_name: "Cebu City, Cebu, Philippines",
        lat: 10.3157,
        lng: 123.8854,
    },
    GazetteerEntry {
        city: "Davao City",
        display_name: "Davao City, Davao del Sur, Philippines",
        lat: 7.0731,
        lng: 125.6128,
    },
    GazetteerEntry {
        city: "Cabanatuan",
        display_name: "Cabanatuan, Nueva Ecija, Philippines",
        lat: 15.4858,
        lng: 120.9658,
    },
    GazetteerEntry {
        city: "Makati",
        display_name: "Makati, Metro Manila, Philippines",
        lat: 14.5547,
        lng: 121.0244,
    },
    GazetteerEntry {
        city: "Taguig",
        display_name: "Taguig, Metro Manila, Philippines",
        lat: 14.5176,
        lng: 121.0509,
    },
    GazetteerEntry {
        city: "Pasig",
        display_name: "Pasig, Metro Manila, Philippines",
        lat: 14.5764,
        lng: 121.0851,
    },
];

/// Offline matches for well-known cities, by case-insensitive substring.
pub fn gazetteer_matches(query: &str) -> Vec<GeocodeCandidate> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    GAZETTEER
        .iter()
        .filter(|entry| {
            entry.display_name.to_lowercase().contains(&needle)
                || entry.city.to_lowercase().contains(&needle)
        })
        .map(|entry| GeocodeCandidate {
            coordinates: Coordinates::new(entry.lat, entry.lng),
            display_name: entry.display_name.to_string(),
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("address validation failed: {0}")]
    InvalidAddress(#[from] AddressError),
    #[error("no locations found for '{0}'")]
    NoResults(String),
    #[error("location '{0}' appears to be outside the Philippines")]
    OutsidePhilippines(String),
    #[error("geocoding failed: {0}")]
    Geocoder(#[from] CollaboratorError),
}

/// Turns free-text addresses into in-bounds candidates, consulting the gazetteer first.
#[derive(Clone)]
pub struct LocationResolver {
    geocoder: Option<Arc<dyn Geocoder>>,
    bounds: GeographicBounds,
}

impl LocationResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            geocoder: Some(geocoder),
            bounds: PHILIPPINE_BOUNDS,
        }
    }

    /// Resolver that only knows the built-in gazetteer.
    pub fn offline() -> Self {
        Self {
            geocoder: None,
            bounds: PHILIPPINE_BOUNDS,
        }
    }

    pub async fn resolve(&self, query: &str) -> Result<Vec<GeocodeCandidate>, LocationError> {
        let address = validate_address(query)?;

        let offline = gazetteer_matches(address);
        if !offline.is_empty() {
            debug!(query = address, matches = offline.len(), "resolved from gazetteer");
            return Ok(offline);
        }

        let Some(geocoder) = &self.geocoder else {
            return Err(LocationError::NoResults(address.to_string()));
        };

        let candidates = geocoder.search(address).await.map_err(|error| {
            warn!(query = address, error = %error, "geocoder request failed");
            LocationError::Geocoder(error)
        })?;

        let Some(first) = candidates.first() else {
            return Err(LocationError::NoResults(address.to_string()));
        };
        let first_name = first.display_name.clone();

        let in_bounds: Vec<_> = candidates
            .into_iter()
            .filter(|candidate| self.bounds.contains(&candidate.coordinates))
            .collect();

        if in_bounds.is_empty() {
            return Err(LocationError::OutsidePhilippines(first_name));
        }

        info!(query = address, matches = in_bounds.len(), "resolved address");
        Ok(in_bounds)
    }
}

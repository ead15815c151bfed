//! Address validation, geocoding, Philippine bounds and saved favorite locations.

pub mod bounds;
pub mod favorites;
pub mod geocoding;

pub use bounds::{
    is_within_philippines, CoordinateError, Coordinates, GeographicBounds, PHILIPPINE_BOUNDS,
};
pub use favorites::{FavoriteLocation, FavoritesError, FavoritesStore};
pub use geocoding::{
    gazetteer_matches, validate_address, AddressError, GeocodeCandidate, LocationError,
    LocationResolver,
};

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{CollaboratorError, Geocoder};
use crate::workflows::location::{Coordinates, GeocodeCandidate};

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const USER_AGENT: &str = "sowsure/0.1 (farmer loan risk assessment)";
const RESULT_LIMIT: &str = "5";

/// OpenStreetMap Nominatim search restricted to the Philippines.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, CollaboratorError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("format", "json"),
                ("q", query),
                ("limit", RESULT_LIMIT),
                ("countrycodes", "ph"),
                ("addressdetails", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status {
                service: "geocoder",
                status: status.as_u16(),
            });
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        let candidates = places
            .into_iter()
            .filter_map(|place| {
                let lat = place.lat.trim().parse::<f64>().ok();
                let lng = place.lon.trim().parse::<f64>().ok();
                match (lat, lng) {
                    (Some(lat), Some(lng)) => Some(GeocodeCandidate {
                        coordinates: Coordinates::new(lat, lng),
                        display_name: place.display_name,
                    }),
                    _ => {
                        debug!(place = %place.display_name, "skipping place with unparsable coordinates");
                        None
                    }
                }
            })
            .collect();

        Ok(candidates)
    }
}

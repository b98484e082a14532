use crate::config::GeocoderConfig;
use crate::constants::GEOCODER_USER_AGENT;
use crate::error::{PlannerError, Result};
use crate::models::Coordinates;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Address lookup in both directions.
///
/// `forward` is allowed to fail loudly (the user typed an address and
/// deserves to know it was not found). `reverse` is cosmetic and never
/// fails: implementations fall back to a coordinate-derived label.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-text address to coordinates and a display label.
    async fn forward(&self, query: &str) -> Result<GeocodedPlace>;

    /// Resolve coordinates to a human-readable label, best effort.
    async fn reverse(&self, coords: &Coordinates) -> String;
}

#[derive(Debug, Clone)]
pub struct GeocodedPlace {
    pub coords: Coordinates,
    pub display_name: String,
}

/// Client for a Nominatim-compatible geocoding API.
#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Self {
        NominatimClient {
            client: Client::new(),
            base_url: config.base_url.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, GEOCODER_USER_AGENT)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| PlannerError::Geocoding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PlannerError::Geocoding(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PlannerError::Geocoding(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn forward(&self, query: &str) -> Result<GeocodedPlace> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(query)
        );

        tracing::debug!("Geocoding address: {}", query);

        let places: Vec<NominatimPlace> = self.get_json(&url).await?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| PlannerError::AddressNotFound(query.to_string()))?;

        place.into_geocoded(query)
    }

    async fn reverse(&self, coords: &Coordinates) -> String {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json",
            self.base_url, coords.lat, coords.lng
        );

        let looked_up: Result<NominatimReverse> = self.get_json(&url).await;
        match looked_up {
            Ok(NominatimReverse {
                display_name: Some(name),
            }) => name,
            Ok(_) => coords.fallback_label(),
            Err(e) => {
                tracing::debug!("Reverse geocoding failed ({}), using coordinates", e);
                coords.fallback_label()
            }
        }
    }
}

// Nominatim API response types. Coordinates come back as JSON strings.

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimPlace {
    fn into_geocoded(self, query: &str) -> Result<GeocodedPlace> {
        let lat: f64 = self
            .lat
            .parse()
            .map_err(|_| PlannerError::Geocoding(format!("Bad latitude: {}", self.lat)))?;
        let lon: f64 = self
            .lon
            .parse()
            .map_err(|_| PlannerError::Geocoding(format!("Bad longitude: {}", self.lon)))?;

        let coords = Coordinates::new(lat, lon)
            .map_err(|_| PlannerError::AddressNotFound(query.to_string()))?;

        Ok(GeocodedPlace {
            coords,
            display_name: self.display_name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    display_name: Option<String>,
}

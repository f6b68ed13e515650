use async_trait::async_trait;
use serde::Deserialize;

use super::{query_string, GeocodeError, Geocoder};
use crate::types::Coordinates;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// Google Maps Geocoding API.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GoogleGeocoder {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

fn first_location(resp: GeocodeResponse) -> Result<Coordinates, GeocodeError> {
    match resp.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Err(GeocodeError::NoResults),
        other => {
            let detail = resp.error_message.unwrap_or_default();
            return Err(GeocodeError::Service(format!("{other} {detail}").trim().to_string()));
        }
    }
    resp.results
        .into_iter()
        .next()
        .map(|r| Coordinates::new(r.geometry.location.lat, r.geometry.location.lng))
        .ok_or(GeocodeError::NoResults)
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, city: &str, country: &str) -> Result<Coordinates, GeocodeError> {
        let url = format!(
            "{}/maps/api/geocode/json",
            self.base_url.trim_end_matches('/')
        );
        let address = query_string(city, country);
        let resp = self
            .client
            .get(&url)
            .query(&[("address", address.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GeocodeError::Service(format!("HTTP {}", resp.status())));
        }

        let body: GeocodeResponse = resp.json().await?;
        first_location(body)
    }
}

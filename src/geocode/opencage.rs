use async_trait::async_trait;
use serde::Deserialize;

use super::{query_string, GeocodeError, Geocoder};
use crate::types::Coordinates;

pub const DEFAULT_BASE_URL: &str = "https://api.opencagedata.com";

/// OpenCage forward geocoding.
pub struct OpenCageGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct OpenCageResponse {
    #[serde(default)]
    status: Option<OpenCageStatus>,
    #[serde(default)]
    results: Vec<OpenCageResult>,
}

#[derive(Debug, Deserialize)]
struct OpenCageStatus {
    code: u16,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct OpenCageResult {
    geometry: OpenCageGeometry,
}

#[derive(Debug, Deserialize)]
struct OpenCageGeometry {
    lat: f64,
    lng: f64,
}

impl OpenCageGeocoder {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

fn first_location(resp: OpenCageResponse) -> Result<Coordinates, GeocodeError> {
    if let Some(status) = resp.status {
        if status.code != 200 {
            return Err(GeocodeError::Service(format!(
                "{} {}",
                status.code, status.message
            )));
        }
    }
    resp.results
        .into_iter()
        .next()
        .map(|r| Coordinates::new(r.geometry.lat, r.geometry.lng))
        .ok_or(GeocodeError::NoResults)
}

#[async_trait]
impl Geocoder for OpenCageGeocoder {
    async fn geocode(&self, city: &str, country: &str) -> Result<Coordinates, GeocodeError> {
        let url = format!("{}/geocode/v1/json", self.base_url.trim_end_matches('/'));
        let q = query_string(city, country);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("q", q.as_str()),
                ("key", self.api_key.as_str()),
                ("limit", "1"),
                ("no_annotations", "1"),
            ])
            .send()
            .await?;

        // Error bodies still carry a status object; prefer its message.
        let http_status = resp.status();
        match resp.json::<OpenCageResponse>().await {
            Ok(body) => first_location(body),
            Err(_) if !http_status.is_success() => {
                Err(GeocodeError::Service(format!("HTTP {http_status}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

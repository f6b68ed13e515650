pub mod google;
pub mod opencage;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{GeocodingConfig, GeocodingProvider};
use crate::types::Coordinates;

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding timed out")]
    Timeout,

    #[error("geocoding request failed: {0}")]
    Request(String),

    #[error("geocoding service error: {0}")]
    Service(String),

    #[error("no results")]
    NoResults,
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeocodeError::Timeout
        } else {
            GeocodeError::Request(e.to_string())
        }
    }
}

/// Forward geocoding of a `"{city}, {country}"` query.
#[async_trait]
pub trait Geocoder: Send + Sync + 'static {
    async fn geocode(&self, city: &str, country: &str) -> Result<Coordinates, GeocodeError>;
}

pub(crate) fn query_string(city: &str, country: &str) -> String {
    if city.is_empty() {
        country.to_string()
    } else {
        format!("{city}, {country}")
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to build geocoding client, using defaults");
            reqwest::Client::new()
        })
}

/// Build the configured provider.
pub fn from_config(config: &GeocodingConfig) -> Arc<dyn Geocoder> {
    let client = http_client(config.timeout_secs);
    match config.provider {
        GeocodingProvider::Google => {
            let base = config
                .base_url
                .clone()
                .unwrap_or_else(|| google::DEFAULT_BASE_URL.to_string());
            Arc::new(google::GoogleGeocoder::new(client, base, config.api_key.clone()))
        }
        GeocodingProvider::Opencage => {
            let base = config
                .base_url
                .clone()
                .unwrap_or_else(|| opencage::DEFAULT_BASE_URL.to_string());
            Arc::new(opencage::OpenCageGeocoder::new(client, base, config.api_key.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string() {
        assert_eq!(query_string("Tokyo", "Japan"), "Tokyo, Japan");
        assert_eq!(query_string("", "Japan"), "Japan");
    }
}

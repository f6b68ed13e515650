use std::sync::Arc;

use crate::cache::TtlCache;
use crate::config::{GeocodingConfig, ResolverConfig, ResolverStrategy};
use crate::coordinates::{CoordinateError, CountryCoordinates};
use crate::geocode::{self, Geocoder};
use crate::types::{AnalyticsRow, Coordinates};

/// Geocode cache key, e.g. `"Tokyo,Japan"`.
pub fn location_key(city: &str, country: &str) -> String {
    format!("{city},{country}")
}

/// Outcome of resolving one row. Both failure kinds serialize as nulls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Found(Coordinates),
    LookupMiss,
    GeocodeFailed,
}

impl Resolution {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Resolution::Found(c) => Some(*c),
            Resolution::LookupMiss | Resolution::GeocodeFailed => None,
        }
    }
}

/// Turns an analytics row into coordinates.
pub enum LocationResolver {
    /// Country centroid from the preloaded table.
    Static(Arc<CountryCoordinates>),
    /// City-level geocoding, cache-aside. Only successes are cached.
    Geocoding {
        geocoder: Arc<dyn Geocoder>,
        cache: TtlCache<Coordinates>,
    },
}

impl LocationResolver {
    pub fn from_config(
        resolver: &ResolverConfig,
        geocoding: &GeocodingConfig,
    ) -> Result<Self, CoordinateError> {
        match resolver.strategy {
            ResolverStrategy::Static => {
                let table = match &resolver.coordinates_path {
                    Some(path) => CountryCoordinates::from_path(path)?,
                    None => CountryCoordinates::bundled()?,
                };
                Ok(LocationResolver::Static(Arc::new(table)))
            }
            ResolverStrategy::Geocoding => Ok(LocationResolver::Geocoding {
                geocoder: geocode::from_config(geocoding),
                cache: TtlCache::with_ttl_secs(geocoding.cache_ttl_secs),
            }),
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        match self {
            LocationResolver::Static(_) => "static",
            LocationResolver::Geocoding { .. } => "geocoding",
        }
    }

    pub async fn resolve(&self, row: &AnalyticsRow) -> Resolution {
        match self {
            LocationResolver::Static(table) => match table.lookup(&row.country) {
                Some(coords) => Resolution::Found(coords),
                None => {
                    tracing::warn!(
                        country = %row.country,
                        reason = "lookup_miss",
                        "coordinates not found"
                    );
                    Resolution::LookupMiss
                }
            },
            LocationResolver::Geocoding { geocoder, cache } => {
                let city = row.city.as_deref().unwrap_or("");
                let key = location_key(city, &row.country);
                if let Some(coords) = cache.get(&key) {
                    tracing::debug!(key = %key, "geocode cache hit");
                    return Resolution::Found(coords);
                }

                match geocoder.geocode(city, &row.country).await {
                    Ok(coords) => {
                        cache.set(key, coords);
                        Resolution::Found(coords)
                    }
                    Err(e) => {
                        tracing::warn!(
                            city = %city,
                            country = %row.country,
                            reason = "geocode_failed",
                            error = %e,
                            "coordinates not found"
                        );
                        Resolution::GeocodeFailed
                    }
                }
            }
        }
    }
}

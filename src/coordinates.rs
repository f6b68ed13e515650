use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::types::Coordinates;

#[derive(Debug, thiserror::Error)]
pub enum CoordinateError {
    #[error("failed to read coordinate file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse coordinate file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Deserialization type for the reference file's top level.
#[derive(Debug, Deserialize)]
struct ReferenceFile {
    ref_country_codes: Vec<ReferenceEntry>,
}

#[derive(Debug, Deserialize)]
struct ReferenceEntry {
    country: String,
    latitude: f64,
    longitude: f64,
}

/// Immutable country name -> centroid table, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct CountryCoordinates {
    by_country: HashMap<String, Coordinates>,
}

impl CountryCoordinates {
    /// Table compiled into the binary from `data/country_coordinates.json`.
    pub fn bundled() -> Result<Self, CoordinateError> {
        let bundled = include_bytes!("../data/country_coordinates.json");
        let table = Self::from_json(bundled)?;
        tracing::info!(countries = table.len(), "loaded bundled country coordinates");
        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<Self, CoordinateError> {
        let data = std::fs::read(path)?;
        let table = Self::from_json(&data)?;
        tracing::info!(
            countries = table.len(),
            path = %path.display(),
            "loaded country coordinates"
        );
        Ok(table)
    }

    /// Parse a `{"ref_country_codes": [...]}` document.
    pub fn from_json(data: &[u8]) -> Result<Self, CoordinateError> {
        let file: ReferenceFile = serde_json::from_slice(data)?;
        let mut by_country = HashMap::with_capacity(file.ref_country_codes.len());
        for entry in file.ref_country_codes {
            let coords = Coordinates::new(entry.latitude, entry.longitude);
            if by_country.insert(entry.country.clone(), coords).is_some() {
                tracing::warn!(country = %entry.country, "duplicate country in coordinate table");
            }
        }
        Ok(Self { by_country })
    }

    pub fn lookup(&self, country: &str) -> Option<Coordinates> {
        self.by_country.get(country).copied()
    }

    pub fn len(&self) -> usize {
        self.by_country.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_country.is_empty()
    }
}

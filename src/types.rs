use serde::{Deserialize, Serialize};

/// Report dimension requested from the analytics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Country,
    City,
}

impl Dimension {
    /// Name understood by the reporting API.
    pub fn api_name(&self) -> &'static str {
        match self {
            Dimension::Country => "country",
            Dimension::City => "city",
        }
    }
}

/// One bucket of a realtime report.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsRow {
    pub country: String,
    pub city: Option<String>,
    /// Metric value exactly as the backend reported it (a decimal string).
    pub active_users: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A single entry of the `/realtime` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub active_users: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ResponseRecord {
    pub fn from_row(row: AnalyticsRow, location: Option<Coordinates>) -> Self {
        Self {
            country: row.country,
            city: row.city,
            active_users: row.active_users,
            latitude: location.map(|c| c.latitude),
            longitude: location.map(|c| c.longitude),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub resolver: String,
}

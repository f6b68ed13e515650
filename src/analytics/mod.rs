pub mod client;
pub mod retry;

use async_trait::async_trait;

use crate::config::AnalyticsConfig;
use crate::error::FetchError;
use crate::types::{AnalyticsRow, Dimension};

pub const ACTIVE_USERS_METRIC: &str = "activeUsers";

/// Parameters of one realtime report call.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeRequest {
    pub property_id: String,
    /// Always starts with [`Dimension::Country`].
    pub dimensions: Vec<Dimension>,
    pub metric: &'static str,
    /// Report the last `n` minutes, ending now.
    pub minute_window: Option<u32>,
}

impl RealtimeRequest {
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        let mut dimensions = vec![Dimension::Country];
        if config.dimensions.contains(&Dimension::City) {
            dimensions.push(Dimension::City);
        }
        Self {
            property_id: config.property_id.clone(),
            dimensions,
            metric: ACTIVE_USERS_METRIC,
            minute_window: config.minute_window,
        }
    }

    pub fn includes_city(&self) -> bool {
        self.dimensions.contains(&Dimension::City)
    }
}

/// Source of realtime active-user rows.
#[async_trait]
pub trait AnalyticsClient: Send + Sync + 'static {
    /// Rows come back in backend order, one per dimension bucket.
    async fn fetch_realtime_users(
        &self,
        request: &RealtimeRequest,
    ) -> Result<Vec<AnalyticsRow>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dimensions: Vec<Dimension>) -> AnalyticsConfig {
        AnalyticsConfig {
            property_id: "159643920".to_string(),
            dimensions,
            minute_window: Some(29),
            base_url: "http://localhost".to_string(),
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_country_is_always_first() {
        let request = RealtimeRequest::from_config(&config(vec![Dimension::City, Dimension::Country]));
        assert_eq!(request.dimensions, vec![Dimension::Country, Dimension::City]);
        assert!(request.includes_city());
        assert_eq!(request.minute_window, Some(29));
    }

    #[test]
    fn test_country_only_variant() {
        let request = RealtimeRequest::from_config(&config(vec![Dimension::Country]));
        assert_eq!(request.dimensions, vec![Dimension::Country]);
        assert!(!request.includes_city());
        assert_eq!(request.metric, "activeUsers");
    }
}

pub mod assembler;
pub mod handler;

use std::sync::Arc;

use crate::analytics::retry::RetryPolicy;
use crate::analytics::{AnalyticsClient, RealtimeRequest};
use crate::cache::ResponseCache;
use crate::config::AppConfig;
use crate::coordinates::CoordinateError;
use crate::error::FetchError;
use crate::resolve::LocationResolver;
use crate::types::ResponseRecord;

/// Cache key for the whole `/realtime` body.
pub const REALTIME_CACHE_KEY: &str = "/realtime";

/// Shared state behind `/realtime` and `/health`.
pub struct RealtimeState {
    pub analytics: Arc<dyn AnalyticsClient>,
    pub request: RealtimeRequest,
    pub retry: RetryPolicy,
    pub resolver: LocationResolver,
    pub response_cache: ResponseCache,
}

impl RealtimeState {
    pub fn from_config(
        config: &AppConfig,
        analytics: Arc<dyn AnalyticsClient>,
    ) -> Result<Self, CoordinateError> {
        Ok(Self {
            analytics,
            request: RealtimeRequest::from_config(&config.analytics),
            retry: RetryPolicy::from_config(&config.retry),
            resolver: LocationResolver::from_config(&config.resolver, &config.geocoding)?,
            response_cache: ResponseCache::with_ttl_secs(config.cache.response_ttl_secs),
        })
    }

    /// Fetch rows (retrying on quota) and attach coordinates.
    pub async fn snapshot(&self) -> Result<Vec<ResponseRecord>, FetchError> {
        let rows = self
            .retry
            .run(|| self.analytics.fetch_realtime_users(&self.request))
            .await?;
        Ok(assembler::assemble(rows, &self.resolver).await)
    }
}

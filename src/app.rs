use axum::http::Method;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::RateLimitConfig;
use crate::pages;
use crate::realtime::handler;
use crate::realtime::RealtimeState;

/// Assemble all routes.
///
/// The rate limiter keys on the client IP, so the router must be served
/// with `into_make_service_with_connect_info::<SocketAddr>()`. It only
/// covers `/realtime`; pages and unmatched paths never spend its tokens.
pub fn build_app(state: Arc<RealtimeState>, rate_limit: &RateLimitConfig) -> Router {
    // Pages poll from wherever they are embedded
    let realtime_cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::OPTIONS]);

    let mut realtime_route: Router<Arc<RealtimeState>> = Router::new()
        .route("/realtime", get(handler::realtime))
        .route_layer(realtime_cors);

    match GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(rate_limit.per_second)
        .burst_size(rate_limit.burst_size)
        .finish()
    {
        Some(governor_conf) => {
            realtime_route = realtime_route.route_layer(GovernorLayer::new(governor_conf));
        }
        None => {
            tracing::warn!(
                per_second = rate_limit.per_second,
                burst_size = rate_limit.burst_size,
                "invalid rate limit, serving /realtime without a limiter"
            );
        }
    }

    let page_routes = Router::new()
        .route("/", get(pages::world_map))
        .route("/world_map", get(pages::world_map))
        .route("/globe", get(pages::globe));

    Router::new()
        .merge(page_routes)
        .route("/health", get(handler::health))
        .merge(realtime_route)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::retry::RetryPolicy;
    use crate::analytics::{AnalyticsClient, RealtimeRequest, ACTIVE_USERS_METRIC};
    use crate::cache::ResponseCache;
    use crate::coordinates::CountryCoordinates;
    use crate::error::FetchError;
    use crate::resolve::LocationResolver;
    use crate::types::{AnalyticsRow, Dimension};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct Unreachable;

    #[async_trait]
    impl AnalyticsClient for Unreachable {
        async fn fetch_realtime_users(
            &self,
            _request: &RealtimeRequest,
        ) -> Result<Vec<AnalyticsRow>, FetchError> {
            Err(FetchError::Transient("unreachable".to_string()))
        }
    }

    fn app() -> Router {
        let state = RealtimeState {
            analytics: Arc::new(Unreachable),
            request: RealtimeRequest {
                property_id: "1".to_string(),
                dimensions: vec![Dimension::Country],
                metric: ACTIVE_USERS_METRIC,
                minute_window: None,
            },
            retry: RetryPolicy::default(),
            resolver: LocationResolver::Static(Arc::new(CountryCoordinates::default())),
            response_cache: ResponseCache::with_ttl_secs(120),
        };
        build_app(Arc::new(state), &RateLimitConfig::default())
    }

    async fn body_of(path: &str) -> (StatusCode, String) {
        let resp = app()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_root_and_world_map_are_the_same_page() {
        let (status, root) = body_of("/").await;
        assert_eq!(status, StatusCode::OK);
        let (_, world_map) = body_of("/world_map").await;
        assert_eq!(root, world_map);
    }

    #[tokio::test]
    async fn test_globe_embeds_two_frames() {
        let (status, globe) = body_of("/globe").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(globe.matches("<iframe").count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, _) = body_of("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

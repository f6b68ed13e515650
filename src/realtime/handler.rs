use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use super::{RealtimeState, REALTIME_CACHE_KEY};
use crate::error::{AppError, AppResult};
use crate::types::HealthResponse;

/// GET /realtime - Active users per location, cached as a whole body.
///
/// Quota exhaustion after retries becomes a 200 with an `error` field and
/// is never cached, so the next poll tries again. During sustained
/// exhaustion every poll that arrives after the previous cycle finished
/// runs a fresh full retry cycle against the backend.
pub async fn realtime(State(state): State<Arc<RealtimeState>>) -> AppResult<Response> {
    let body = state
        .response_cache
        .get_or_try_insert(REALTIME_CACHE_KEY, async {
            let records = state.snapshot().await?;
            let body = serde_json::to_string(&records)
                .map_err(|e| AppError::Internal(format!("serialize realtime response: {e}")))?;
            Ok::<_, AppError>(Arc::<str>::from(body))
        })
        .await
        .map_err(|e| (*e).clone())?;

    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response())
}

/// GET /health - Liveness only; does not touch the analytics backend.
pub async fn health(State(state): State<Arc<RealtimeState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        resolver: state.resolver.strategy_name().into(),
    })
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Message returned to clients once quota retries are exhausted.
pub const QUOTA_EXHAUSTED_MESSAGE: &str = "Quota exhausted. Please try again later.";

/// Failures of the upstream calls behind `/realtime`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("analytics quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("transient backend error: {0}")]
    Transient(String),
}

impl FetchError {
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, FetchError::QuotaExhausted(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transient(e.to_string())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Upstream(#[from] FetchError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // Degraded response: the page keeps polling, so this stays a 200.
            AppError::Upstream(FetchError::QuotaExhausted(e)) => {
                tracing::warn!(error = %e, "quota retries exhausted");
                (StatusCode::OK, QUOTA_EXHAUSTED_MESSAGE.to_string())
            }
            AppError::Upstream(FetchError::Auth(e)) => {
                tracing::error!(error = %e, "analytics authentication failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "analytics authentication failed".to_string(),
                )
            }
            AppError::Upstream(FetchError::Transient(e)) => {
                tracing::error!(error = %e, "analytics backend error");
                (
                    StatusCode::BAD_GATEWAY,
                    "analytics backend unavailable".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exhausted_is_ok_status() {
        let resp = AppError::from(FetchError::QuotaExhausted("429".into())).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_backend_errors_are_bad_gateway() {
        let resp = AppError::from(FetchError::Auth("denied".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let resp = AppError::from(FetchError::Transient("503".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_only_quota_is_retryable() {
        assert!(FetchError::QuotaExhausted(String::new()).is_quota_exhausted());
        assert!(!FetchError::Auth(String::new()).is_quota_exhausted());
        assert!(!FetchError::Transient(String::new()).is_quota_exhausted());
    }
}

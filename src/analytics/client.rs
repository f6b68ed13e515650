use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{AnalyticsClient, RealtimeRequest};
use crate::credentials::CredentialProvider;
use crate::error::FetchError;
use crate::types::{AnalyticsRow, Dimension};

/// GA4 Data API client for `runRealtimeReport`.
pub struct GaDataClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeReport {
    #[serde(default)]
    rows: Vec<ReportRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRow {
    #[serde(default)]
    dimension_values: Vec<ReportValue>,
    #[serde(default)]
    metric_values: Vec<ReportValue>,
}

#[derive(Debug, Deserialize)]
struct ReportValue {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GaDataClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            credentials,
        }
    }

    fn report_url(&self, property_id: &str) -> String {
        format!(
            "{}/v1beta/properties/{}:runRealtimeReport",
            self.base_url.trim_end_matches('/'),
            property_id
        )
    }
}

/// Body of a `runRealtimeReport` request.
fn report_body(request: &RealtimeRequest) -> serde_json::Value {
    let dimensions: Vec<_> = request
        .dimensions
        .iter()
        .map(|d| json!({ "name": d.api_name() }))
        .collect();
    let mut body = json!({
        "dimensions": dimensions,
        "metrics": [{ "name": request.metric }],
    });
    if let Some(window) = request.minute_window {
        body["minuteRanges"] = json!([{ "startMinutesAgo": window, "endMinutesAgo": 0 }]);
    }
    body
}

/// Map a non-success response to the error taxonomy.
fn classify_failure(status: StatusCode, body: &str) -> FetchError {
    let (google_status, message) = match serde_json::from_str::<GoogleErrorBody>(body) {
        Ok(parsed) => (parsed.error.status, parsed.error.message),
        Err(_) => (String::new(), body.to_string()),
    };

    if status == StatusCode::TOO_MANY_REQUESTS || google_status == "RESOURCE_EXHAUSTED" {
        FetchError::QuotaExhausted(message)
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        FetchError::Auth(format!("{status}: {message}"))
    } else {
        FetchError::Transient(format!("{status}: {message}"))
    }
}

fn into_rows(report: RealtimeReport, dimensions: &[Dimension]) -> Vec<AnalyticsRow> {
    let position = |wanted: Dimension| dimensions.iter().position(|d| *d == wanted);
    let country_idx = position(Dimension::Country);
    let city_idx = position(Dimension::City);

    report
        .rows
        .into_iter()
        .map(|row| {
            let value_at = |idx: Option<usize>| {
                idx.and_then(|i| row.dimension_values.get(i))
                    .map(|v| v.value.clone())
            };
            let country = value_at(country_idx).unwrap_or_default();
            let city = value_at(city_idx);
            let active_users = row
                .metric_values
                .first()
                .map(|v| v.value.clone())
                .unwrap_or_else(|| "0".to_string());
            AnalyticsRow {
                country,
                city,
                active_users,
            }
        })
        .collect()
}

#[async_trait]
impl AnalyticsClient for GaDataClient {
    async fn fetch_realtime_users(
        &self,
        request: &RealtimeRequest,
    ) -> Result<Vec<AnalyticsRow>, FetchError> {
        let token = self.credentials.access_token().await?;
        let url = self.report_url(&request.property_id);

        tracing::debug!(property = %request.property_id, "calling runRealtimeReport");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&token.token)
            .json(&report_body(request))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let report: RealtimeReport = resp
            .json()
            .await
            .map_err(|e| FetchError::Transient(format!("malformed report: {e}")))?;
        let rows = into_rows(report, &request.dimensions);
        tracing::debug!(rows = rows.len(), "realtime report received");
        Ok(rows)
    }
}

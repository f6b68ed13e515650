use base64::Engine;
use serde::Deserialize;
use std::path::PathBuf;

use super::service_account::TokenResponse;
use crate::error::FetchError;

/// Where the service-account key JSON lives.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Secret Manager secret version, read with the instance's ambient identity.
    SecretManager {
        name: String,
        api_url: String,
        metadata_token_url: String,
    },
    File(PathBuf),
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

impl KeySource {
    pub fn describe(&self) -> String {
        match self {
            KeySource::SecretManager { name, .. } => format!("secret {name}"),
            KeySource::File(path) => format!("file {}", path.display()),
        }
    }

    /// Read the raw key JSON.
    pub async fn read(&self, client: &reqwest::Client) -> Result<Vec<u8>, FetchError> {
        match self {
            KeySource::File(path) => tokio::fs::read(path).await.map_err(|e| {
                FetchError::Auth(format!("failed to read key file {}: {e}", path.display()))
            }),
            KeySource::SecretManager {
                name,
                api_url,
                metadata_token_url,
            } => {
                let ambient = metadata_token(client, metadata_token_url).await?;
                access_secret(client, api_url, name, &ambient).await
            }
        }
    }
}

/// Token for the workload's own identity, from the GCE metadata server.
async fn metadata_token(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let resp = client
        .get(url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|e| FetchError::Auth(format!("metadata server unreachable: {e}")))?;

    if !resp.status().is_success() {
        return Err(FetchError::Auth(format!(
            "metadata server returned {}",
            resp.status()
        )));
    }

    let token: TokenResponse = resp
        .json()
        .await
        .map_err(|e| FetchError::Auth(format!("malformed metadata token: {e}")))?;
    Ok(token.access_token)
}

async fn access_secret(
    client: &reqwest::Client,
    api_url: &str,
    name: &str,
    bearer: &str,
) -> Result<Vec<u8>, FetchError> {
    let url = format!("{}/v1/{}:access", api_url.trim_end_matches('/'), name);
    let resp = client
        .get(&url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| FetchError::Auth(format!("secret store unreachable: {e}")))?;

    if !resp.status().is_success() {
        return Err(FetchError::Auth(format!(
            "secret store returned {} for {name}",
            resp.status()
        )));
    }

    let body: AccessSecretVersionResponse = resp
        .json()
        .await
        .map_err(|e| FetchError::Auth(format!("malformed secret response: {e}")))?;

    base64::engine::general_purpose::STANDARD
        .decode(body.payload.data.as_bytes())
        .map_err(|e| FetchError::Auth(format!("secret payload is not base64: {e}")))
}

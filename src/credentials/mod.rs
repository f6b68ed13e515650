pub mod key_source;
pub mod service_account;

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::CredentialsConfig;
use crate::error::FetchError;
use key_source::KeySource;
use service_account::ServiceAccountKey;

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Supplies bearer tokens for the analytics API.
#[async_trait]
pub trait CredentialProvider: Send + Sync + 'static {
    async fn access_token(&self) -> Result<AccessToken, FetchError>;
}

/// Service-account credentials: key from a [`KeySource`], token from a JWT
/// bearer exchange.
///
/// With `cache_tokens` the token is reused until shortly before it expires.
/// Every refresh re-reads the key, so a rotated secret is picked up on the
/// next refresh.
pub struct ServiceAccountCredentials {
    client: reqwest::Client,
    source: KeySource,
    scopes: Vec<String>,
    cache_tokens: bool,
    cached: Mutex<Option<AccessToken>>,
}

impl ServiceAccountCredentials {
    pub fn new(
        client: reqwest::Client,
        source: KeySource,
        scopes: Vec<String>,
        cache_tokens: bool,
    ) -> Self {
        Self {
            client,
            source,
            scopes,
            cache_tokens,
            cached: Mutex::new(None),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &CredentialsConfig) -> Self {
        let source = match &config.key_file {
            Some(path) => KeySource::File(path.clone()),
            None => KeySource::SecretManager {
                name: config.secret_name.clone(),
                api_url: config.secret_manager_url.clone(),
                metadata_token_url: config.metadata_token_url.clone(),
            },
        };
        Self::new(client, source, config.scopes.clone(), config.cache_tokens)
    }

    async fn fetch(&self) -> Result<AccessToken, FetchError> {
        let raw = self.source.read(&self.client).await?;
        let key = ServiceAccountKey::parse(&raw)?;
        let issued = Instant::now();
        let response = service_account::exchange(&self.client, &key, &self.scopes).await?;
        tracing::info!(
            source = %self.source.describe(),
            client_email = %key.client_email,
            expires_in = response.expires_in,
            "obtained analytics access token"
        );
        Ok(AccessToken {
            token: response.access_token,
            expires_at: issued + Duration::from_secs(response.expires_in),
        })
    }
}

#[async_trait]
impl CredentialProvider for ServiceAccountCredentials {
    async fn access_token(&self) -> Result<AccessToken, FetchError> {
        if !self.cache_tokens {
            return self.fetch().await;
        }

        // Held across the refresh so concurrent callers share one exchange.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.clone());
        }

        let token = self.fetch().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_token_freshness_respects_margin() {
        let token = AccessToken {
            token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(120),
        };
        assert!(token.is_fresh());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!token.is_fresh());
    }

    #[test]
    fn test_from_config_prefers_key_file() {
        let config = CredentialsConfig {
            key_file: Some("/etc/livemap/key.json".into()),
            ..CredentialsConfig::default()
        };
        let creds = ServiceAccountCredentials::from_config(reqwest::Client::new(), &config);
        assert!(matches!(creds.source, KeySource::File(_)));

        let creds = ServiceAccountCredentials::from_config(
            reqwest::Client::new(),
            &CredentialsConfig::default(),
        );
        assert!(matches!(creds.source, KeySource::SecretManager { .. }));
    }
}

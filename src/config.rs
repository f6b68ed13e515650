use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::types::Dimension;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    pub property_id: String,
    #[serde(default = "default_dimensions")]
    pub dimensions: Vec<Dimension>,
    /// Trailing window in minutes; `None` lets the backend use its default.
    #[serde(default)]
    pub minute_window: Option<u32>,
    #[serde(default = "default_analytics_base_url")]
    pub base_url: String,
    #[serde(default = "default_analytics_timeout")]
    pub timeout_secs: u64,
}

fn default_dimensions() -> Vec<Dimension> {
    vec![Dimension::Country]
}

fn default_analytics_base_url() -> String {
    "https://analyticsdata.googleapis.com".to_string()
}

fn default_analytics_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    /// Secret Manager resource holding the service-account key JSON.
    #[serde(default = "default_secret_name")]
    pub secret_name: String,
    /// Read the key from this file instead of the secret store.
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    #[serde(default = "default_secret_manager_url")]
    pub secret_manager_url: String,
    #[serde(default = "default_metadata_token_url")]
    pub metadata_token_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_cache_tokens")]
    pub cache_tokens: bool,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            secret_name: default_secret_name(),
            key_file: None,
            secret_manager_url: default_secret_manager_url(),
            metadata_token_url: default_metadata_token_url(),
            scopes: default_scopes(),
            cache_tokens: default_cache_tokens(),
        }
    }
}

fn default_secret_name() -> String {
    "projects/405806232197/secrets/service_account_json/versions/latest".to_string()
}

fn default_secret_manager_url() -> String {
    "https://secretmanager.googleapis.com".to_string()
}

fn default_metadata_token_url() -> String {
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token"
        .to_string()
}

fn default_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/cloud-platform".to_string(),
        "https://www.googleapis.com/auth/analytics.readonly".to_string(),
    ]
}

fn default_cache_tokens() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolverStrategy {
    Static,
    Geocoding,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResolverConfig {
    #[serde(default = "default_strategy")]
    pub strategy: ResolverStrategy,
    /// Override for the bundled country coordinate table.
    #[serde(default)]
    pub coordinates_path: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            coordinates_path: None,
        }
    }
}

fn default_strategy() -> ResolverStrategy {
    ResolverStrategy::Static
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GeocodingProvider {
    Google,
    Opencage,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    #[serde(default = "default_provider")]
    pub provider: GeocodingProvider,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_geocode_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            base_url: None,
            timeout_secs: default_geocoding_timeout(),
            cache_ttl_secs: default_geocode_ttl(),
        }
    }
}

fn default_provider() -> GeocodingProvider {
    GeocodingProvider::Google
}

fn default_geocoding_timeout() -> u64 {
    10
}

fn default_geocode_ttl() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_response_ttl")]
    pub response_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            response_ttl_secs: default_response_ttl(),
        }
    }
}

fn default_response_ttl() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_retry_delay")]
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_retry_delay(),
        }
    }
}

fn default_max_attempts() -> usize {
    3
}

fn default_retry_delay() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_per_second")]
    pub per_second: u64,
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: default_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

fn default_per_second() -> u64 {
    2
}

fn default_burst_size() -> u32 {
    20
}

impl AppConfig {
    /// Reject configurations that cannot serve `/realtime`.
    pub fn validate(&self) -> Result<(), String> {
        if self.analytics.property_id.trim().is_empty() {
            return Err("analytics.property_id must be set. \
                 Set it in config.toml or via LIVEMAP__ANALYTICS__PROPERTY_ID env var."
                .to_string());
        }
        if !self.analytics.dimensions.contains(&Dimension::Country) {
            return Err("analytics.dimensions must include \"country\"".to_string());
        }
        if self.resolver.strategy == ResolverStrategy::Geocoding
            && self.geocoding.api_key.is_empty()
        {
            return Err("geocoding.api_key must be set when resolver.strategy = \"geocoding\". \
                 Set it via LIVEMAP__GEOCODING__API_KEY env var."
                .to_string());
        }
        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }
        if self.rate_limit.per_second == 0 || self.rate_limit.burst_size == 0 {
            return Err("rate_limit.per_second and rate_limit.burst_size must be positive"
                .to_string());
        }
        Ok(())
    }

    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        let path = config_path.unwrap_or("config.toml");
        builder = builder.add_source(File::with_name(path).required(false));

        // Overlay with environment variables (LIVEMAP__SERVER__PORT=8080, etc.)
        builder = builder.add_source(
            Environment::with_prefix("LIVEMAP")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

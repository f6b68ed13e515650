use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields of a service-account key file this service needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn parse(raw: &[u8]) -> Result<Self, FetchError> {
        serde_json::from_slice(raw)
            .map_err(|e| FetchError::Auth(format!("malformed service account key: {e}")))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token endpoint / metadata server response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Sign the RS256 assertion for the JWT bearer grant.
pub fn sign_assertion(key: &ServiceAccountKey, scopes: &[String]) -> Result<String, FetchError> {
    let now = chrono::Utc::now().timestamp();
    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        scope: scopes.join(" "),
        aud: key.token_uri.clone(),
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| FetchError::Auth(format!("invalid private key: {e}")))?;

    encode(&header, &claims, &encoding_key)
        .map_err(|e| FetchError::Auth(format!("failed to sign assertion: {e}")))
}

/// Exchange a signed assertion for an access token at the key's `token_uri`.
pub async fn exchange(
    client: &reqwest::Client,
    key: &ServiceAccountKey,
    scopes: &[String],
) -> Result<TokenResponse, FetchError> {
    let assertion = sign_assertion(key, scopes)?;

    let resp = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|e| FetchError::Auth(format!("token endpoint unreachable: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(FetchError::Auth(format!(
            "token exchange failed with {status}: {body}"
        )));
    }

    resp.json::<TokenResponse>()
        .await
        .map_err(|e| FetchError::Auth(format!("malformed token response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_applies_default_token_uri() {
        let key = ServiceAccountKey::parse(
            br#"{"client_email": "svc@example.iam.gserviceaccount.com", "private_key": "pem"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
        assert!(key.private_key_id.is_none());
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let err = ServiceAccountKey::parse(br#"{"client_email": "svc@example.com"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Auth(_)));
    }

    #[test]
    fn test_sign_rejects_invalid_pem() {
        let key = ServiceAccountKey {
            client_email: "svc@example.com".to_string(),
            private_key: "not a pem".to_string(),
            private_key_id: None,
            token_uri: default_token_uri(),
        };
        let err = sign_assertion(&key, &["scope".to_string()]).unwrap_err();
        assert!(matches!(err, FetchError::Auth(_)));
    }
}

//! Google service-account authentication
//!
//! Signs an RS256 JWT assertion with the service-account private key and
//! exchanges it at the token endpoint for a bearer token. The token is cached
//! and refreshed shortly before it expires.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::adapters::errors::{SheetError, SheetResult};
use crate::core::logging::sanitize;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// Fields of a service-account JSON key file
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
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Read a key file downloaded from the cloud console
    pub fn from_file(path: &Path) -> SheetResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SheetError::Auth(format!(
                "Cannot read credentials file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> SheetResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| SheetError::Auth(format!("Invalid service account key: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Issues bearer tokens for a service account
pub struct TokenProvider {
    key: ServiceAccountKey,
    scope: String,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey, scopes: &[&str], http: reqwest::Client) -> Self {
        Self {
            key,
            scope: scopes.join(" "),
            http,
            cached: Mutex::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Current bearer token, fetching a new one when the cached token is
    /// missing or about to expire
    pub async fn access_token(&self) -> SheetResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch_token(now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> SheetResult<String> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| SheetError::Auth(format!("Invalid private key: {}", e)))?;

        encode(&header, &claims, &encoding_key)
            .map_err(|e| SheetError::Auth(format!("Failed to sign JWT assertion: {}", e)))
    }

    async fn fetch_token(&self, now: DateTime<Utc>) -> SheetResult<CachedToken> {
        let assertion = self.assertion(now)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
            return Err(SheetError::Auth(format!(
                "Token exchange failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SheetError::Auth(format!("Invalid token response: {}", e)))?;

        debug!(
            client_email = %self.key.client_email,
            token = %sanitize(&token.access_token),
            expires_in = token.expires_in,
            "Obtained Google access token"
        );

        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}

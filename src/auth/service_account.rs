//! Service-account authentication through the JWT bearer grant.
//!
//! The service account signs an RS256 assertion naming itself as issuer and the
//! token endpoint as audience; Google answers with a short-lived access token.
//! Tokens are cached until shortly before they expire.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::oauth::TokenResponse;
use crate::config::Config;
use crate::error::AuthError;
use crate::metrics;

/// OAuth2 grant type for signed assertions.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime; Google rejects anything longer than one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh cached tokens this many seconds before they expire.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Claims of the signed assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Service account email.
    pub iss: String,
    /// Space-separated scopes.
    pub scope: String,
    /// Token endpoint.
    pub aud: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Impersonated user for domain-wide delegation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) < self.expires_at
    }
}

/// Service account credentials and token cache.
pub struct ServiceAccountAuth {
    http: reqwest::Client,
    client_email: String,
    subject: Option<String>,
    scope: String,
    token_url: String,
    key: EncodingKey,
    cache: RwLock<Option<CachedToken>>,
}

impl fmt::Debug for ServiceAccountAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountAuth")
            .field("client_email", &self.client_email)
            .field("subject", &self.subject)
            .field("scope", &self.scope)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountAuth {
    /// Parse the private key from config and prepare the assertion fields.
    pub fn new(config: &Config, http: reqwest::Client) -> Result<Self, AuthError> {
        if config.google_client_email.is_empty() {
            return Err(AuthError::MissingCredential("GOOGLE_CLIENT_EMAIL"));
        }
        if config.google_private_key.is_empty() {
            return Err(AuthError::MissingCredential("GOOGLE_PRIVATE_KEY"));
        }

        let key = EncodingKey::from_rsa_pem(config.private_key_pem().as_bytes())
            .map_err(AuthError::InvalidPrivateKey)?;

        Ok(Self {
            http,
            client_email: config.google_client_email.clone(),
            subject: config.google_impersonate_user.clone(),
            scope: config.scope_string(),
            token_url: config.google_token_url.clone(),
            key,
            cache: RwLock::new(None),
        })
    }

    /// Claims for an assertion issued at `now`.
    pub fn claims(&self, now: DateTime<Utc>) -> AssertionClaims {
        let iat = now.timestamp();
        AssertionClaims {
            iss: self.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.token_url.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
            sub: self.subject.clone(),
        }
    }

    /// Signed RS256 assertion for the current time.
    pub fn assertion(&self) -> Result<String, AuthError> {
        let claims = self.claims(Utc::now());
        encode(&Header::new(Algorithm::RS256), &claims, &self.key).map_err(AuthError::Signing)
    }

    /// Access token, served from cache while it is still fresh.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.is_fresh(Utc::now()) {
                debug!("Using cached service account token");
                return Ok(cached.access_token.clone());
            }
        }

        let tokens = self.fetch_token().await?;
        let now = Utc::now();
        let expires_at = tokens
            .expires_in
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or_else(|| now + Duration::seconds(ASSERTION_LIFETIME_SECS));
        let cached = CachedToken {
            access_token: tokens.access_token,
            expires_at,
        };

        let access_token = cached.access_token.clone();
        *self.cache.write().await = Some(cached);
        Ok(access_token)
    }

    /// Exchange a fresh assertion for an access token, bypassing the cache.
    #[instrument(skip(self), fields(iss = %self.client_email))]
    pub async fn fetch_token(&self) -> Result<TokenResponse, AuthError> {
        let assertion = self.assertion()?;
        let _timer = metrics::timer_upstream("google_token");

        let response = self
            .http
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Service account token request rejected");
            return Err(AuthError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ParseError(e.to_string()))?;

        info!("Minted service account access token");
        metrics::inc_service_account_tokens();
        Ok(tokens)
    }
}

//! Interactive OAuth2 authorization-code flow against Google.

use std::fmt;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::AuthError;
use crate::metrics;

/// Length of the CSRF `state` parameter.
const STATE_LEN: usize = 32;

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Present on the first consent with `access_type=offline`.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Usually "Bearer".
    #[serde(default)]
    pub token_type: Option<String>,
    /// Granted scopes, space separated.
    #[serde(default)]
    pub scope: Option<String>,
    /// OpenID Connect ID token, when `openid` was requested.
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Form body for the authorization-code grant.
#[derive(Debug, Serialize)]
struct CodeExchangeRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'static str,
}

/// OAuth2 client for the consent screen and code exchange.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    scope: String,
}

impl fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClient")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl OAuthClient {
    /// Create a client from config, sharing the given HTTP client.
    pub fn new(config: &Config, http: reqwest::Client) -> Result<Self, AuthError> {
        if config.google_client_id.is_empty() {
            return Err(AuthError::MissingCredential("GOOGLE_CLIENT_ID"));
        }
        if config.google_client_secret.is_empty() {
            return Err(AuthError::MissingCredential("GOOGLE_CLIENT_SECRET"));
        }

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.google_redirect_uri.clone(),
            auth_url: config.google_auth_url.clone(),
            token_url: config.google_token_url.clone(),
            scope: config.scope_string(),
        })
    }

    /// Consent screen URL for the given CSRF state.
    pub fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", self.scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )?;

        Ok(url.into())
    }

    /// Exchange an authorization code for tokens.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        let _timer = metrics::timer_upstream("google_token");

        let request = CodeExchangeRequest {
            code,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: &self.redirect_uri,
            grant_type: "authorization_code",
        };

        debug!("Exchanging authorization code for tokens");

        let response = self.http.post(&self.token_url).form(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Google OAuth token exchange rejected");
            return Err(AuthError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ParseError(e.to_string()))?;

        info!("Exchanged authorization code for tokens");
        metrics::inc_oauth_logins();
        Ok(tokens)
    }
}

/// Random alphanumeric value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config_for(server_url: &str) -> Config {
        Config::from_vars(vec![
            ("GOOGLE_CLIENT_ID", "client-id".to_string()),
            ("GOOGLE_CLIENT_SECRET", "client-secret".to_string()),
            (
                "GOOGLE_REDIRECT_URI",
                "http://localhost:3000/oauth2callback".to_string(),
            ),
            ("GOOGLE_TOKEN_URL", format!("{server_url}/token")),
        ])
        .unwrap()
    }

    #[test]
    fn new_requires_client_id() {
        let config = Config::from_vars(vec![("GOOGLE_CLIENT_SECRET", "s")]).unwrap();
        let err = OAuthClient::new(&config, reqwest::Client::new()).unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential("GOOGLE_CLIENT_ID")));
    }

    #[test]
    fn authorization_url_carries_all_parameters() {
        let client = OAuthClient::new(&config_for("http://unused"), reqwest::Client::new()).unwrap();
        let url = Url::parse(&client.authorization_url("xyz").unwrap()).unwrap();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client-id");
        assert_eq!(params["redirect_uri"], "http://localhost:3000/oauth2callback");
        assert_eq!(params["response_type"], "code");
        assert_eq!(
            params["scope"],
            "https://www.googleapis.com/auth/meetings.space.created"
        );
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["state"], "xyz");
    }

    #[test]
    fn generated_state_is_random_alphanumeric() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), STATE_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn exchange_code_posts_authorization_code_grant() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded("code".into(), "the-code".into()),
                Matcher::UrlEncoded("client_id".into(), "client-id".into()),
                Matcher::UrlEncoded("client_secret".into(), "client-secret".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.token","expires_in":3599,"token_type":"Bearer"}"#)
            .create_async()
            .await;

        let client = OAuthClient::new(&config_for(&server.url()), reqwest::Client::new()).unwrap();
        let tokens = client.exchange_code("the-code").await.unwrap();

        mock.assert_async().await;
        assert_eq!(tokens.access_token, "ya29.token");
        assert_eq!(tokens.expires_in, Some(3599));
        assert!(tokens.refresh_token.is_none());
    }

    #[tokio::test]
    async fn exchange_code_surfaces_rejection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let client = OAuthClient::new(&config_for(&server.url()), reqwest::Client::new()).unwrap();
        let err = client.exchange_code("stale").await.unwrap_err();

        match err {
            AuthError::TokenExchange { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

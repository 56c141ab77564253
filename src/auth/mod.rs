//! Authentication strategies for reaching the Meet API.
//!
//! Two variants exist:
//! - [`oauth`]: interactive consent flow, the access token travels in a cookie
//! - [`service_account`]: non-interactive JWT bearer grant signed with a private key

pub mod oauth;
pub mod service_account;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::config::Config;
use crate::error::AuthError;

pub use oauth::{generate_state, OAuthClient, TokenResponse};
pub use service_account::{AssertionClaims, ServiceAccountAuth};

/// Which credential `POST /` uses to call the Meet API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthVariant {
    /// Access token obtained through the consent screen and stored in a cookie.
    #[default]
    #[serde(alias = "OAUTH", alias = "oauth2")]
    #[strum(to_string = "oauth", serialize = "OAUTH", serialize = "oauth2")]
    OAuth,
    /// Access token minted from a service-account JWT.
    #[serde(alias = "SERVICE_ACCOUNT", alias = "service-account")]
    #[strum(
        to_string = "service_account",
        serialize = "SERVICE_ACCOUNT",
        serialize = "service-account"
    )]
    ServiceAccount,
}

/// Credential source for the selected variant.
#[derive(Debug)]
pub enum Authenticator {
    /// Interactive OAuth2 client.
    OAuth(OAuthClient),
    /// Service account with a token cache.
    ServiceAccount(ServiceAccountAuth),
}

impl Authenticator {
    /// Build the authenticator matching `config.auth_variant`.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Result<Self, AuthError> {
        match config.auth_variant {
            AuthVariant::OAuth => Ok(Self::OAuth(OAuthClient::new(config, http)?)),
            AuthVariant::ServiceAccount => {
                Ok(Self::ServiceAccount(ServiceAccountAuth::new(config, http)?))
            }
        }
    }

    /// Variant this authenticator implements.
    pub fn variant(&self) -> AuthVariant {
        match self {
            Self::OAuth(_) => AuthVariant::OAuth,
            Self::ServiceAccount(_) => AuthVariant::ServiceAccount,
        }
    }

    /// OAuth client, if this is the interactive variant.
    pub fn oauth(&self) -> Result<&OAuthClient, AuthError> {
        match self {
            Self::OAuth(client) => Ok(client),
            Self::ServiceAccount(_) => Err(AuthError::WrongVariant("service_account")),
        }
    }

    /// Access token from the service account, if this is the non-interactive variant.
    pub async fn service_account_token(&self) -> Result<String, AuthError> {
        match self {
            Self::ServiceAccount(sa) => sa.access_token().await,
            Self::OAuth(_) => Err(AuthError::WrongVariant("oauth")),
        }
    }
}

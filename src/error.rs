//! Unified error types for the service.

use thiserror::Error;

/// Unified error type for the service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration present but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Authentication error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// OAuth2 and service-account authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A credential required by the selected variant is absent.
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    /// The operation only exists for the other variant.
    #[error("operation not available for the {0} variant")]
    WrongVariant(&'static str),

    /// The service account private key could not be parsed.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(#[source] jsonwebtoken::errors::Error),

    /// Signing the assertion failed.
    #[error("failed to sign assertion: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// The token endpoint answered with a non-success status.
    #[error("token exchange failed with HTTP {status}: {body}")]
    TokenExchange {
        /// HTTP status returned by the token endpoint.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The token endpoint answered with something that is not a token.
    #[error("failed to parse token response: {0}")]
    ParseError(String),

    /// The consent URL could not be built.
    #[error("invalid authorization url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Google Meet API errors.
#[derive(Error, Debug)]
pub enum MeetError {
    /// The Meet API answered with a non-success status.
    #[error("meet api returned HTTP {status}: {body}")]
    Api {
        /// HTTP status returned by the Meet API.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The response was not a space.
    #[error("failed to parse space: {0}")]
    ParseError(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;

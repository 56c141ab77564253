//! Application configuration loaded from environment variables.

use serde::{Deserialize, Deserializer};

use crate::auth::AuthVariant;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Which authentication strategy `POST /` uses.
    #[serde(default)]
    pub auth_variant: AuthVariant,

    // === OAuth2 Client ===
    /// OAuth client ID from the Google Cloud console.
    #[serde(default)]
    pub google_client_id: String,

    /// OAuth client secret.
    #[serde(default)]
    pub google_client_secret: String,

    /// Redirect URI registered for the OAuth client.
    #[serde(default = "default_redirect_uri")]
    pub google_redirect_uri: String,

    // === Service Account ===
    /// Service account email (`iss` claim).
    #[serde(default)]
    pub google_client_email: String,

    /// Service account private key in PEM form. May contain literal `\n`.
    #[serde(default)]
    pub google_private_key: String,

    /// User to impersonate through domain-wide delegation (`sub` claim).
    #[serde(default, deserialize_with = "blank_as_none")]
    pub google_impersonate_user: Option<String>,

    // === Google Endpoints ===
    /// Scopes requested by both variants (comma-separated in the environment).
    #[serde(default = "default_scopes")]
    pub google_scopes: Vec<String>,

    /// OAuth consent screen URL.
    #[serde(default = "default_auth_url")]
    pub google_auth_url: String,

    /// Token endpoint, also the `aud` of service-account assertions.
    #[serde(default = "default_token_url")]
    pub google_token_url: String,

    /// Meet REST API base URL.
    #[serde(default = "default_meet_api_url")]
    pub meet_api_url: String,

    /// Optional access type for created spaces (OPEN, TRUSTED, RESTRICTED).
    #[serde(default, deserialize_with = "blank_as_none")]
    pub meet_access_type: Option<String>,

    // === Demo ===
    /// Public API hit by `GET /api`.
    #[serde(default = "default_demo_api_url")]
    pub demo_api_url: String,

    // === Cookies & HTTP ===
    /// Cookie holding the OAuth access token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Add the `Secure` attribute to cookies.
    #[serde(default)]
    pub cookie_secure: bool,

    /// Outbound request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

/// Access types the Meet API accepts for `config.accessType`.
pub const MEET_ACCESS_TYPES: [&str; 3] = ["OPEN", "TRUSTED", "RESTRICTED"];

/// Treat `KEY=` and whitespace-only values as unset.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn default_port() -> u16 {
    3000
}

fn default_redirect_uri() -> String {
    "http://localhost:3000/oauth2callback".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["https://www.googleapis.com/auth/meetings.space.created".to_string()]
}

fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_meet_api_url() -> String {
    "https://meet.googleapis.com/v2".to_string()
}

fn default_demo_api_url() -> String {
    "https://jsonplaceholder.typicode.com/todos/1".to_string()
}

fn default_cookie_name() -> String {
    "access_token".to_string()
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Build configuration from explicit `(KEY, value)` pairs instead of the process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        envy::from_iter(vars.into_iter().map(|(k, v)| (k.into(), v.into())))
    }

    /// Check if the configuration is valid for the selected variant.
    pub fn validate(&self) -> Result<(), String> {
        if self.google_scopes.iter().all(|s| s.trim().is_empty()) {
            return Err("GOOGLE_SCOPES must name at least one scope".to_string());
        }

        if let Some(access_type) = &self.meet_access_type {
            if !MEET_ACCESS_TYPES.contains(&access_type.as_str()) {
                return Err(format!(
                    "MEET_ACCESS_TYPE must be one of {}, got {access_type}",
                    MEET_ACCESS_TYPES.join(", ")
                ));
            }
        }

        match self.auth_variant {
            AuthVariant::OAuth => {
                if self.google_client_id.is_empty() {
                    return Err("GOOGLE_CLIENT_ID is required for the oauth variant".to_string());
                }
                if self.google_client_secret.is_empty() {
                    return Err(
                        "GOOGLE_CLIENT_SECRET is required for the oauth variant".to_string()
                    );
                }
                if self.google_redirect_uri.is_empty() {
                    return Err(
                        "GOOGLE_REDIRECT_URI is required for the oauth variant".to_string()
                    );
                }
            }
            AuthVariant::ServiceAccount => {
                if self.google_client_email.is_empty() {
                    return Err(
                        "GOOGLE_CLIENT_EMAIL is required for the service_account variant"
                            .to_string(),
                    );
                }
                if self.google_private_key.is_empty() {
                    return Err(
                        "GOOGLE_PRIVATE_KEY is required for the service_account variant"
                            .to_string(),
                    );
                }
                if !self.private_key_pem().contains("-----BEGIN") {
                    return Err("GOOGLE_PRIVATE_KEY must be a PEM encoded key".to_string());
                }
            }
        }

        Ok(())
    }

    /// Private key with escaped newlines restored.
    pub fn private_key_pem(&self) -> String {
        self.google_private_key.replace("\\n", "\n")
    }

    /// Scopes joined the way Google expects them in `scope` parameters.
    pub fn scope_string(&self) -> String {
        self.google_scopes
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check if the interactive OAuth flow is enabled.
    pub fn is_oauth(&self) -> bool {
        self.auth_variant == AuthVariant::OAuth
    }
}

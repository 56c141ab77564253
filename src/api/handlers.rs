//! HTTP API handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::{IntoParams, ToSchema};

use super::cookies::{self, CookieOptions, STATE_COOKIE, STATE_COOKIE_MAX_AGE};
use super::error::ApiError;
use crate::auth::{generate_state, AuthVariant, Authenticator};
use crate::config::Config;
use crate::demo::DemoClient;
use crate::meet::{MeetClient, Space};

/// Fixed health-check message.
pub const HEALTH_MESSAGE: &str = "Meet space service is running";

const MISSING_TOKEN: &str = "Missing access token; authenticate via /auth";
const SPACE_FAILED: &str = "Failed to create meeting space";
const DEMO_FAILED: &str = "Failed to reach demo API";
const EXCHANGE_FAILED: &str = "Failed to exchange authorization code";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Credential source for the configured variant.
    pub auth: Arc<Authenticator>,
    /// Meet API client.
    pub meet: MeetClient,
    /// Demo API client.
    pub demo: DemoClient,
    /// Prometheus handle, when the recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state from config with one shared HTTP client.
    pub fn new(config: Config) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        let auth = Authenticator::from_config(&config, http.clone())?;
        let meet = MeetClient::new(&config, http.clone());
        let demo = DemoClient::new(&config, http);

        Ok(Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            meet,
            demo,
            prometheus: None,
        })
    }

    /// Attach a Prometheus handle so `/metrics` can render.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    fn cookie_options(&self, max_age: Option<i64>) -> CookieOptions {
        CookieOptions {
            max_age,
            secure: self.config.cookie_secure,
        }
    }
}

/// Message body used for health, success and error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human readable message.
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Demo API result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DemoResponse {
    /// Status code returned by the demo API.
    pub status: u16,
}

/// Query string Google appends to the redirect URI.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackParams {
    /// Authorization code.
    pub code: Option<String>,
    /// CSRF state echoed back from `/auth`.
    pub state: Option<String>,
    /// Set when the user denied consent.
    pub error: Option<String>,
}

/// Health check handler - always returns 200.
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = MessageResponse),
    )
)]
pub async fn health() -> Json<MessageResponse> {
    Json(MessageResponse::new(HEALTH_MESSAGE))
}

/// Call the demo API and mirror its status code.
#[utoipa::path(
    get,
    path = "/api",
    tag = "demo",
    responses(
        (status = 200, description = "Demo API status (mirrors upstream code)", body = DemoResponse),
        (status = 500, description = "Demo API unreachable", body = MessageResponse),
    )
)]
pub async fn demo(State(state): State<AppState>) -> Result<Response, ApiError> {
    let status = state.demo.fetch_status().await.map_err(|e| {
        error!(error = %e, "Demo API request failed");
        ApiError::internal(DEMO_FAILED)
    })?;

    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((code, Json(DemoResponse { status })).into_response())
}

/// Start the OAuth flow: remember a CSRF state and redirect to Google.
#[utoipa::path(
    get,
    path = "/auth",
    tag = "oauth",
    responses(
        (status = 307, description = "Redirect to the Google consent screen"),
        (status = 404, description = "OAuth variant disabled", body = MessageResponse),
        (status = 500, description = "Consent URL could not be built", body = MessageResponse),
    )
)]
pub async fn auth_start(State(state): State<AppState>) -> Result<Response, ApiError> {
    let client = state.auth.oauth().map_err(|_| ApiError::NotFound)?;

    let csrf_state = generate_state();
    let url = client.authorization_url(&csrf_state).map_err(|e| {
        error!(error = %e, "Failed to build consent URL");
        ApiError::internal("Failed to start authentication")
    })?;

    let cookie = cookies::build(
        STATE_COOKIE,
        &csrf_state,
        state.cookie_options(Some(STATE_COOKIE_MAX_AGE)),
    )
    .ok_or_else(|| ApiError::internal("Failed to start authentication"))?;

    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::temporary(&url)).into_response())
}

/// Finish the OAuth flow: check state, exchange the code, store the token cookie.
#[utoipa::path(
    get,
    path = "/oauth2callback",
    tag = "oauth",
    params(CallbackParams),
    responses(
        (status = 200, description = "Token stored in cookie", body = MessageResponse),
        (status = 400, description = "Denied consent, bad state or missing code", body = MessageResponse),
        (status = 500, description = "Code exchange failed", body = MessageResponse),
    )
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    let client = state.auth.oauth().map_err(|_| ApiError::NotFound)?;

    if let Some(reason) = params.error {
        warn!(reason = %reason, "User did not grant consent");
        return Err(ApiError::bad_request(format!("Authorization failed: {reason}")));
    }

    let expected = cookies::get(&headers, STATE_COOKIE);
    match (expected.as_deref(), params.state.as_deref()) {
        (Some(expected), Some(received)) if !expected.is_empty() && expected == received => {}
        _ => {
            warn!("OAuth state mismatch");
            return Err(ApiError::bad_request("Invalid OAuth state"));
        }
    }

    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing authorization code"))?;

    let tokens = client.exchange_code(&code).await.map_err(|e| {
        error!(error = %e, "OAuth code exchange failed");
        ApiError::internal(EXCHANGE_FAILED)
    })?;

    let token_cookie = cookies::build(
        &state.config.cookie_name,
        &tokens.access_token,
        state.cookie_options(tokens.expires_in),
    )
    .ok_or_else(|| {
        error!("Access token contains characters a cookie cannot carry");
        ApiError::internal(EXCHANGE_FAILED)
    })?;
    let clear_state = cookies::expire(STATE_COOKIE, state.config.cookie_secure);

    info!("OAuth login completed");
    Ok((
        AppendHeaders([(SET_COOKIE, token_cookie), (SET_COOKIE, clear_state)]),
        Json(MessageResponse::new("Authentication successful")),
    )
        .into_response())
}

/// Create a Google Meet space with the variant's credential.
#[utoipa::path(
    post,
    path = "/",
    tag = "meet",
    responses(
        (status = 200, description = "Space created", body = Space),
        (status = 400, description = "No access token cookie (oauth variant)", body = MessageResponse),
        (status = 500, description = "Meet API or token endpoint failure", body = MessageResponse),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create_space(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Space>, ApiError> {
    let access_token = match state.auth.variant() {
        AuthVariant::OAuth => cookies::get(&headers, &state.config.cookie_name)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::bad_request(MISSING_TOKEN))?,
        AuthVariant::ServiceAccount => state.auth.service_account_token().await.map_err(|e| {
            error!(error = %e, "Service account authentication failed");
            ApiError::internal(SPACE_FAILED)
        })?,
    };

    let space = state.meet.create_space(&access_token).await.map_err(|e| {
        error!(error = %e, "Failed to create meeting space");
        ApiError::internal(SPACE_FAILED)
    })?;

    Ok(Json(space))
}

/// Prometheus text exposition.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "health",
    responses(
        (status = 200, description = "Prometheus metrics", body = String, content_type = "text/plain"),
        (status = 404, description = "Recorder not installed", body = MessageResponse),
    )
)]
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let handle = state.prometheus.as_ref().ok_or(ApiError::NotFound)?;
    Ok((
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}

//! Google Meet REST client.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::MeetError;
use crate::metrics;

/// Space configuration sent on creation and echoed back by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpaceConfig {
    /// Who can join without knocking (OPEN, TRUSTED, RESTRICTED).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_type: Option<String>,
    /// Which meeting features are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point_access: Option<String>,
}

/// Body of `POST /spaces`.
#[derive(Debug, Default, Serialize)]
pub struct CreateSpaceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<SpaceConfig>,
}

/// Conference currently running in a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveConference {
    /// Conference record resource name.
    pub conference_record: String,
}

/// Meet space as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    /// Resource name, `spaces/{space}`.
    pub name: String,
    /// Join URL.
    pub meeting_uri: String,
    /// Typeable meeting code.
    pub meeting_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SpaceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_conference: Option<ActiveConference>,
}

/// Meet API client. The access token is supplied per call.
#[derive(Debug, Clone)]
pub struct MeetClient {
    http: reqwest::Client,
    base_url: String,
    access_type: Option<String>,
}

impl MeetClient {
    /// Create a client from config, sharing the given HTTP client.
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.meet_api_url.trim_end_matches('/').to_string(),
            access_type: config.meet_access_type.clone(),
        }
    }

    /// Create a new meeting space on behalf of the token's principal.
    #[instrument(skip(self, access_token))]
    pub async fn create_space(&self, access_token: &str) -> Result<Space, MeetError> {
        let _timer = metrics::timer_upstream("meet");
        let url = format!("{}/spaces", self.base_url);

        let request = CreateSpaceRequest {
            config: self.access_type.as_ref().map(|access_type| SpaceConfig {
                access_type: Some(access_type.clone()),
                entry_point_access: None,
            }),
        };

        debug!("Creating Google Meet space");

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Google Meet API error");
            metrics::inc_spaces_failed();
            return Err(MeetError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let space: Space = response
            .json()
            .await
            .map_err(|e| MeetError::ParseError(e.to_string()))?;

        info!(meeting_code = %space.meeting_code, "Created Google Meet space");
        metrics::inc_spaces_created();
        Ok(space)
    }
}

//! OpenAPI document for the service.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::handlers::{self, DemoResponse, MessageResponse};
use crate::meet::{ActiveConference, Space, SpaceConfig};

/// Path the generated document is served from.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Path of the interactive documentation UI.
pub const DOCS_PATH: &str = "/docs";

// To be a part of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
    info(title = "Meet Space Service"),
    paths(
        handlers::health,
        handlers::demo,
        handlers::auth_start,
        handlers::oauth_callback,
        handlers::create_space,
        handlers::metrics,
    ),
    components(schemas(MessageResponse, DemoResponse, Space, SpaceConfig, ActiveConference)),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and metrics"),
        (name = "demo", description = "Pass-through demo call"),
        (name = "oauth", description = "Interactive OAuth2 flow"),
        (name = "meet", description = "Google Meet spaces"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("access_token"))),
            )
        }
    }
}

/// Pretty-printed OpenAPI JSON.
pub fn openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

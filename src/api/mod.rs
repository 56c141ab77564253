//! HTTP API: health, demo pass-through, OAuth flow, space creation and docs.

pub mod cookies;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod routes;

pub use docs::ApiDoc;
pub use error::ApiError;
pub use handlers::AppState;
pub use routes::create_router;

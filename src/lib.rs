//! HTTP service template for creating Google Meet spaces.
//!
//! The service exposes a health check, a demo pass-through call to a public API,
//! and `POST /` which creates a Meet space with one of two credentials:
//!
//! ```text
//! oauth            browser -> /auth -> Google consent -> /oauth2callback -> cookie
//!                  POST / (cookie)            -> Meet API
//! service_account  POST / -> signed JWT -> token endpoint -> Meet API
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`auth`]: OAuth2 and service-account credentials
//! - [`meet`]: Google Meet REST client
//! - [`demo`]: Demo public API client
//! - [`api`]: HTTP routes, handlers and OpenAPI docs
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod auth;
pub mod config;
pub mod demo;
pub mod error;
pub mod meet;
pub mod metrics;
pub mod utils;

pub use config::Config;
pub use error::{Result, ServiceError};

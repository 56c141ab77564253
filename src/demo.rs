//! Pass-through call to a public demo API.

use tracing::{debug, instrument};

use crate::config::Config;
use crate::metrics;

/// Client for the configured demo endpoint.
#[derive(Debug, Clone)]
pub struct DemoClient {
    http: reqwest::Client,
    url: String,
}

impl DemoClient {
    /// Create a client from config, sharing the given HTTP client.
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            url: config.demo_api_url.clone(),
        }
    }

    /// Call the demo API and return whatever status it answered with.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch_status(&self) -> Result<u16, reqwest::Error> {
        let _timer = metrics::timer_upstream("demo");
        metrics::inc_demo_requests();

        let response = self.http.get(&self.url).send().await?;
        let status = response.status().as_u16();

        debug!(status, "Demo API responded");
        Ok(status)
    }
}

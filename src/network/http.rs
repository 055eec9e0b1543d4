//! Blocking HTTP client driven from the async runtime

use super::Fetcher;
use crate::cache::{Request, Response};
use crate::config::schema::NetworkConfig;
use crate::error::{ShellCacheError, ShellCacheResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use ureq::http::{HeaderName, HeaderValue};
use ureq::Agent;

/// HTTP fetcher backed by a `ureq` agent
#[derive(Clone)]
pub struct HttpFetcher {
    agent: Agent,
    user_agent: String,
}

impl HttpFetcher {
    /// Create a fetcher from network settings
    pub fn new(config: &NetworkConfig) -> Self {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));

        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .into();

        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }

    fn fetch_blocking(&self, request: &Request) -> ShellCacheResult<Response> {
        let url = request.url.as_str();

        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(url)
            .header("user-agent", self.user_agent.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let outbound = builder
            .body(())
            .map_err(|e| ShellCacheError::network(url, e.to_string()))?;

        let mut response = self
            .agent
            .run(outbound)
            .map_err(|e| ShellCacheError::network(url, e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| header_pair(name, value))
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| ShellCacheError::network(url, format!("reading body: {e}")))?;

        debug!("{} {} -> {} ({} bytes)", request.method, url, status, body.len());

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// Header as a string pair; bytes outside UTF-8 are replaced, not dropped
fn header_pair(name: &HeaderName, value: &HeaderValue) -> (String, String) {
    (
        name.as_str().to_string(),
        String::from_utf8_lossy(value.as_bytes()).into_owned(),
    )
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> ShellCacheResult<Response> {
        let fetcher = self.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || fetcher.fetch_blocking(&request))
            .await
            .map_err(|e| ShellCacheError::Internal(format!("fetch task failed: {e}")))?
    }
}

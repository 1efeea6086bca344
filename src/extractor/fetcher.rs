//! Page fetching
//!
//! The orchestrator only needs "markup or failure" for a URL, so fetching is
//! a trait. `HttpFetcher` is the reqwest-backed implementation used by the
//! CLI; tests substitute an in-memory map.

use std::future::Future;
use std::time::Duration;

use reqwest::Client as ReqwestClient;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::extractor::config::ExtractorConfig;
use crate::extractor::error::ExtractError;

/// Source of raw page markup
pub trait PageFetcher {
    /// Fetch `url`, giving up after `timeout`
    fn fetch(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, ExtractError>> + Send;
}

/// HTTP fetcher sending a fixed identification header
#[derive(Clone)]
pub struct HttpFetcher {
    client: ReqwestClient,
}

impl HttpFetcher {
    /// Create a fetcher using the configured user agent
    pub fn new(config: &ExtractorConfig) -> Result<Self, ExtractError> {
        let client = ReqwestClient::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(skip(self, url), fields(url = %url), level = "debug")]
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<String, ExtractError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ExtractError::UnsupportedScheme(url.scheme().to_string()));
        }

        let to_error = |e: reqwest::Error| {
            if e.is_timeout() {
                ExtractError::Timeout {
                    url: url.to_string(),
                    timeout_secs: timeout.as_secs(),
                }
            } else {
                ExtractError::Fetch {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(to_error)?;

        let status = response.status();
        if !status.is_success() {
            // Error pages are still markup and are scanned like any other page
            warn!("{} answered with status {}", url, status);
        }

        let body = response.text().await.map_err(to_error)?;
        debug!("Fetched {} bytes", body.len());
        Ok(body)
    }
}

//! Shared HTTP fetcher with bounded retry.

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{FetchConfig, RetryConfig, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::error::{Result, SourceError};

/// HTTP fetcher shared by every source of one aggregation run.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct Fetcher {
    inner: Arc<FetcherInner>,
}

struct FetcherInner {
    http: HttpClient,
    retry: RetryConfig,
}

impl Fetcher {
    /// Create a fetcher from a [`FetchConfig`]
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Self::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .retry(config.retry.clone())
            .build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::new()
    }

    /// GET a URL as text, retrying with the fetcher's policy
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.get_text_with(url, &self.inner.retry).await
    }

    /// GET a URL as text, retrying with an explicit policy.
    ///
    /// Only retryable failures (timeouts, connection errors, 429 and 5xx)
    /// are retried; anything else returns at once.
    pub async fn get_text_with(&self, url: &str, retry: &RetryConfig) -> Result<String> {
        let attempts = retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    let delay = retry.backoff_for(attempt);
                    warn!(
                        url,
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// GET a URL and decode the body as JSON
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(SourceError::Json)
    }

    async fn get_once(&self, url: &str) -> Result<String> {
        debug!(url, "GET request");

        let response = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                code: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::from_reqwest(url, &e))
    }
}

/// Builder for configuring a [`Fetcher`]
pub struct FetcherBuilder {
    timeout: Duration,
    user_agent: String,
    retry: RetryConfig,
}

impl Default for FetcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FetcherBuilder {
    /// Create a builder with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set retry configuration
    #[must_use]
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Build the fetcher
    pub fn build(self) -> Result<Fetcher> {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;

        Ok(Fetcher {
            inner: Arc::new(FetcherInner {
                http,
                retry: self.retry,
            }),
        })
    }
}

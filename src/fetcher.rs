//! Image retrieval
//!
//! [`Fetcher`] is the capability the pipeline uses to obtain the bytes behind
//! one URL. The shipped implementation, [`HttpFetcher`], performs a single
//! GET with a hard timeout and no retries. Alternative implementations
//! (retrying, caching, rate-limited) can be plugged in through
//! [`ImageDownloader::with_fetcher`](crate::ImageDownloader::with_fetcher)
//! without touching the pipeline.

use crate::config::DownloadConfig;
use crate::error::{Error, NetworkError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Trait for single-attempt URL retrieval
///
/// # Examples
///
/// ```no_run
/// use csv_image_dl::config::DownloadConfig;
/// use csv_image_dl::fetcher::{Fetcher, HttpFetcher};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::new(&DownloadConfig::default())?;
/// let bytes = fetcher.fetch("https://example.com/logo.png").await?;
/// println!("fetched {} bytes", bytes.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the full body behind `url`
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] if the URL is invalid, the connection fails,
    /// the server answers with a non-success status, or the timeout elapses.
    /// Callers must not retry automatically.
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, NetworkError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// HTTP(S) fetcher backed by a shared `reqwest` client
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher using the timeout and User-Agent from `config`
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {}", e),
                key: None,
            })?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> NetworkError {
        if e.is_timeout() {
            NetworkError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else if e.is_connect() {
            NetworkError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            }
        } else {
            NetworkError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, NetworkError> {
        let parsed = url::Url::parse(url).map_err(|e| NetworkError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(url, e)
            } else {
                NetworkError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        debug!(url, bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of a run:
//! - Building the HTTP client with the configured user agent and optional cookie jar
//! - GET requests for listing pages, classified into a `FetchResult`
//! - GET requests for image bytes, retried with exponential backoff

use crate::config::{FetchConfig, UserAgentConfig};
use reqwest::cookie::Jar;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Result of a listing page fetch
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// The server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Errors raised while downloading an image
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status_code} for {url}")]
    Status { url: String, status_code: u16 },

    #[error("Request for {url} failed: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    /// Whether another attempt could succeed
    ///
    /// Server errors, rate limiting and network failures are retried; other client
    /// errors are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::Network { .. } => true,
        }
    }
}

/// A source of image bytes
#[allow(async_fn_in_trait)]
pub trait ImageSource {
    /// Downloads the image at `url`, retrying transient failures
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `fetch` - Timeouts for every request
/// * `user_agent` - The user agent configuration
/// * `cookies` - Optional cookie jar sent with every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use page_hoard::config::{FetchConfig, UserAgentConfig};
/// use page_hoard::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default(), &UserAgentConfig::default(), None)
///     .unwrap();
/// ```
pub fn build_http_client(
    fetch: &FetchConfig,
    user_agent: &UserAgentConfig,
    cookies: Option<Arc<Jar>>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(fetch.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(jar) = cookies {
        builder = builder.cookie_provider(jar);
    }

    builder.build()
}

/// HTTP access for one run
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    image_retries: u32,
    retry_backoff: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from the fetch and user agent configuration
    pub fn new(
        fetch: &FetchConfig,
        user_agent: &UserAgentConfig,
        cookies: Option<Arc<Jar>>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(fetch, user_agent, cookies)?,
            image_retries: fetch.image_retries,
            retry_backoff: Duration::from_millis(fetch.retry_backoff_ms),
        })
    }

    /// Fetches a listing page
    ///
    /// Redirects are followed by the client. Any status outside 2xx is returned as
    /// `HttpError`; the caller decides whether that ends the walk.
    pub async fn fetch_page(&self, url: &Url) -> FetchResult {
        let response = match self.client.get(url.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                return FetchResult::NetworkError {
                    error: describe_error(&e),
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            return FetchResult::HttpError {
                status_code: status.as_u16(),
            };
        }

        let final_url = response.url().clone();
        match response.text().await {
            Ok(body) => FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                body,
            },
            Err(e) => FetchResult::NetworkError {
                error: describe_error(&e),
            },
        }
    }

    /// Single image download attempt
    async fn fetch_image_once(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            message: describe_error(&e),
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status_code: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(network)?;
        Ok(bytes.to_vec())
    }
}

impl ImageSource for HttpFetcher {
    /// Downloads an image with up to `image_retries` extra attempts
    ///
    /// The wait before retry `n` (1-based) is `retry_backoff * 2^(n-1)`.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_image_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() && attempt < self.image_retries => {
                    let wait = backoff_delay(self.retry_backoff, attempt);
                    attempt += 1;
                    tracing::debug!(
                        "Image fetch failed ({}), retry {}/{} in {:?}",
                        e,
                        attempt,
                        self.image_retries,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Backoff before the retry following failed attempt `attempt` (0-based)
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    }
}

//! HTTP fetcher implementation
//!
//! This module handles the raw HTTP side of the crawler:
//! - Building HTTP clients with the configured user agent
//! - GET requests with a per-request timeout
//! - Error classification for retry logging
//!
//! Retrying is not done here; callers wrap [`HttpFetch::get`] in a
//! [`RetryPolicy`](crate::crawler::RetryPolicy).

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Final URL after redirects
    pub final_url: String,

    /// Page body
    pub body: String,
}

/// Why a single fetch attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        let url = url.to_string();
        if e.is_timeout() {
            FetchError::Timeout { url }
        } else if e.is_connect() {
            FetchError::Connect {
                url,
                message: e.to_string(),
            }
        } else {
            FetchError::Request {
                url,
                message: e.to_string(),
            }
        }
    }
}

/// The HTTP fetch capability the crawl is built on
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Performs one GET request; non-2xx statuses are errors
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (reqwest default policy) and responses are
/// transparently decompressed.
///
/// # Example
///
/// ```no_run
/// use paper_harvest::config::UserAgentConfig;
/// use paper_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL once, classifying failures
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx | `Ok(FetchedPage)` |
/// | Any other status | `FetchError::Status` |
/// | Timeout | `FetchError::Timeout` |
/// | Connection refused / DNS | `FetchError::Connect` |
/// | Body read failure | `FetchError::Body` |
pub async fn fetch_page(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().to_string();
    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Body {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    })?;

    Ok(FetchedPage {
        status: status.as_u16(),
        final_url,
        body,
    })
}

/// [`HttpFetch`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
        fetch_page(&self.client, url, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status {
            url: "https://example.com/x".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "HTTP 503 from https://example.com/x");

        let err = FetchError::Timeout {
            url: "https://example.com/x".to_string(),
        };
        assert_eq!(err.to_string(), "request to https://example.com/x timed out");
    }

    #[tokio::test]
    async fn test_connection_refused_is_classified() {
        let fetcher = ReqwestFetcher::from_config(&UserAgentConfig::default()).unwrap();
        // Port 9 (discard) on localhost is closed in any sane test environment
        let result = fetcher
            .get("http://127.0.0.1:9/", Duration::from_secs(2))
            .await;

        assert!(matches!(
            result,
            Err(FetchError::Connect { .. }) | Err(FetchError::Request { .. })
        ));
    }
}

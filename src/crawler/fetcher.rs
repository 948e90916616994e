//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and deadlines
//! - GET requests for pages and images
//! - Classifying failures into HTTP and network errors
//!
//! The crawl core only sees the [`Fetch`] trait, so it can be driven by an
//! in-memory fetcher in tests.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::url::CrawlUri;
use reqwest::{redirect::Policy, Client};
use std::future::Future;
use std::time::Duration;

/// Maximum redirect hops followed by the HTTP client
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Successfully fetched the resource
    Success {
        /// Final URL after redirects
        final_url: String,
        /// Raw response body
        body: Vec<u8>,
    },

    /// The server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, body read failure, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Returns true if the fetch produced a body
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Describes why the fetch failed, or `None` on success
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::HttpError { status_code } => Some(format!("HTTP {}", status_code)),
            Self::NetworkError { error } => Some(error.clone()),
        }
    }
}

/// Performs a GET for a URI
///
/// Implementations never return an error: every transport outcome is a
/// [`FetchResult`] variant, which the pipelines log and skip.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, uri: &CrawlUri) -> impl Future<Output = FetchResult> + Send;
}

/// [`Fetch`] implementation backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher from the crawler and user agent configuration
    pub fn new(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(crawler, user_agent)?,
        })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, uri: &CrawlUri) -> impl Future<Output = FetchResult> + Send {
        let request = self.client.get(uri.as_str());
        async move { fetch_url(request).await }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use site_mirror::config::{CrawlerConfig, UserAgentConfig};
/// use site_mirror::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a prepared GET request and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx | `Success` with the full body |
/// | any other status | `HttpError` |
/// | timeout / connect failure / body read failure | `NetworkError` |
async fn fetch_url(request: reqwest::RequestBuilder) -> FetchResult {
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().to_string();

    match response.bytes().await {
        Ok(body) => FetchResult::Success {
            final_url,
            body: body.to_vec(),
        },
        Err(e) => classify_error(&e),
    }
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else if e.is_redirect() {
        "Too many redirects".to_string()
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}

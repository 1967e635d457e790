//! Page retrieval abstraction.
//!
//! Everything that touches the network goes through [`PageFetcher`], so the
//! search client and the page scraper can run against canned markup in tests.

mod http;

pub use http::HttpFetcher;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while fetching a page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP Error {status} for {url}")]
    Status { url: String, status: u16 },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Connection, TLS or body decoding failure.
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The URL could not be used at all.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Fetches a page body by absolute URL.
///
/// Implementations must treat any non-2xx status as an error and must not
/// retry on their own: fallback is the caller's decision.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

//! Mock page fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::fetcher::{FetchError, PageFetcher};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub timestamp: Instant,
}

#[derive(Debug, Clone)]
enum MockResponse {
    Page(String),
    Error(FetchError),
}

/// Mock implementation of the PageFetcher trait.
///
/// Serves canned pages by exact URL. Any URL without a configured response
/// answers with a 404 status error. Setters are synchronous so fixtures can
/// be installed from plain `#[test]` functions.
///
/// # Example
///
/// ```rust,ignore
/// use meanworld_core::testing::{fixtures, MockFetcher};
///
/// let fetcher = MockFetcher::new();
/// fetcher.set_page("https://megasite.meanworld.com/scenes/A_vids.html", html);
/// fetcher.set_status("https://megasite.meanworld.com/scenes/B_vids.html", 500);
///
/// // ... run the code under test ...
///
/// assert_eq!(fetcher.request_count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`.
    pub fn set_page(&self, url: &str, html: impl Into<String>) {
        self.responses
            .write()
            .unwrap()
            .insert(url.to_string(), MockResponse::Page(html.into()));
    }

    /// Answer `url` with an HTTP error status.
    pub fn set_status(&self, url: &str, status: u16) {
        self.set_error(
            url,
            FetchError::Status {
                url: url.to_string(),
                status,
            },
        );
    }

    /// Answer `url` with an arbitrary fetch error.
    pub fn set_error(&self, url: &str, error: FetchError) {
        self.responses
            .write()
            .unwrap()
            .insert(url.to_string(), MockResponse::Error(error));
    }

    /// Get recorded requests in the order they were made.
    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().unwrap().clone()
    }

    /// URLs requested, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.recorded_requests().into_iter().map(|r| r.url).collect()
    }

    /// Get the number of fetches performed.
    pub fn request_count(&self) -> usize {
        self.requests.read().unwrap().len()
    }

    /// Number of fetches for one URL.
    pub fn requests_for(&self, url: &str) -> usize {
        self.requests
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    /// Clear recorded requests.
    pub fn clear_recorded(&self) {
        self.requests.write().unwrap().clear();
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.write().unwrap().push(RecordedRequest {
            url: url.to_string(),
            timestamp: Instant::now(),
        });

        match self.responses.read().unwrap().get(url) {
            Some(MockResponse::Page(html)) => Ok(html.clone()),
            Some(MockResponse::Error(error)) => Err(error.clone()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

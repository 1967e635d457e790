//! Scene search against the site's search endpoint.
//!
//! This module provides a [`SearchClient`] that pages through search results,
//! parses listing containers into partial records and ranks them by title
//! similarity.

mod listing;
mod ranker;

pub use listing::{extract_search_result_data, parse_search_page, ListingPatterns, SearchPage};
pub use ranker::{rank, relevance_score, similarity_ratio};

use std::sync::Arc;

use tracing::{debug, error};

use crate::config::{SearchConfig, SiteConfig};
use crate::fetcher::PageFetcher;
use crate::scene::SearchResult;

/// Pages through site search results.
#[derive(Clone)]
pub struct SearchClient {
    fetcher: Arc<dyn PageFetcher>,
    search_url: String,
    patterns: ListingPatterns,
    max_pages: u32,
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("fetcher", &"<fetcher>")
            .field("search_url", &self.search_url)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl SearchClient {
    pub fn new(fetcher: Arc<dyn PageFetcher>, site: &SiteConfig, search: &SearchConfig) -> Self {
        Self {
            fetcher,
            search_url: site.search_url(),
            patterns: ListingPatterns::new(site),
            max_pages: search.max_pages,
        }
    }

    /// Search URL for one page. The page parameter is omitted for page 1.
    pub fn build_search_url(&self, query: &str, page: u32) -> String {
        let mut url = format!("{}?query={}", self.search_url, urlencoding::encode(query));
        if page > 1 {
            url.push_str(&format!("&page={}", page));
        }
        url
    }

    /// Fetch result pages in order and return their listings concatenated,
    /// unranked.
    ///
    /// Paging stops after a page containing an exact title match, after a page
    /// with no results, or at `max_pages`. A page that fails to load counts as
    /// an empty page.
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        let mut results = Vec::new();

        for page_number in 1..=self.max_pages {
            let page = self.fetch_page(query, page_number).await;
            let found = page.results.len();
            results.extend(page.results);

            if page.has_exact_match {
                debug!(page = page_number, "Exact match found, stopping search");
                break;
            }
            if found == 0 {
                break;
            }
        }

        results
    }

    /// Operation-level search: trims the name, searches and ranks by
    /// relevance. Blank names yield no results.
    pub async fn search_scenes_by_name(&self, name: &str) -> Vec<SearchResult> {
        let name = name.trim();
        if name.is_empty() {
            error!("Invalid search name: empty");
            return Vec::new();
        }

        let results = rank(self.search(name).await, name);

        if let Some(first) = results.first() {
            debug!(
                results = results.len(),
                first_title = %first.title,
                "Search complete"
            );
        } else {
            debug!(query = name, "Search returned no results");
        }

        results
    }

    async fn fetch_page(&self, query: &str, page: u32) -> SearchPage {
        let url = self.build_search_url(query, page);

        match self.fetcher.fetch(&url).await {
            Ok(html) => parse_search_page(&html, query, &self.patterns),
            Err(e) => {
                error!(page = page, error = %e, "Error fetching search page");
                SearchPage::default()
            }
        }
    }
}

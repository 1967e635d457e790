//! Scene resolution: turn a partial fragment into a full record.
//!
//! Resolution tries each candidate URL on the configured site first, then
//! falls back to a title search. When neither yields a record the fragment
//! is handed back unchanged.

mod page;

pub use page::{PageScraper, DEFAULT_CACHE_TTL};

use thiserror::Error;
use tracing::{debug, info};

use crate::fetcher::FetchError;
use crate::scene::{titles_match, ResolvedScene, SceneFragment, SceneRecord, SearchResult};

/// Errors from a full-page scrape.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to fetch scene page: {0}")]
    Fetch(#[from] FetchError),
}

/// Resolves fragments against the site.
#[derive(Debug)]
pub struct SceneResolver {
    scraper: PageScraper,
    site_host: Option<String>,
}

impl SceneResolver {
    pub fn new(scraper: PageScraper, site_host: Option<String>) -> Self {
        Self { scraper, site_host }
    }

    pub fn scraper(&self) -> &PageScraper {
        &self.scraper
    }

    /// Resolve `fragment` into a record.
    ///
    /// Failures while trying candidate URLs only move on to the next
    /// candidate. A failure scraping the search pick is returned.
    pub async fn resolve(
        &self,
        fragment: &SceneFragment,
        prefer_exact_match: bool,
    ) -> Result<ResolvedScene, ScrapeError> {
        if let Some(record) = self.resolve_by_url(fragment).await {
            return Ok(ResolvedScene::Record(record));
        }

        let Some(title) = fragment.search_title() else {
            debug!("Fragment has no title or file name, returning it unchanged");
            return Ok(ResolvedScene::Unresolved(fragment.clone()));
        };

        let results = self
            .scraper
            .search_client()
            .search_scenes_by_name(&title)
            .await;

        let Some(chosen) = choose_result(&results, &title, prefer_exact_match) else {
            info!(title = %title, "No search results, returning fragment unchanged");
            return Ok(ResolvedScene::Unresolved(fragment.clone()));
        };

        debug!(title = %title, chosen = %chosen.title, url = %chosen.url, "Scraping search pick");
        let record = self.scraper.scrape_scene_url(&chosen.url).await?;
        Ok(ResolvedScene::Record(record))
    }

    async fn resolve_by_url(&self, fragment: &SceneFragment) -> Option<SceneRecord> {
        for url in fragment.candidate_urls() {
            if !self.is_site_url(&url) {
                debug!(url = %url, "Skipping URL for another site");
                continue;
            }

            match self.scraper.scrape_scene_url(&url).await {
                Ok(record) if record.has_title() => return Some(record),
                Ok(_) => debug!(url = %url, "Scraped page has no title, trying next URL"),
                Err(e) => debug!(url = %url, error = %e, "Scrape failed, trying next URL"),
            }
        }
        None
    }

    /// Only `http(s)` URLs whose host is the configured site host.
    fn is_site_url(&self, url: &str) -> bool {
        let Some(site_host) = self.site_host.as_deref() else {
            return false;
        };
        if !url.starts_with("http") {
            return false;
        }
        reqwest::Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(|h| h.eq_ignore_ascii_case(site_host)))
            .unwrap_or(false)
    }
}

/// Pick the search result to scrape from ranked `results`.
pub fn choose_result<'a>(
    results: &'a [SearchResult],
    title: &str,
    prefer_exact_match: bool,
) -> Option<&'a SearchResult> {
    if prefer_exact_match {
        if let Some(exact) = results.iter().find(|r| titles_match(&r.title, title)) {
            return Some(exact);
        }
    }
    results.first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::{SearchConfig, SiteConfig};
    use crate::search::SearchClient;
    use crate::testing::MockFetcher;

    fn resolver(fetcher: &Arc<MockFetcher>) -> SceneResolver {
        let site = SiteConfig::default();
        let search = SearchClient::new(fetcher.clone(), &site, &SearchConfig::default());
        let scraper = PageScraper::new(fetcher.clone(), search, &site);
        SceneResolver::new(scraper, site.host())
    }

    #[test]
    fn test_choose_result() {
        let results = vec![
            SearchResult::new("Boss Lady Returns", "u1"),
            SearchResult::new("boss lady", "u2"),
        ];
        assert_eq!(choose_result(&results, "Boss Lady", false).unwrap().url, "u1");
        assert_eq!(choose_result(&results, "Boss Lady", true).unwrap().url, "u2");
        assert_eq!(choose_result(&results, "Nothing", true).unwrap().url, "u1");
        assert!(choose_result(&[], "x", true).is_none());
    }

    #[test]
    fn test_is_site_url() {
        let fetcher = Arc::new(MockFetcher::new());
        let resolver = resolver(&fetcher);
        assert!(resolver.is_site_url("https://megasite.meanworld.com/scenes/A_vids.html"));
        assert!(resolver.is_site_url("http://MEGASITE.meanworld.com/x"));
        assert!(!resolver.is_site_url("https://example.com/megasite.meanworld.com/x"));
        assert!(!resolver.is_site_url("https://megasite.meanworld.com.evil.net/x"));
        assert!(!resolver.is_site_url("ftp://megasite.meanworld.com/x"));
        assert!(!resolver.is_site_url("megasite.meanworld.com/x"));
    }

    #[test]
    fn test_no_site_host_accepts_nothing() {
        let fetcher = Arc::new(MockFetcher::new());
        let site = SiteConfig::default();
        let search = SearchClient::new(fetcher.clone(), &site, &SearchConfig::default());
        let resolver = SceneResolver::new(PageScraper::new(fetcher.clone(), search, &site), None);
        assert!(!resolver.is_site_url("https://megasite.meanworld.com/x"));
    }

    #[tokio::test]
    async fn test_fragment_without_anything_is_returned() {
        let fetcher = Arc::new(MockFetcher::new());
        let fragment: SceneFragment =
            serde_json::from_value(serde_json::json!({"id": "12", "rating": 5})).unwrap();

        let resolved = resolver(&fetcher).resolve(&fragment, true).await.unwrap();
        assert_eq!(resolved, ResolvedScene::Unresolved(fragment));
        assert_eq!(fetcher.request_count(), 0);
    }
}

//! Full-page scene and gallery scrapes.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::ScrapeError;
use crate::cache::{scene_key, ScrapeCache};
use crate::config::SiteConfig;
use crate::extract::{extract_page_fields, PageFields};
use crate::fetcher::PageFetcher;
use crate::scene::SceneRecord;
use crate::search::SearchClient;

/// Default lifetime of a cached scrape.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Fetches one detail page and turns it into a [`SceneRecord`].
pub struct PageScraper {
    fetcher: Arc<dyn PageFetcher>,
    search: SearchClient,
    site: SiteConfig,
    cache: Option<Arc<dyn ScrapeCache>>,
    cache_ttl: Duration,
}

impl PageScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, search: SearchClient, site: &SiteConfig) -> Self {
        Self {
            fetcher,
            search,
            site: site.clone(),
            cache: None,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Read scene scrapes through `cache`, keeping entries for `ttl`.
    pub fn with_cache(mut self, cache: Arc<dyn ScrapeCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    pub fn search_client(&self) -> &SearchClient {
        &self.search
    }

    /// Whether scene scrapes go through a cache.
    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Scrape a scene page. Fails only when the page cannot be fetched.
    pub async fn scrape_scene_url(&self, url: &str) -> Result<SceneRecord, ScrapeError> {
        let key = scene_key(url);

        if let Some(record) = self.cached(&key) {
            debug!(url, "Scene scrape served from cache");
            return Ok(record);
        }

        let html = self.fetcher.fetch(url).await?;
        // Parsed document is dropped inside this call, before any await.
        let fields = extract_page_fields(&html, &self.site.base_url);
        let record = self.build_record(url, fields).await;

        self.store(&key, &record);
        Ok(record)
    }

    /// Scrape a gallery page: the scene scrape with the credit moved to
    /// `photographer`.
    pub async fn scrape_gallery_url(&self, url: &str) -> Result<SceneRecord, ScrapeError> {
        Ok(self.scrape_scene_url(url).await?.into_gallery())
    }

    async fn build_record(&self, url: &str, fields: PageFields) -> SceneRecord {
        let PageFields {
            title,
            details,
            studio_name,
            performers,
            image,
            embedded_thumbnail,
            date,
            tags,
            code,
        } = fields;

        let image = match image {
            Some(image) => Some(image),
            None => self
                .image_from_search(title.as_deref())
                .await
                .or(embedded_thumbnail),
        };

        if title.is_none() {
            debug!(url, "Scene page has no title");
        }

        SceneRecord::builder(url)
            .title(title)
            .details(details)
            .studio(studio_name, self.site.studio_url.clone())
            .performers(performers)
            .image(image)
            .date(date)
            .tags(tags)
            .code(code)
            .director(self.site.credit.clone())
            .build()
    }

    /// Borrow the top search hit's thumbnail. Search never scrapes, so this
    /// cannot recurse.
    async fn image_from_search(&self, title: Option<&str>) -> Option<String> {
        let title = title?;
        let results = self.search.search_scenes_by_name(title).await;
        let image = results.into_iter().next()?.image;
        if image.is_some() {
            debug!(title, "Image taken from search listing");
        }
        image
    }

    fn cached(&self, key: &str) -> Option<SceneRecord> {
        let cache = self.cache.as_ref()?;
        let raw = match cache.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Scrape cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(key, error = %e, "Discarding unreadable cache entry");
                None
            }
        }
    }

    fn store(&self, key: &str, record: &SceneRecord) {
        let Some(cache) = &self.cache else {
            return;
        };

        let raw = match serde_json::to_string(record) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Could not serialize record for cache");
                return;
            }
        };

        if let Err(e) = cache.set(key, &raw, self.cache_ttl) {
            warn!(key, error = %e, "Scrape cache write failed");
        }
    }
}

impl std::fmt::Debug for PageScraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageScraper")
            .field("search", &self.search)
            .field("base_url", &self.site.base_url)
            .field("cached", &self.cache.is_some())
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, MemoryScrapeCache};
    use crate::config::SearchConfig;
    use crate::fetcher::FetchError;
    use crate::scene::NamedEntry;
    use crate::testing::fixtures::{self, Listing, ListingImage, ScenePage};
    use crate::testing::MockFetcher;

    fn scraper(fetcher: &Arc<MockFetcher>) -> PageScraper {
        let site = SiteConfig::default();
        let search = SearchClient::new(fetcher.clone(), &site, &SearchConfig::default());
        PageScraper::new(fetcher.clone(), search, &site)
    }

    fn search_url(scraper: &PageScraper, query: &str) -> String {
        scraper.search_client().build_search_url(query, 1)
    }

    #[tokio::test]
    async fn test_scrape_scene_url_full_record() {
        let fetcher = Arc::new(MockFetcher::new());
        let url = fixtures::scene_url("Boss-Lady");
        fetcher.set_page(
            &url,
            fixtures::scene_page(&ScenePage {
                title: "Boss &amp;amp; Lady",
                performers: &["Alice"],
                tags: &["Heels", "Office"],
                date: Some("4/9/2019"),
                og_image: Some("/meanbitches/content/contentthumbs/02/03/0203-1x.jpg"),
                code: Some("MB0203"),
                ..ScenePage::default()
            }),
        );

        let record = scraper(&fetcher).scrape_scene_url(&url).await.unwrap();

        assert_eq!(record.url.as_deref(), Some(url.as_str()));
        assert_eq!(record.title.as_deref(), Some("Boss & Lady"));
        assert_eq!(record.performers, vec![NamedEntry::new("Alice")]);
        assert_eq!(record.tags.len(), 2);
        assert_eq!(record.date.as_deref(), Some("2019-04-09"));
        assert_eq!(record.code.as_deref(), Some("MB0203"));
        assert_eq!(
            record.image.as_deref(),
            Some("https://megasite.meanworld.com/content//contentthumbs/02/03/0203-4x.jpg")
        );
        let studio = record.studio.unwrap();
        assert_eq!(studio.name.as_deref(), Some("Mean Bitches"));
        assert_eq!(studio.url.as_deref(), Some("https://www.meanbitches.com/"));
        assert_eq!(record.director.as_deref(), Some("Glenn King"));
        assert!(record.photographer.is_none());
        // og:image hit, so no search was issued.
        assert_eq!(fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn test_studio_url_set_without_studio_name() {
        let fetcher = Arc::new(MockFetcher::new());
        let url = fixtures::scene_url("No-Studio");
        fetcher.set_page(
            &url,
            fixtures::scene_page(&ScenePage {
                title: "No Studio",
                studio: None,
                og_image: Some("/x.jpg"),
                ..ScenePage::default()
            }),
        );

        let record = scraper(&fetcher).scrape_scene_url(&url).await.unwrap();
        let studio = record.studio.unwrap();
        assert!(studio.name.is_none());
        assert_eq!(studio.url.as_deref(), Some("https://www.meanbitches.com/"));
    }

    #[tokio::test]
    async fn test_image_falls_back_to_search_listing() {
        let fetcher = Arc::new(MockFetcher::new());
        let scraper = scraper(&fetcher);
        let url = fixtures::scene_url("Quiet-Scene");
        fetcher.set_page(
            &url,
            fixtures::scene_page(&ScenePage {
                title: "Quiet Scene",
                embedded_thumbnail: Some("/player/quiet.jpg"),
                ..ScenePage::default()
            }),
        );
        fetcher.set_page(
            &search_url(&scraper, "Quiet Scene"),
            fixtures::search_page(&[Listing {
                image: Some(ListingImage::Img("/content/quiet-2x.jpg")),
                ..Listing::new("Quiet Scene", "Quiet-Scene")
            }]),
        );

        let record = scraper.scrape_scene_url(&url).await.unwrap();
        assert_eq!(
            record.image.as_deref(),
            Some("https://megasite.meanworld.com/content/quiet-2x.jpg")
        );
        // Scene page plus exactly one search page; the listing is not scraped.
        assert_eq!(fetcher.request_count(), 2);
    }

    #[tokio::test]
    async fn test_image_falls_back_to_embedded_thumbnail() {
        let fetcher = Arc::new(MockFetcher::new());
        let url = fixtures::scene_url("Player-Only");
        fetcher.set_page(
            &url,
            fixtures::scene_page(&ScenePage {
                title: "Player Only",
                embedded_thumbnail: Some("/player/only.jpg"),
                ..ScenePage::default()
            }),
        );

        let record = scraper(&fetcher).scrape_scene_url(&url).await.unwrap();
        assert_eq!(
            record.image.as_deref(),
            Some("https://megasite.meanworld.com/player/only.jpg")
        );
    }

    #[tokio::test]
    async fn test_preview_thumb_beats_search() {
        let fetcher = Arc::new(MockFetcher::new());
        let url = fixtures::scene_url("Preview");
        fetcher.set_page(
            &url,
            fixtures::scene_page(&ScenePage {
                title: "Preview",
                preview_thumb: Some("/content/preview.jpg"),
                ..ScenePage::default()
            }),
        );

        let record = scraper(&fetcher).scrape_scene_url(&url).await.unwrap();
        assert_eq!(
            record.image.as_deref(),
            Some("https://megasite.meanworld.com/content/preview.jpg")
        );
        assert_eq!(fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn test_scrape_fails_on_http_error() {
        let fetcher = Arc::new(MockFetcher::new());
        let url = fixtures::scene_url("Gone");
        fetcher.set_status(&url, 404);

        let err = scraper(&fetcher).scrape_scene_url(&url).await.unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::Fetch(FetchError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_gallery_moves_credit_to_photographer() {
        let fetcher = Arc::new(MockFetcher::new());
        let url = "https://megasite.meanworld.com/gallery/Set_highres.html";
        fetcher.set_page(
            url,
            fixtures::scene_page(&ScenePage {
                title: "Photo Set",
                og_image: Some("/g.jpg"),
                ..ScenePage::default()
            }),
        );

        let record = scraper(&fetcher).scrape_gallery_url(url).await.unwrap();
        assert!(record.director.is_none());
        assert_eq!(record.photographer.as_deref(), Some("Glenn King"));
        assert_eq!(record.title.as_deref(), Some("Photo Set"));
    }

    #[tokio::test]
    async fn test_cached_scrape_skips_network() {
        let fetcher = Arc::new(MockFetcher::new());
        let cache = Arc::new(MemoryScrapeCache::new());
        let scraper = scraper(&fetcher).with_cache(cache.clone(), Duration::from_secs(60));
        let url = fixtures::scene_url("Cached");
        fetcher.set_page(
            &url,
            fixtures::scene_page(&ScenePage {
                title: "Cached",
                og_image: Some("/c.jpg"),
                ..ScenePage::default()
            }),
        );

        let first = scraper.scrape_scene_url(&url).await.unwrap();
        let second = scraper.scrape_scene_url(&url).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.requests_for(&url), 1);
        assert!(cache.get(&scene_key(&url)).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_scrape_is_not_cached() {
        let fetcher = Arc::new(MockFetcher::new());
        let cache = Arc::new(MemoryScrapeCache::new());
        let scraper = scraper(&fetcher).with_cache(cache.clone(), Duration::from_secs(60));
        let url = fixtures::scene_url("Down");
        fetcher.set_status(&url, 503);

        assert!(scraper.scrape_scene_url(&url).await.is_err());
        assert!(scraper.scrape_scene_url(&url).await.is_err());
        assert_eq!(fetcher.requests_for(&url), 2);
        assert!(cache.is_empty());
    }

    struct BrokenCache;

    impl ScrapeCache for BrokenCache {
        fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Database("disk I/O error".to_string()))
        }
        fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Database("disk I/O error".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<(), CacheError> {
            Ok(())
        }
        fn purge_expired(&self) -> Result<u32, CacheError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_cache_failures_do_not_fail_scrape() {
        let fetcher = Arc::new(MockFetcher::new());
        let scraper = scraper(&fetcher).with_cache(Arc::new(BrokenCache), DEFAULT_CACHE_TTL);
        let url = fixtures::scene_url("Resilient");
        fetcher.set_page(
            &url,
            fixtures::scene_page(&ScenePage {
                title: "Resilient",
                og_image: Some("/r.jpg"),
                ..ScenePage::default()
            }),
        );

        let record = scraper.scrape_scene_url(&url).await.unwrap();
        assert_eq!(record.title.as_deref(), Some("Resilient"));
    }
}

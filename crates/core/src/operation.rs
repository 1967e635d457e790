//! Operation dispatch for the scraper binary.
//!
//! The host invokes the scraper with an operation name and a JSON document
//! on stdin. This module maps the name to a resolver call and shapes the
//! JSON in and out; the binary only does I/O and exit codes.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{MemoryScrapeCache, ScrapeCache, SqliteScrapeCache};
use crate::config::Config;
use crate::fetcher::{FetchError, HttpFetcher, PageFetcher};
use crate::resolver::{PageScraper, SceneResolver, ScrapeError};
use crate::scene::SceneFragment;
use crate::search::SearchClient;

/// Exit status the host reads as "bad input".
pub const INPUT_ERROR_EXIT: i32 = 69;

/// Scraper operations, named as the host passes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ScrapeSceneUrl,
    ScrapeGalleryUrl,
    SearchScenes,
    QueryScene,
    EnrichScene,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::ScrapeSceneUrl,
        Operation::ScrapeGalleryUrl,
        Operation::SearchScenes,
        Operation::QueryScene,
        Operation::EnrichScene,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::ScrapeSceneUrl => "scrapeSceneURL",
            Operation::ScrapeGalleryUrl => "scrapeGalleryURL",
            Operation::SearchScenes => "searchScenes",
            Operation::QueryScene => "queryScene",
            Operation::EnrichScene => "enrichScene",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| OperationError::UnknownOperation(s.to_string()))
    }
}

/// Errors from running an operation.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("No input on stdin")]
    EmptyInput,

    #[error("Invalid JSON input: {0}")]
    InvalidJson(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

impl OperationError {
    /// Bad input from the host, as opposed to a failure while scraping.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, OperationError::Scrape(_))
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_input_error() {
            INPUT_ERROR_EXIT
        } else {
            1
        }
    }
}

/// Everything one operation needs, wired from config.
#[derive(Debug)]
pub struct OperationContext {
    resolver: SceneResolver,
}

impl OperationContext {
    /// Wire the pipeline over `fetcher`, reading scrapes through `cache`
    /// when given.
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        config: &Config,
        cache: Option<Arc<dyn ScrapeCache>>,
    ) -> Self {
        let search = SearchClient::new(Arc::clone(&fetcher), &config.site, &config.search);
        let mut scraper = PageScraper::new(fetcher, search, &config.site);
        if let Some(cache) = cache {
            scraper = scraper.with_cache(cache, Duration::from_secs(config.cache.ttl_secs));
        }

        Self {
            resolver: SceneResolver::new(scraper, config.site.host()),
        }
    }

    /// Production wiring: HTTP fetcher plus the on-disk cache. A cache that
    /// cannot be opened is logged and replaced by an in-process one.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.http)?);

        let cache: Option<Arc<dyn ScrapeCache>> = if config.cache.enabled {
            match SqliteScrapeCache::new(&config.cache.path) {
                Ok(cache) => {
                    if let Err(e) = cache.purge_expired() {
                        warn!(error = %e, "Failed to purge expired cache entries");
                    }
                    Some(Arc::new(cache))
                }
                Err(e) => {
                    warn!(
                        path = %config.cache.path.display(),
                        error = %e,
                        "Could not open scrape cache, using in-memory cache"
                    );
                    Some(Arc::new(MemoryScrapeCache::new()))
                }
            }
        } else {
            None
        };

        Ok(Self::new(fetcher, config, cache))
    }

    pub fn resolver(&self) -> &SceneResolver {
        &self.resolver
    }

    /// Run `operation` against raw stdin text and return the JSON to print.
    pub async fn run(&self, operation: Operation, input: &str) -> Result<Value, OperationError> {
        let input = parse_input(input)?;
        info!(operation = %operation, "Running operation");

        let scraper = self.resolver.scraper();
        let output = match operation {
            Operation::ScrapeSceneUrl => {
                let url = required_str(&input, "url")?;
                to_value(&scraper.scrape_scene_url(url).await?)
            }
            Operation::ScrapeGalleryUrl => {
                let url = required_str(&input, "url")?;
                to_value(&scraper.scrape_gallery_url(url).await?)
            }
            Operation::SearchScenes => {
                let name = required_str(&input, "name")?;
                to_value(&scraper.search_client().search_scenes_by_name(name).await)
            }
            Operation::QueryScene => {
                let fragment = parse_fragment(input)?;
                to_value(&self.resolver.resolve(&fragment, false).await?)
            }
            Operation::EnrichScene => {
                let fragment = parse_fragment(input)?;
                to_value(&self.resolver.resolve(&fragment, true).await?)
            }
        };

        Ok(output)
    }
}

/// Decode stdin into a JSON object.
pub fn parse_input(input: &str) -> Result<Value, OperationError> {
    if input.trim().is_empty() {
        return Err(OperationError::EmptyInput);
    }
    let value: Value =
        serde_json::from_str(input).map_err(|e| OperationError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(OperationError::InvalidJson(
            "expected a JSON object".to_string(),
        ));
    }
    Ok(value)
}

fn required_str<'a>(input: &'a Value, field: &'static str) -> Result<&'a str, OperationError> {
    input
        .get(field)
        .and_then(Value::as_str)
        .ok_or(OperationError::MissingField(field))
}

fn parse_fragment(input: Value) -> Result<SceneFragment, OperationError> {
    serde_json::from_value(input).map_err(|e| OperationError::InvalidJson(e.to_string()))
}

// Records and fragments are plain data; serializing them cannot fail.
fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

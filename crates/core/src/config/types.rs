use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub stash: StashConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The scraped site.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Site root, no trailing slash (e.g. "https://megasite.meanworld.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the search endpoint, relative to `base_url`
    #[serde(default = "default_search_path")]
    pub search_path: String,
    /// Canonical studio URL attached to every scraped record
    #[serde(default = "default_studio_url")]
    pub studio_url: String,
    /// Director/photographer credit attached to every scraped record
    #[serde(default = "default_credit")]
    pub credit: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_path: default_search_path(),
            studio_url: default_studio_url(),
            credit: default_credit(),
        }
    }
}

impl SiteConfig {
    /// Host part of `base_url` ("megasite.meanworld.com").
    pub fn host(&self) -> Option<String> {
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
    }

    /// Absolute search endpoint URL.
    pub fn search_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.search_path
        )
    }
}

fn default_base_url() -> String {
    "https://megasite.meanworld.com".to_string()
}

fn default_search_path() -> String {
    "/search.php".to_string()
}

fn default_studio_url() -> String {
    "https://www.meanbitches.com/".to_string()
}

fn default_credit() -> String {
    "Glenn King".to_string()
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("meanworld-scraper/{}", env!("CARGO_PKG_VERSION"))
}

/// Search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Upper bound on result pages fetched per search (default: 5)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
        }
    }
}

fn default_max_pages() -> u32 {
    5
}

/// Scrape cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// SQLite database file
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    /// Entry lifetime in seconds (default: 3600)
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            path: default_cache_path(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("meanworld-cache.db")
}

fn default_cache_ttl() -> u64 {
    3600
}

/// Stash GraphQL endpoint used by the performer image tool
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StashConfig {
    #[serde(default = "default_stash_url")]
    pub url: String,
    /// Sent as the `ApiKey` header when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            url: default_stash_url(),
            api_key: None,
        }
    }
}

fn default_stash_url() -> String {
    "http://localhost:9999/graphql".to_string()
}

/// Logging configuration. `RUST_LOG` takes precedence over `filter`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

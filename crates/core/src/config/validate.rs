use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Site base URL is an absolute http(s) URL
/// - HTTP timeout is not 0
/// - Search fetches at least one page
/// - Cache TTL is not 0 when the cache is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.site.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "site.base_url cannot be empty".to_string(),
        ));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "site.base_url must be an http(s) URL, got '{}'",
            base_url
        )));
    }
    if config.site.host().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "site.base_url has no host: '{}'",
            base_url
        )));
    }

    if config.http.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "http.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.search.max_pages == 0 {
        return Err(ConfigError::ValidationError(
            "search.max_pages cannot be 0".to_string(),
        ));
    }

    if config.cache.enabled && config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.ttl_secs cannot be 0 while the cache is enabled".to_string(),
        ));
    }

    Ok(())
}

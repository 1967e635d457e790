//! Shared plumbing for the scraper binaries: config, logging and stdin.
//!
//! Stdout carries exactly one JSON document per run, so all logging goes to
//! stderr.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use meanworld_core::config::LoggingConfig;
use meanworld_core::{load_config, load_default_config, validate_config, Config, LogFormat};

/// Config file picked up from the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "meanworld.toml";

/// Install the global subscriber. `RUST_LOG` overrides the configured filter.
pub fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    // A second init (tests, embedding) is not an error worth failing over.
    let _ = match logging.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
}

/// Resolve and load configuration.
///
/// An explicitly named file must exist. Otherwise `meanworld.toml` in the
/// working directory is used when present, and built-in defaults when not.
/// `MEANWORLD_*` environment variables override either.
pub fn load_settings(explicit: Option<&Path>) -> Result<Config> {
    let config = match config_path(explicit) {
        Some(path) => load_config(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => load_default_config().context("Failed to load default config")?,
    };

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}

/// Read all of stdin as UTF-8.
pub fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    Ok(input)
}

/// One operation per process: a current-thread runtime is enough.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

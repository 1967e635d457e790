//! Set a performer's profile picture from a tagged image in Stash.
//!
//! Reads an image fragment (`{"id": …}`) on stdin and always answers `{}`.
//! Skipped images exit 0; transport or GraphQL failures exit 1.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::error;

use meanworld_cli::{init_logging, load_settings, read_stdin, runtime};
use meanworld_core::config::LoggingConfig;
use meanworld_core::{apply_image_to_performer, image_id_from_input, StashClient};

#[derive(Parser)]
#[command(name = "performer-image-scraper")]
#[command(about = "Use a Stash image as its performer's profile picture")]
#[command(version)]
struct Cli {
    /// Config file (default: ./meanworld.toml if present)
    #[arg(short, long, env = "MEANWORLD_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_settings(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&LoggingConfig::default());
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging);

    let result = read_stdin().and_then(|input| {
        // Malformed input is just another way of carrying no image id.
        let input: serde_json::Value = serde_json::from_str(&input).unwrap_or_default();
        let image_id = image_id_from_input(&input);

        let client =
            StashClient::new(&config.stash, &config.http).context("Failed to create Stash client")?;
        let rt = runtime()?;
        rt.block_on(apply_image_to_performer(&client, image_id.as_deref()))
            .context("Stash request failed")
    });

    match result {
        Ok(_) => {
            println!("{{}}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

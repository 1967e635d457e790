//! Scene scraper invoked by the host application.
//!
//! Usage: `meanworld-scraper <operation> < input.json`

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::error;

use meanworld_cli::{init_logging, load_settings, read_stdin, runtime};
use meanworld_core::config::LoggingConfig;
use meanworld_core::{Operation, OperationContext, INPUT_ERROR_EXIT};

#[derive(Parser)]
#[command(name = "meanworld-scraper")]
#[command(about = "Scrape scene metadata from megasite.meanworld.com")]
#[command(version)]
struct Cli {
    /// scrapeSceneURL, scrapeGalleryURL, searchScenes, queryScene or enrichScene
    operation: Operation,

    /// Config file (default: ./meanworld.toml if present)
    #[arg(short, long, env = "MEANWORLD_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            init_logging(&LoggingConfig::default());
            error!("Invalid invocation: {}", e.render());
            return exit_code(INPUT_ERROR_EXIT);
        }
    };

    let config = match load_settings(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&LoggingConfig::default());
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging);

    let input = match read_stdin() {
        Ok(input) => input,
        Err(e) => {
            error!("{:#}", e);
            return exit_code(INPUT_ERROR_EXIT);
        }
    };

    let result = runtime().and_then(|rt| {
        let context =
            OperationContext::from_config(&config).context("Failed to create HTTP fetcher")?;
        Ok(rt.block_on(context.run(cli.operation, &input)))
    });

    match result {
        Ok(Ok(output)) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!(operation = %cli.operation, "{}", e);
            exit_code(e.exit_code())
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

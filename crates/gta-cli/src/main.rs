//! gta - Grant Temporary Access
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`GTA_*`)
//! 3. Config file (`--config <path>`, else `~/.gta.yaml`)
//! 4. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `GTA_PROJECT`: Project ID
//! - `GTA_USER`: Member to grant to (defaults to the current credentials)
//! - `GTA_TTL`: Grant duration, e.g. `30m`, `1h30m`
//! - `GTA_VERBOSITY`: Log level (`debug`, `info`, `warn`, `error`)
//! - `GTA_FORMAT`: Log format (`plain`, `json`)
//! - `GTA_ENDPOINT`: Cloud Resource Manager base URL
//! - `GTA_USERINFO_ENDPOINT`: OAuth2 userinfo URL
//! - `GTA_ACCESS_TOKEN`: Bearer token; `gcloud auth print-access-token` is used otherwise
//! - `GTA_TIMEOUT`: HTTP request timeout

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};

use gta_cli::{commands, logging, Cli, ConfigLoader};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_file(path);
    }
    let config = match loader.load(&cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(config.verbosity, config.format) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    if let Some(path) = &config.source_file {
        debug!(path = %path.display(), "Using config file");
    }

    match commands::run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

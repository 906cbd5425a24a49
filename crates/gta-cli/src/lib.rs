//! Library half of the `gta` binary: argument parsing, configuration
//! layering, logging setup and the subcommand handlers.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use cli::{Cli, Command};
pub use config::{ConfigError, ConfigLoader, GtaConfig, LogFormat, Overrides, Verbosity};

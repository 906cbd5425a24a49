//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Overrides;

/// Grant Temporary Access - manage temporary IAM roles on Google Cloud
///
/// Roles granted by `gta grant` carry an expiry condition and are revoked
/// when the program is interrupted.
#[derive(Parser, Debug)]
#[command(name = "gta")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (default is $HOME/.gta.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, global = true, value_name = "LEVEL")]
    pub verbosity: Option<String>,

    /// Log format (plain, json)
    #[arg(long, global = true, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Quiet mode, only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Grant temporary roles and revoke them on interrupt
    Grant(GrantArgs),
    /// List temporary role bindings
    List(ListArgs),
    /// Remove temporary role bindings
    Clean(CleanArgs),
}

#[derive(Args, Debug)]
pub struct GrantArgs {
    /// Roles to grant, e.g. `viewer` or `roles/storage.admin`
    #[arg(required = true, value_name = "ROLE")]
    pub roles: Vec<String>,

    /// Project ID
    #[arg(short, long)]
    pub project: Option<String>,

    /// User email (defaults to the current credentials)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Duration of the grant, e.g. 30m, 1h, 1h30m (default 1h)
    #[arg(short, long, value_name = "DURATION")]
    pub ttl: Option<String>,

    /// Show what would be done without making changes
    #[arg(short, long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Project ID
    #[arg(short, long)]
    pub project: Option<String>,

    /// Only show bindings for this user
    #[arg(short, long)]
    pub user: Option<String>,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Project ID
    #[arg(short, long)]
    pub project: Option<String>,

    /// Only remove bindings for this user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Show what would be removed without making changes
    #[arg(short, long)]
    pub dry_run: bool,
}

impl Cli {
    /// Flag values that take part in configuration layering.
    ///
    /// The `--user` of `list` and `clean` is a filter, not a setting, so it
    /// is not layered.
    pub fn overrides(&self) -> Overrides {
        let (project, user, ttl) = match &self.command {
            Command::Grant(args) => (args.project.clone(), args.user.clone(), args.ttl.clone()),
            Command::List(args) => (args.project.clone(), None, None),
            Command::Clean(args) => (args.project.clone(), None, None),
        };

        Overrides {
            project,
            user,
            ttl,
            verbosity: self.verbosity.clone(),
            format: self.format.clone(),
            quiet: self.quiet,
        }
    }
}

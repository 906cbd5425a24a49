//! Subcommand handlers.

use anyhow::{Context, Result};
use tracing::{debug, info};

use gta::provider::{GcpConfig, GcpPolicyClient, PolicyClient, TokenSource};
use gta::{BindingManager, GrantRequest, ManagerConfig, Member};

use crate::cli::{CleanArgs, Command, GrantArgs, ListArgs};
use crate::config::GtaConfig;

/// Run one subcommand against Cloud Resource Manager.
pub async fn run(command: Command, config: &GtaConfig) -> Result<()> {
    config.require_project()?;
    let client = GcpPolicyClient::new(
        GcpConfig {
            endpoint: config.endpoint.clone(),
            userinfo_endpoint: config.userinfo_endpoint.clone(),
            timeout: config.timeout,
        },
        TokenSource::from_config(config.access_token.clone()),
    )
    .context("failed to create policy client")?;

    execute(client, command, config).await
}

/// Run one subcommand against any policy client.
pub async fn execute<C: PolicyClient>(
    client: C,
    command: Command,
    config: &GtaConfig,
) -> Result<()> {
    let project = config.require_project()?;
    debug!(project, "Starting command");

    match command {
        Command::Grant(args) => grant(client, project, args, config).await,
        Command::List(args) => list(client, project, args).await,
        Command::Clean(args) => clean(client, project, args).await,
    }
}

async fn grant<C: PolicyClient>(
    client: C,
    project: &str,
    args: GrantArgs,
    config: &GtaConfig,
) -> Result<()> {
    let mut manager = BindingManager::new(
        client,
        ManagerConfig {
            dry_run: args.dry_run,
        },
    );

    let mut request = GrantRequest::new(project, args.roles, config.ttl);
    if let Some(user) = &config.user {
        request = request.member(user.clone());
    }

    let report = manager.grant(&request).await?;
    if args.dry_run {
        return Ok(());
    }

    info!("Waiting for interrupt signal to revoke roles (Ctrl+C to exit)...");
    shutdown_signal()
        .await
        .context("failed to listen for interrupt signals")?;
    info!("Received interrupt signal, revoking roles...");

    manager.revoke(project, &report.member).await?;
    Ok(())
}

async fn list<C: PolicyClient>(client: C, project: &str, args: ListArgs) -> Result<()> {
    let manager = BindingManager::new(client, ManagerConfig::default());
    let member = member_filter(args.user.as_deref())?;

    info!("Listing temporary bindings in project {}", project);
    manager.list(project, member.as_ref()).await?;
    Ok(())
}

async fn clean<C: PolicyClient>(client: C, project: &str, args: CleanArgs) -> Result<()> {
    let manager = BindingManager::new(
        client,
        ManagerConfig {
            dry_run: args.dry_run,
        },
    );
    let member = member_filter(args.user.as_deref())?;

    info!("Cleaning up temporary bindings in project {}", project);
    manager.clean(project, member.as_ref()).await?;
    Ok(())
}

fn member_filter(user: Option<&str>) -> Result<Option<Member>> {
    user.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(Member::from_identity)
        .transpose()
        .context("invalid --user")
}

/// Resolve on SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

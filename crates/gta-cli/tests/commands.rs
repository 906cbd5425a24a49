//! Subcommands end to end over the in-memory policy client.

use clap::Parser;

use gta_cli::commands::execute;
use gta_cli::{Cli, ConfigLoader, GtaConfig, Overrides};
use gta_testkit::{TestFixture, TEST_PROJECT};

fn parse(args: &[&str]) -> (Cli, GtaConfig) {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut overrides = cli.overrides();
    overrides.project.get_or_insert_with(|| TEST_PROJECT.to_string());
    let config = load(&overrides);
    (cli, config)
}

fn load(overrides: &Overrides) -> GtaConfig {
    ConfigLoader::new()
        .skip_home_config()
        .skip_env_vars()
        .load(overrides)
        .unwrap()
}

#[tokio::test]
async fn test_list_runs_against_project() {
    let fixture = TestFixture::new();
    fixture.seed_temporary("roles/viewer", "user:alice@example.com", 1);

    let (cli, config) = parse(&["gta", "list", "-u", "alice@example.com"]);
    execute(fixture.client(), cli.command, &config).await.unwrap();
    assert_eq!(fixture.client.write_count(), 0);
}

#[tokio::test]
async fn test_list_unknown_project_fails() {
    let fixture = TestFixture::new();
    let (cli, config) = parse(&["gta", "list", "-p", "other-project"]);
    assert!(execute(fixture.client(), cli.command, &config).await.is_err());
}

#[tokio::test]
async fn test_clean_dry_run_then_clean() {
    let fixture = TestFixture::new();
    fixture.seed_temporary("roles/viewer", "user:alice@example.com", 1);
    fixture.seed_temporary("roles/viewer", "user:bob@example.com", 1);

    let (cli, config) = parse(&["gta", "clean", "--dry-run"]);
    execute(fixture.client(), cli.command, &config).await.unwrap();
    assert_eq!(fixture.client.write_count(), 0);

    let (cli, config) = parse(&["gta", "clean", "--user", "alice@example.com"]);
    execute(fixture.client(), cli.command, &config).await.unwrap();

    let remaining = fixture.policy().temporary_bindings(None);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].member.as_str(), "user:bob@example.com");
}

#[tokio::test]
async fn test_grant_dry_run_returns_without_waiting() {
    let fixture = TestFixture::new();
    let (cli, config) = parse(&["gta", "grant", "viewer", "editor", "--dry-run", "-t", "15m"]);

    execute(fixture.client(), cli.command, &config).await.unwrap();
    assert_eq!(fixture.client.get_count(), 0);
    assert_eq!(fixture.client.write_count(), 0);
}

#[tokio::test]
async fn test_grant_without_identity_fails() {
    let fixture = TestFixture::anonymous();
    let (cli, config) = parse(&["gta", "grant", "viewer"]);

    let err = execute(fixture.client(), cli.command, &config)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("failed to resolve current user"));
    assert_eq!(fixture.client.write_count(), 0);
}

#[tokio::test]
async fn test_missing_project_fails() {
    let fixture = TestFixture::new();
    let cli = Cli::try_parse_from(["gta", "list"]).unwrap();
    let config = load(&cli.overrides());

    let err = execute(fixture.client(), cli.command, &config)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("project is required"));
}

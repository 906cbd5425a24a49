//! Configuration loading.
//!
//! Sources, lowest to highest priority:
//!
//! 1. Defaults
//! 2. YAML config file (`--config <path>`, else `~/.gta.yaml` when present)
//! 3. Environment variables (`GTA_*`)
//! 4. Command-line flags, applied by the caller via [`Overrides`]

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use gta::core::parse_ttl;
use gta::provider::gcp::{DEFAULT_ENDPOINT, DEFAULT_USERINFO_ENDPOINT};

/// Config file name looked up in the home directory.
pub const CONFIG_FILE_NAME: &str = ".gta.yaml";

const DEFAULT_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML.
    #[error("failed to parse config file '{path}': {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A value from some source could not be interpreted.
    #[error("invalid value for {source_name}: {message}")]
    InvalidValue {
        source_name: String,
        message: String,
    },

    /// No project in flags, environment or config file.
    #[error("project is required (use --project, GTA_PROJECT or the config file)")]
    MissingProject,
}

impl ConfigError {
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub fn parse_yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::ParseYaml {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_value(source_name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::InvalidValue {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }
}

/// Log level threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Verbosity {
    /// The matching `tracing` filter directive.
    pub fn as_directive(self) -> &'static str {
        match self {
            Verbosity::Debug => "debug",
            Verbosity::Info => "info",
            Verbosity::Warn => "warn",
            Verbosity::Error => "error",
        }
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Verbosity::Debug),
            "info" => Ok(Verbosity::Info),
            "warn" | "warning" => Ok(Verbosity::Warn),
            "error" => Ok(Verbosity::Error),
            other => Err(format!("unknown log level '{other}' (debug, info, warn, error)")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unsupported format '{other}' (plain, json)")),
        }
    }
}

/// Raw settings as they appear in a config file or the environment.
///
/// Every field is optional; unset fields fall through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub project: Option<String>,
    pub user: Option<String>,
    pub ttl: Option<String>,
    pub verbosity: Option<String>,
    pub format: Option<String>,
    pub endpoint: Option<String>,
    pub userinfo_endpoint: Option<String>,
    pub access_token: Option<String>,
    pub timeout: Option<String>,
}

impl RawConfig {
    /// Overlay `other` on top of `self`.
    fn merge(&mut self, other: RawConfig) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                *slot = Some(v);
            }
        }
        take(&mut self.project, other.project);
        take(&mut self.user, other.user);
        take(&mut self.ttl, other.ttl);
        take(&mut self.verbosity, other.verbosity);
        take(&mut self.format, other.format);
        take(&mut self.endpoint, other.endpoint);
        take(&mut self.userinfo_endpoint, other.userinfo_endpoint);
        take(&mut self.access_token, other.access_token);
        take(&mut self.timeout, other.timeout);
    }

    fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            project: lookup("GTA_PROJECT"),
            user: lookup("GTA_USER"),
            ttl: lookup("GTA_TTL"),
            verbosity: lookup("GTA_VERBOSITY"),
            format: lookup("GTA_FORMAT"),
            endpoint: lookup("GTA_ENDPOINT"),
            userinfo_endpoint: lookup("GTA_USERINFO_ENDPOINT"),
            access_token: lookup("GTA_ACCESS_TOKEN"),
            timeout: lookup("GTA_TIMEOUT"),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub project: Option<String>,
    pub user: Option<String>,
    pub ttl: Option<String>,
    pub verbosity: Option<String>,
    pub format: Option<String>,
    pub quiet: bool,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GtaConfig {
    pub project: Option<String>,
    pub user: Option<String>,
    pub ttl: Duration,
    pub verbosity: Verbosity,
    pub format: LogFormat,
    pub endpoint: String,
    pub userinfo_endpoint: String,
    pub access_token: Option<String>,
    pub timeout: Duration,
    /// The config file that was read, if any.
    pub source_file: Option<PathBuf>,
}

impl GtaConfig {
    /// The project to operate on.
    pub fn require_project(&self) -> Result<&str, ConfigError> {
        self.project.as_deref().ok_or(ConfigError::MissingProject)
    }
}

/// Loads configuration from file and environment, then applies overrides.
pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    home_file: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
    skip_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            explicit_file: None,
            home_file: dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME)),
            env: None,
            skip_env: false,
        }
    }

    /// Read this file instead of the home config. It must exist.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    /// Do not look for `~/.gta.yaml`.
    pub fn skip_home_config(mut self) -> Self {
        self.home_file = None;
        self
    }

    /// Do not read `GTA_*` variables.
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Read `GTA_*` variables from this map instead of the process environment.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Load and resolve.
    pub fn load(&self, overrides: &Overrides) -> Result<GtaConfig, ConfigError> {
        let mut raw = RawConfig::default();
        let mut source_file = None;

        if let Some(path) = &self.explicit_file {
            raw.merge(read_file(path)?);
            source_file = Some(path.clone());
        } else if let Some(path) = self.home_file.as_ref().filter(|p| p.is_file()) {
            raw.merge(read_file(path)?);
            source_file = Some(path.clone());
        }

        if !self.skip_env {
            let env = match &self.env {
                Some(map) => RawConfig::from_env(|k| map.get(k).cloned()),
                None => RawConfig::from_env(|k| std::env::var(k).ok()),
            };
            raw.merge(env);
        }

        raw.merge(RawConfig {
            project: overrides.project.clone(),
            user: overrides.user.clone(),
            ttl: overrides.ttl.clone(),
            verbosity: overrides.verbosity.clone(),
            format: overrides.format.clone(),
            ..RawConfig::default()
        });

        let mut config = resolve(raw)?;
        if overrides.quiet {
            config.verbosity = Verbosity::Error;
        }
        config.source_file = source_file;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    if text.trim().is_empty() {
        return Ok(RawConfig::default());
    }
    serde_yaml::from_str(&text).map_err(|e| ConfigError::parse_yaml(path, e))
}

fn resolve(raw: RawConfig) -> Result<GtaConfig, ConfigError> {
    let ttl = match raw.ttl.as_deref() {
        Some(s) => parse_ttl(s).map_err(|e| ConfigError::invalid_value("ttl", e))?,
        None => DEFAULT_TTL,
    };
    let timeout = match raw.timeout.as_deref() {
        Some(s) => parse_ttl(s).map_err(|e| ConfigError::invalid_value("timeout", e))?,
        None => DEFAULT_TIMEOUT,
    };
    let verbosity = match raw.verbosity.as_deref() {
        Some(s) => s
            .parse()
            .map_err(|e: String| ConfigError::invalid_value("verbosity", e))?,
        None => Verbosity::Info,
    };
    let format = match raw.format.as_deref() {
        Some(s) => s
            .parse()
            .map_err(|e: String| ConfigError::invalid_value("format", e))?,
        None => LogFormat::Plain,
    };

    Ok(GtaConfig {
        project: raw.project.map(|p| p.trim().to_string()),
        user: raw.user.map(|u| u.trim().to_string()),
        ttl,
        verbosity,
        format,
        endpoint: raw.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        userinfo_endpoint: raw
            .userinfo_endpoint
            .unwrap_or_else(|| DEFAULT_USERINFO_ENDPOINT.to_string()),
        access_token: raw.access_token,
        timeout,
        source_file: None,
    })
}

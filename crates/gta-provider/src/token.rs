//! Access token sources.

use std::fmt;

use tokio::process::Command;
use tracing::debug;

use crate::error::{ProviderError, Result};

/// Where the bearer token for API calls comes from.
///
/// Tokens are obtained per request and never cached: a grant session can wait
/// longer than a token's lifetime before it revokes.
#[derive(Clone)]
pub enum TokenSource {
    /// A fixed token (from config or `GTA_ACCESS_TOKEN`).
    Static(String),
    /// The output of `gcloud auth print-access-token`.
    Gcloud,
}

impl TokenSource {
    /// Prefer a configured token, fall back to gcloud.
    pub fn from_config(token: Option<String>) -> Self {
        match token {
            Some(t) if !t.trim().is_empty() => TokenSource::Static(t.trim().to_string()),
            _ => TokenSource::Gcloud,
        }
    }

    /// Obtain a token.
    pub async fn token(&self) -> Result<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Gcloud => {
                debug!("Requesting access token from gcloud");
                let output = Command::new("gcloud")
                    .args(["auth", "print-access-token"])
                    .output()
                    .await
                    .map_err(|e| ProviderError::Token(format!("failed to run gcloud: {e}")))?;

                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(ProviderError::Token(format!(
                        "gcloud exited with {}: {}",
                        output.status,
                        stderr.trim()
                    )));
                }

                let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if token.is_empty() {
                    return Err(ProviderError::Token("gcloud returned an empty token".into()));
                }
                Ok(token)
            }
        }
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Static(_) => f.write_str("TokenSource::Static(<redacted>)"),
            TokenSource::Gcloud => f.write_str("TokenSource::Gcloud"),
        }
    }
}

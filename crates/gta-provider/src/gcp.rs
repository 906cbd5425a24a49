//! Cloud Resource Manager implementation of the PolicyClient trait.
//!
//! Talks to the v1 `projects.getIamPolicy` / `projects.setIamPolicy` methods
//! and to the OAuth2 userinfo endpoint for the current identity.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use gta_core::{Policy, CONDITIONAL_POLICY_VERSION};

use crate::error::{ProviderError, Result};
use crate::token::TokenSource;
use crate::traits::PolicyClient;

pub const DEFAULT_ENDPOINT: &str = "https://cloudresourcemanager.googleapis.com";
pub const DEFAULT_USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Longest error body excerpt carried into an error message.
const ERROR_BODY_LIMIT: usize = 200;

/// Connection settings for [`GcpPolicyClient`].
#[derive(Debug, Clone)]
pub struct GcpConfig {
    /// Base URL of the Cloud Resource Manager API.
    pub endpoint: String,
    /// Full URL of the OAuth2 userinfo endpoint.
    pub userinfo_endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            userinfo_endpoint: DEFAULT_USERINFO_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GetIamPolicyRequest {
    options: GetPolicyOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GetPolicyOptions {
    requested_policy_version: i32,
}

#[derive(Debug, Serialize)]
struct SetIamPolicyRequest<'a> {
    policy: &'a Policy,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    email: Option<String>,
}

/// Policy client backed by the Cloud Resource Manager v1 REST API.
pub struct GcpPolicyClient {
    http: Client,
    config: GcpConfig,
    tokens: TokenSource,
}

impl GcpPolicyClient {
    /// Build a client.
    pub fn new(config: GcpConfig, tokens: TokenSource) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("gta/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::from_parts(http, config, tokens))
    }

    fn from_parts(http: Client, config: GcpConfig, tokens: TokenSource) -> Self {
        Self {
            http,
            config,
            tokens,
        }
    }

    fn project_url(&self, project: &str, method: &str) -> String {
        project_url(&self.config.endpoint, project, method)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.tokens.token().await?;
        Ok(request.bearer_auth(token))
    }
}

fn project_url(endpoint: &str, project: &str, method: &str) -> String {
    format!(
        "{}/v1/projects/{}:{}",
        endpoint.trim_end_matches('/'),
        project,
        method
    )
}

/// Turn a non-success response into a typed error.
async fn check(response: Response, project: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message: String = body.chars().take(ERROR_BODY_LIMIT).collect();

    Err(match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound(project.to_string()),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => ProviderError::Conflict(message),
        _ => ProviderError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl PolicyClient for GcpPolicyClient {
    async fn get_policy(&self, project: &str) -> Result<Policy> {
        let url = self.project_url(project, "getIamPolicy");
        debug!(%url, "Fetching IAM policy");

        let body = GetIamPolicyRequest {
            options: GetPolicyOptions {
                requested_policy_version: CONDITIONAL_POLICY_VERSION,
            },
        };
        let request = self.authorized(self.http.post(&url).json(&body)).await?;
        let response = check(request.send().await?, project).await?;

        Ok(response.json::<Policy>().await?)
    }

    async fn set_policy(&self, project: &str, policy: &Policy) -> Result<Policy> {
        let url = self.project_url(project, "setIamPolicy");
        debug!(%url, bindings = policy.bindings.len(), "Writing IAM policy");

        let body = SetIamPolicyRequest { policy };
        let request = self.authorized(self.http.post(&url).json(&body)).await?;
        let response = check(request.send().await?, project).await?;

        Ok(response.json::<Policy>().await?)
    }

    async fn current_identity(&self) -> Result<String> {
        let request = self
            .authorized(self.http.get(&self.config.userinfo_endpoint))
            .await?;
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Identity(format!("failed to get user info: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Identity(format!(
                "failed to get user info: status {status}"
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| ProviderError::Identity(format!("failed to parse user info: {e}")))?;

        info.email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ProviderError::Identity("no email found in credentials".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gta_core::{Binding, Member, Role};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer a single HTTP request on a loopback port with a canned
    /// response. The handle yields the raw request text.
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&raw) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&raw).into_owned()
        });

        (base, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= end + 4 + length
    }

    fn request_body(raw: &str) -> serde_json::Value {
        let (_, body) = raw.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    fn client_for(base: &str) -> GcpPolicyClient {
        let config = GcpConfig {
            endpoint: base.to_string(),
            userinfo_endpoint: format!("{base}/userinfo"),
            timeout: Duration::from_secs(5),
        };
        let http = Client::builder()
            .no_proxy()
            .timeout(config.timeout)
            .build()
            .unwrap();
        GcpPolicyClient::from_parts(http, config, TokenSource::Static("t".into()))
    }

    #[test]
    fn test_project_url() {
        assert_eq!(
            project_url(DEFAULT_ENDPOINT, "my-project", "getIamPolicy"),
            "https://cloudresourcemanager.googleapis.com/v1/projects/my-project:getIamPolicy"
        );
        assert_eq!(
            project_url("http://localhost:8080/", "p", "setIamPolicy"),
            "http://localhost:8080/v1/projects/p:setIamPolicy"
        );
    }

    #[test]
    fn test_get_request_asks_for_conditional_version() {
        let body = GetIamPolicyRequest {
            options: GetPolicyOptions {
                requested_policy_version: CONDITIONAL_POLICY_VERSION,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["options"]["requestedPolicyVersion"], 3);
    }

    #[test]
    fn test_set_request_wraps_policy() {
        let mut policy = Policy {
            etag: Some("BwX".into()),
            ..Policy::default()
        };
        policy.enable_conditions();
        policy.add_binding(Binding::new(
            Role::normalize("viewer").unwrap(),
            vec![Member::from_identity("a@example.com").unwrap()],
        ));

        let json = serde_json::to_value(SetIamPolicyRequest { policy: &policy }).unwrap();
        assert_eq!(json["policy"]["version"], 3);
        assert_eq!(json["policy"]["etag"], "BwX");
        assert_eq!(json["policy"]["bindings"][0]["members"][0], "user:a@example.com");
    }

    #[test]
    fn test_userinfo_without_email() {
        let info: UserInfo = serde_json::from_str(r#"{"id": "123"}"#).unwrap();
        assert!(info.email.is_none());
    }

    #[test]
    fn test_client_builds() {
        let client = GcpPolicyClient::new(GcpConfig::default(), TokenSource::Static("t".into()));
        assert!(client.is_ok());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HTTP round trips
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_get_policy_posts_versioned_request() {
        let reply = r#"{"version":3,"etag":"BwY","bindings":[
            {"role":"roles/viewer","members":["user:a@example.com"]}]}"#;
        let (base, server) = serve_once("200 OK", reply.to_string()).await;

        let policy = client_for(&base).get_policy("p").await.unwrap();
        assert_eq!(policy.etag.as_deref(), Some("BwY"));
        assert_eq!(policy.bindings.len(), 1);
        assert_eq!(policy.bindings[0].role, Role::from_policy("roles/viewer"));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /v1/projects/p:getIamPolicy HTTP/1.1\r\n"));
        assert!(raw.to_lowercase().contains("authorization: bearer t\r\n"));
        assert_eq!(
            request_body(&raw),
            serde_json::json!({"options": {"requestedPolicyVersion": 3}})
        );
    }

    #[tokio::test]
    async fn test_set_policy_sends_etag_and_version() {
        let (base, server) = serve_once("200 OK", r#"{"version":3,"etag":"BwZ"}"#.into()).await;

        let mut policy = Policy {
            etag: Some("BwY".into()),
            ..Policy::default()
        };
        policy.enable_conditions();
        let written = client_for(&base).set_policy("p", &policy).await.unwrap();
        assert_eq!(written.etag.as_deref(), Some("BwZ"));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /v1/projects/p:setIamPolicy HTTP/1.1\r\n"));
        let body = request_body(&raw);
        assert_eq!(body["policy"]["etag"], "BwY");
        assert_eq!(body["policy"]["version"], 3);
    }

    #[tokio::test]
    async fn test_not_found_status() {
        let (base, _server) = serve_once("404 Not Found", "{}".into()).await;
        let err = client_for(&base).get_policy("p").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(ref p) if p == "p"));
    }

    #[tokio::test]
    async fn test_conflict_statuses() {
        for status in ["409 Conflict", "412 Precondition Failed"] {
            let (base, _server) = serve_once(status, r#"{"error":"stale etag"}"#.into()).await;
            let err = client_for(&base)
                .set_policy("p", &Policy::default())
                .await
                .unwrap_err();
            assert!(
                matches!(err, ProviderError::Conflict(ref m) if m.contains("stale etag")),
                "{status}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_api_error_truncates_body() {
        let (base, _server) = serve_once("500 Internal Server Error", "x".repeat(500)).await;
        let err = client_for(&base).get_policy("p").await.unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message.chars().count(), ERROR_BODY_LIMIT);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_current_identity_reads_email() {
        let reply = r#"{"id":"1","email":"me@example.com"}"#;
        let (base, server) = serve_once("200 OK", reply.to_string()).await;

        let email = client_for(&base).current_identity().await.unwrap();
        assert_eq!(email, "me@example.com");
        assert!(server.await.unwrap().starts_with("GET /userinfo HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn test_current_identity_without_email() {
        let (base, _server) = serve_once("200 OK", r#"{"id":"1"}"#.into()).await;
        let err = client_for(&base).current_identity().await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Identity(ref m) if m == "no email found in credentials"
        ));
    }

    #[tokio::test]
    async fn test_current_identity_rejected() {
        let (base, _server) = serve_once("401 Unauthorized", "{}".into()).await;
        let err = client_for(&base).current_identity().await.unwrap_err();
        assert!(matches!(err, ProviderError::Identity(ref m) if m.contains("401")));
    }
}

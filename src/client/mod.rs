//! HTTP transport for the control-plane API
//!
//! [`ApiClient`] performs requests and hands every failure to
//! [`error::classify`], so callers only ever see an [`ApiError`].

pub mod error;
pub mod models;

use crate::constants::{
    ACTIVITY_NAME_HEADER, COMMAND_LINE_HEADER, DEFAULT_TIMEOUT, PING_TIMEOUT, REQUEST_ID_HEADER,
    USER_AGENT,
};
use anyhow::Context;
use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, RequestBuilder,
};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

pub use error::{classify, ApiError, CallFailure, FailureKind};
use models::{ClusterDetails, ClusterSummary, InfoResponse, ModifyClusterRequest};

const REDACTED: &str = "REDACTED";
const SENSITIVE_FLAGS: &[&str] = &["--password", "--auth-token"];

/// Settings needed to talk to one API endpoint
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Complete `Authorization` header value, if any
    pub authorization: Option<String>,
    /// Name of the command issuing requests, sent as activity name
    pub activity_name: Option<String>,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        ClientConfig {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
            authorization: None,
            activity_name: None,
        }
    }
}

/// Per-request metadata sent as headers
#[derive(Debug, Clone, Default)]
pub struct AuxiliaryParams {
    pub request_id: String,
    pub activity_name: String,
    pub command_line: String,
}

pub struct ApiClient {
    base_url: String,
    client: Client,
    activity_name: String,
    command_line: String,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig) -> anyhow::Result<Self> {
        let base = reqwest::Url::parse(&cfg.endpoint)
            .with_context(|| format!("invalid API endpoint '{}'", cfg.endpoint))?;

        let mut headers = HeaderMap::new();
        if let Some(auth) = &cfg.authorization {
            let hv = HeaderValue::from_str(auth).context("invalid authorization header")?;
            headers.insert(AUTHORIZATION, hv);
        }

        let client = Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()?;

        let args: Vec<String> = std::env::args().collect();
        Ok(ApiClient {
            base_url: base.as_str().trim_end_matches('/').to_string(),
            client,
            activity_name: cfg.activity_name.clone().unwrap_or_default(),
            command_line: header_safe(&redact_args(&args).join(" ")),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.base_url
    }

    /// Fresh auxiliary params with a new request ID
    pub fn default_auxiliary_params(&self) -> AuxiliaryParams {
        AuxiliaryParams {
            request_id: Uuid::new_v4().to_string(),
            activity_name: self.activity_name.clone(),
            command_line: self.command_line.clone(),
        }
    }

    fn request(&self, method: Method, path: &str, aux: &AuxiliaryParams) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, request_id = %aux.request_id, "API request");
        let mut req = self.client.request(method, url);
        if !aux.request_id.is_empty() {
            req = req.header(REQUEST_ID_HEADER, &aux.request_id);
        }
        if !aux.activity_name.is_empty() {
            req = req.header(ACTIVITY_NAME_HEADER, &aux.activity_name);
        }
        if !aux.command_line.is_empty() {
            req = req.header(COMMAND_LINE_HEADER, &aux.command_line);
        }
        req
    }

    /// Send a request and read the whole body. Non-success statuses and
    /// failures while reading the body are classified here.
    async fn send(&self, req: RequestBuilder) -> Result<(u16, Option<String>, Bytes), ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        debug!(status = status.as_u16(), url = %resp.url(), "API response");

        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(classify(CallFailure::Status {
                status: status.as_u16(),
                content_type,
                body,
            }));
        }
        Ok((status.as_u16(), content_type, body))
    }

    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let (status, content_type, body) = self.send(req).await?;
        serde_json::from_slice(&body).map_err(|e| {
            classify(CallFailure::Decode {
                status,
                content_type,
                source: Box::new(e),
            })
        })
    }

    /// Check that the API answers at all and measure the round trip
    pub async fn ping(&self) -> Result<Duration, ApiError> {
        let aux = self.default_auxiliary_params();
        let req = self.request(Method::GET, "/", &aux).timeout(PING_TIMEOUT);
        let start = Instant::now();
        self.send(req).await?;
        Ok(start.elapsed())
    }

    pub async fn info(&self, aux: &AuxiliaryParams) -> Result<InfoResponse, ApiError> {
        self.execute(self.request(Method::GET, "/v4/info/", aux)).await
    }

    pub async fn list_clusters(
        &self,
        aux: &AuxiliaryParams,
    ) -> Result<Vec<ClusterSummary>, ApiError> {
        self.execute(self.request(Method::GET, "/v4/clusters/", aux)).await
    }

    pub async fn get_cluster(
        &self,
        cluster_id: &str,
        aux: &AuxiliaryParams,
    ) -> Result<ClusterDetails, ApiError> {
        let path = format!("/v5/clusters/{cluster_id}/");
        self.execute(self.request(Method::GET, &path, aux)).await
    }

    pub async fn modify_cluster(
        &self,
        cluster_id: &str,
        body: &ModifyClusterRequest,
        aux: &AuxiliaryParams,
    ) -> Result<ClusterDetails, ApiError> {
        let path = format!("/v5/clusters/{cluster_id}/");
        let req = self.request(Method::PATCH, &path, aux).json(body);
        self.execute(req).await
    }

    /// Schedule deletion of a cluster. The response body is not inspected.
    pub async fn delete_cluster(
        &self,
        cluster_id: &str,
        aux: &AuxiliaryParams,
    ) -> Result<(), ApiError> {
        let path = format!("/v4/clusters/{cluster_id}/");
        self.send(self.request(Method::DELETE, &path, aux)).await?;
        Ok(())
    }
}

/// Replace values of sensitive flags so the command line can be sent along
/// with requests
///
/// Handles both `--flag value` and `--flag=value`. The short `-p` is only
/// treated as a password when the command line contains `login`.
pub fn redact_args(args: &[String]) -> Vec<String> {
    let login = args.iter().any(|a| a == "login");
    let sensitive = |flag: &str| SENSITIVE_FLAGS.contains(&flag) || (login && flag == "-p");

    let mut out = Vec::with_capacity(args.len());
    let mut redact_next = false;
    for arg in args {
        if redact_next {
            out.push(REDACTED.to_string());
            redact_next = false;
            continue;
        }
        if let Some((flag, _)) = arg.split_once('=') {
            if sensitive(flag) {
                out.push(format!("{flag}={REDACTED}"));
                continue;
            }
        }
        redact_next = sensitive(arg.as_str());
        out.push(arg.clone());
    }
    out
}

// Header values must be visible ASCII
fn header_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '?' })
        .collect()
}

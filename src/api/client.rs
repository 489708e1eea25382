//! Solum Client
//!
//! Main client for the Solum API, combining authentication and HTTP
//! functionality and handing out resource managers.

use super::auth::AuthOptions;
use super::http::{ApiResponse, Body, HttpClient, HttpOptions};
use crate::error::{Error, Result};
use crate::resource::{get_kind, ResourceManager};
use reqwest::Method;

/// API versions this client speaks
pub const SUPPORTED_API_VERSIONS: &[&str] = &["1"];

/// Main Solum client
#[derive(Clone)]
pub struct SolumClient {
    http: HttpClient,
    endpoint: String,
    token: Option<String>,
    api_version: String,
}

impl SolumClient {
    /// Authenticate and create a client for the given API version
    pub async fn connect(
        auth: &AuthOptions,
        http_options: &HttpOptions,
        api_version: &str,
    ) -> Result<Self> {
        check_api_version(api_version)?;

        let http = HttpClient::new(http_options)?;
        let session = auth.authenticate(&http).await?;
        tracing::info!("Using Solum endpoint {}", session.endpoint);

        Ok(Self {
            http,
            endpoint: session.endpoint,
            token: Some(session.token),
            api_version: api_version.to_string(),
        })
    }

    /// Create a client for a known endpoint, skipping Keystone
    pub fn with_endpoint(endpoint: &str, token: Option<&str>, http: HttpClient) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
            token: token.map(|t| t.to_string()),
            api_version: SUPPORTED_API_VERSIONS[0].to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Build an absolute URL from an API path such as `/v1/plans`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }

    /// Issue an authenticated request against an absolute URL
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Body,
        headers: &[(&str, &str)],
    ) -> Result<ApiResponse> {
        self.http
            .request(method, url, self.token.as_deref(), body, headers)
            .await
    }

    /// Manager for a top-level resource kind (`plan`, `assembly`, ...)
    pub fn manager(&self, kind: &str) -> Result<ResourceManager<'_>> {
        let Some(kind_def) = get_kind(kind) else {
            return Err(Error::Validation(format!("Unknown resource: {}", kind)));
        };
        ResourceManager::new(self, kind_def, &[])
    }

    /// Manager for the workflows of one app
    pub fn workflows(&self, app_id: &str) -> Result<ResourceManager<'_>> {
        let Some(kind_def) = get_kind("workflow") else {
            return Err(Error::Validation("Unknown resource: workflow".to_string()));
        };
        ResourceManager::new(self, kind_def, &[("app_id", app_id)])
    }
}

/// Reject API versions this client cannot speak
pub fn check_api_version(version: &str) -> Result<()> {
    if SUPPORTED_API_VERSIONS.contains(&version) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "Unsupported API version '{}'. Supported versions: {}",
            version,
            SUPPORTED_API_VERSIONS.join(", ")
        )))
    }
}

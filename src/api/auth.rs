//! Keystone Authentication
//!
//! Resolves a token and a Solum endpoint either from a pre-obtained token
//! plus explicit endpoint, or by password authentication against Keystone
//! (identity v2.0 or v3) followed by a service-catalog lookup.

use super::http::{Body, HttpClient};
use crate::error::{Error, Result};
use reqwest::Method;
use serde_json::{json, Value};

/// Service type the deployment API registers in the Keystone catalog
pub const DEFAULT_SERVICE_TYPE: &str = "application_deployment";

/// Catalog interface used when none is configured
pub const DEFAULT_ENDPOINT_TYPE: &str = "publicURL";

/// Domain used for v3 scoping when none is configured
const DEFAULT_DOMAIN: &str = "Default";

/// Header carrying the issued token in identity v3 responses
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Credentials and endpoint hints for reaching the API
#[derive(Debug, Clone, Default)]
pub struct AuthOptions {
    pub auth_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tenant_id: Option<String>,
    pub tenant_name: Option<String>,
    pub user_domain_name: Option<String>,
    pub project_domain_name: Option<String>,
    /// Pre-obtained token
    pub token: Option<String>,
    /// Explicit Solum endpoint, bypasses the catalog
    pub endpoint: Option<String>,
    pub region_name: Option<String>,
    pub service_type: Option<String>,
    pub endpoint_type: Option<String>,
}

/// An authenticated token bound to a Solum endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentityVersion {
    V2,
    V3,
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

impl AuthOptions {
    /// Check that either a token plus endpoint, or a full set of password
    /// credentials, is present
    pub fn sufficient_options(&self) -> Result<()> {
        let no_auth = is_set(&self.token) && is_set(&self.endpoint);
        let has_tenant = is_set(&self.tenant_id) || is_set(&self.tenant_name);
        let has_credential = is_set(&self.username)
            && is_set(&self.password)
            && is_set(&self.auth_url)
            && has_tenant;

        if no_auth || has_credential {
            return Ok(());
        }

        let options = [
            ("token", &self.token),
            ("endpoint", &self.endpoint),
            ("username", &self.username),
            ("password", &self.password),
            ("auth_url", &self.auth_url),
            ("tenant_id", &self.tenant_id),
            ("tenant_name", &self.tenant_name),
        ];
        let missing: Vec<&str> = options
            .iter()
            .filter(|(_, value)| !is_set(value))
            .map(|(name, _)| *name)
            .collect();

        Err(Error::Auth(format!(
            "Authentication failed. Missing options: {}",
            missing.join(", ")
        )))
    }

    /// Obtain a [`Session`], talking to Keystone only when needed
    pub async fn authenticate(&self, http: &HttpClient) -> Result<Session> {
        self.sufficient_options()?;

        if let (Some(token), Some(endpoint)) = (&self.token, &self.endpoint) {
            if !token.is_empty() && !endpoint.is_empty() {
                tracing::debug!("Using pre-obtained token and endpoint {}", endpoint);
                return Ok(Session {
                    token: token.clone(),
                    endpoint: endpoint.clone(),
                });
            }
        }

        let auth_url = self.auth_url.as_deref().unwrap_or_default().trim_end_matches('/');
        let version = self.identity_version()?;
        tracing::info!("Authenticating against Keystone {:?} at {}", version, auth_url);

        let (token, catalog) = match version {
            IdentityVersion::V2 => {
                let url = format!("{}/tokens", auth_url);
                let response = http
                    .request(Method::POST, &url, None, Body::Json(self.v2_request_body()), &[])
                    .await?;
                let body = response.json()?;
                let token = body
                    .pointer("/access/token/id")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .ok_or_else(|| Error::Auth("Keystone response carried no token".to_string()))?;
                let catalog = body
                    .pointer("/access/serviceCatalog")
                    .cloned()
                    .unwrap_or(Value::Null);
                (token, catalog)
            }
            IdentityVersion::V3 => {
                let url = format!("{}/auth/tokens", auth_url);
                let response = http
                    .request(Method::POST, &url, None, Body::Json(self.v3_request_body()), &[])
                    .await?;
                let token = response
                    .header(SUBJECT_TOKEN_HEADER)
                    .map(|s| s.to_string())
                    .ok_or_else(|| Error::Auth("Keystone response carried no token".to_string()))?;
                let body = response.json()?;
                let catalog = body.pointer("/token/catalog").cloned().unwrap_or(Value::Null);
                (token, catalog)
            }
        };

        let endpoint = match self.endpoint.as_deref().filter(|s| !s.is_empty()) {
            Some(endpoint) => endpoint.to_string(),
            None => find_endpoint(
                &catalog,
                self.service_type.as_deref().unwrap_or(DEFAULT_SERVICE_TYPE),
                self.endpoint_type.as_deref().unwrap_or(DEFAULT_ENDPOINT_TYPE),
                self.region_name.as_deref(),
            )
            .ok_or_else(|| {
                Error::Auth(format!(
                    "No endpoint for service type '{}' found in the service catalog",
                    self.service_type.as_deref().unwrap_or(DEFAULT_SERVICE_TYPE)
                ))
            })?,
        };

        Ok(Session { token, endpoint })
    }

    /// Pick the identity API version from the auth URL path
    fn identity_version(&self) -> Result<IdentityVersion> {
        let auth_url = self.auth_url.as_deref().unwrap_or_default();
        let parsed = url::Url::parse(auth_url)
            .map_err(|e| Error::Auth(format!("Invalid auth_url '{}': {}", auth_url, e)))?;
        let path = parsed.path().to_lowercase();

        if path.starts_with("/v3") {
            Ok(IdentityVersion::V3)
        } else if path.starts_with("/v2") {
            Ok(IdentityVersion::V2)
        } else if is_set(&self.user_domain_name) || is_set(&self.project_domain_name) {
            Ok(IdentityVersion::V3)
        } else {
            Err(Error::Auth(
                "Unable to determine the Keystone version to authenticate with using the given auth_url."
                    .to_string(),
            ))
        }
    }

    fn v2_request_body(&self) -> Value {
        let mut auth = json!({
            "passwordCredentials": {
                "username": self.username.clone().unwrap_or_default(),
                "password": self.password.clone().unwrap_or_default(),
            }
        });
        if is_set(&self.tenant_id) {
            auth["tenantId"] = json!(self.tenant_id);
        } else {
            auth["tenantName"] = json!(self.tenant_name);
        }
        json!({ "auth": auth })
    }

    fn v3_request_body(&self) -> Value {
        let user_domain = self.user_domain_name.as_deref().unwrap_or(DEFAULT_DOMAIN);
        let project_domain = self.project_domain_name.as_deref().unwrap_or(DEFAULT_DOMAIN);

        let project = if is_set(&self.tenant_id) {
            json!({ "id": self.tenant_id })
        } else {
            json!({ "name": self.tenant_name, "domain": { "name": project_domain } })
        };

        json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": self.username,
                            "password": self.password,
                            "domain": { "name": user_domain },
                        }
                    }
                },
                "scope": { "project": project }
            }
        })
    }
}

/// Find a service endpoint in a v2 or v3 service catalog
fn find_endpoint(
    catalog: &Value,
    service_type: &str,
    endpoint_type: &str,
    region: Option<&str>,
) -> Option<String> {
    // v3 interfaces are "public"/"internal"/"admin"
    let interface = endpoint_type.trim_end_matches("URL");

    catalog
        .as_array()?
        .iter()
        .filter(|service| service.get("type").and_then(|v| v.as_str()) == Some(service_type))
        .flat_map(|service| {
            service
                .get("endpoints")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default()
        })
        .filter(|endpoint| match region {
            Some(region) => {
                endpoint.get("region").and_then(|v| v.as_str()) == Some(region)
                    || endpoint.get("region_id").and_then(|v| v.as_str()) == Some(region)
            }
            None => true,
        })
        .find_map(|endpoint| {
            if let Some(url) = endpoint.get(endpoint_type).and_then(|v| v.as_str()) {
                return Some(url.to_string());
            }
            if endpoint.get("interface").and_then(|v| v.as_str()) == Some(interface) {
                return endpoint.get("url").and_then(|v| v.as_str()).map(|s| s.to_string());
            }
            None
        })
}

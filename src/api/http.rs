//! HTTP utilities for Solum REST API calls

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header carrying the Keystone token
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.chars().count() > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Transport settings shared by every request
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    /// Skip TLS certificate verification
    pub insecure: bool,
    /// Request timeout; `None` leaves reqwest's default (no timeout)
    pub timeout: Option<Duration>,
}

/// Request body variants
#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(Value),
    /// Raw text sent with an explicit content type (YAML plans)
    Document { content_type: String, text: String },
}

/// A successful HTTP response, body already read
#[derive(Debug)]
pub struct ApiResponse {
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    /// Header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Parse the body as JSON; an empty body is `null`
    pub fn json(&self) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// HTTP client wrapper for Solum and Keystone API calls
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(options: &HttpOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("solum/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(options.insecure);

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Send a request; any status >= 400 becomes the matching [`Error`]
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        body: Body,
        headers: &[(&str, &str)],
    ) -> Result<ApiResponse> {
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(ACCEPT, "application/json");

        if let Some(token) = token {
            request = request.header(AUTH_TOKEN_HEADER, token);
        }

        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(&value),
            Body::Document { content_type, text } => {
                request.header(CONTENT_TYPE, content_type).body(text)
            }
        };

        let response = request.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if status.as_u16() >= 400 {
            // Error bodies are logged sanitized and truncated
            tracing::debug!(
                "Request returned failure status: {} - {}",
                status,
                sanitize_for_log(&body)
            );
            let content_type = headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            return Err(Error::from_response(
                status,
                method.as_str(),
                url,
                content_type,
                &body,
            ));
        }

        tracing::debug!("{} {} -> {}", method, url, status);
        Ok(ApiResponse {
            headers,
            body,
        })
    }
}

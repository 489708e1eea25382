//! Error types for the Solum client
//!
//! Every failure the SDK can report maps onto one variant here. HTTP error
//! responses are converted with [`Error::from_response`], which reads the
//! API's `faultstring`/`debuginfo` fault body when there is one.

use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result type alias using the Solum [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Details of a failed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub status: u16,
    pub method: String,
    pub url: String,
    pub message: String,
    pub details: Option<String>,
}

impl Fault {
    /// The message, followed by the server's details when they add anything
    pub fn summary(&self) -> String {
        match self.details.as_deref() {
            Some(details) if details != self.message => format!("{}: {}", self.message, details),
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (HTTP {})", self.message, self.status)
    }
}

/// Solum client error types
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed local input or a 400 from the server
    #[error("{0}")]
    Validation(String),

    /// HTTP 404 or no match for a name search
    #[error("{0}")]
    NotFound(String),

    /// A name matched more than one resource
    #[error("More than one {0} by that name. Retry with the UUID.")]
    NotUnique(String),

    /// HTTP 409, usually a duplicate name
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Client(Fault),

    #[error("{0}")]
    Server(Fault),

    /// Missing or insufficient credentials
    #[error("{0}")]
    Auth(String),

    /// A call to a third-party service (GitHub) failed
    #[error("{0}")]
    ExternalService(String),

    /// The server answered with a body we could not parse
    #[error("{0}")]
    Decode(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build the error matching an HTTP error response
    pub fn from_response(
        status: StatusCode,
        method: &str,
        url: &str,
        content_type: &str,
        body: &str,
    ) -> Self {
        let mut message = None;
        let mut details = None;

        if content_type.starts_with("application/json") {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
                message = map
                    .get("faultstring")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                details = map
                    .get("debuginfo")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
            }
        } else if content_type.starts_with("text/") && !body.is_empty() {
            details = Some(body.to_string());
        }

        let fault = Fault {
            status: status.as_u16(),
            method: method.to_string(),
            url: url.to_string(),
            message: message.or_else(|| details.clone()).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("HTTP error")
                    .to_string()
            }),
            details,
        };

        match status {
            StatusCode::BAD_REQUEST => Error::Validation(fault.summary()),
            StatusCode::UNAUTHORIZED => Error::Auth(fault.summary()),
            StatusCode::NOT_FOUND => Error::NotFound(fault.summary()),
            StatusCode::CONFLICT => Error::Conflict(fault.summary()),
            s if s.is_server_error() => Error::Server(fault),
            _ => Error::Client(fault),
        }
    }

    /// HTTP status behind this error, when it came from a response
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Client(fault) | Error::Server(fault) => Some(fault.status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://example.com:9777/v1/assemblies/fake-id";

    #[test]
    fn test_404_carries_faultstring() {
        let body = r#"{"faultstring": "fake message", "debuginfo": "fake details"}"#;
        let err = Error::from_response(
            StatusCode::NOT_FOUND,
            "GET",
            URL,
            "application/json",
            body,
        );
        match err {
            Error::NotFound(msg) => assert_eq!(msg, "fake message: fake details"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_server_error_keeps_fault_details() {
        let body = r#"{"faultstring": "boom", "debuginfo": "trace"}"#;
        let err = Error::from_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "POST",
            URL,
            "application/json; charset=UTF-8",
            body,
        );
        let Error::Server(fault) = err else {
            panic!("expected server error");
        };
        assert_eq!(fault.status, 503);
        assert_eq!(fault.method, "POST");
        assert_eq!(fault.url, URL);
        assert_eq!(fault.message, "boom");
        assert_eq!(fault.details.as_deref(), Some("trace"));
    }

    #[test]
    fn test_unmapped_4xx_is_client_error() {
        let err = Error::from_response(StatusCode::IM_A_TEAPOT, "GET", URL, "", "");
        assert_eq!(err.http_status(), Some(418));
        assert!(matches!(err, Error::Client(_)));
        assert_eq!(err.to_string(), "I'm a teapot (HTTP 418)");
    }

    #[test]
    fn test_text_body_becomes_details() {
        let err = Error::from_response(
            StatusCode::FORBIDDEN,
            "DELETE",
            URL,
            "text/plain",
            "policy says no",
        );
        let Error::Client(fault) = err else {
            panic!("expected client error");
        };
        assert_eq!(fault.message, "policy says no");
        assert_eq!(fault.details.as_deref(), Some("policy says no"));
    }

    #[test]
    fn test_text_body_is_the_validation_message() {
        let err = Error::from_response(
            StatusCode::BAD_REQUEST,
            "POST",
            "http://example.com:9777/v1/plans",
            "text/plain; charset=UTF-8",
            "Plan is missing artifacts",
        );
        assert!(matches!(&err, Error::Validation(msg) if msg == "Plan is missing artifacts"));
        assert_eq!(err.to_string(), "Plan is missing artifacts");
    }

    #[test]
    fn test_debuginfo_without_faultstring() {
        let body = r#"{"faultstring": null, "debuginfo": "no such app"}"#;
        let err = Error::from_response(StatusCode::CONFLICT, "PUT", URL, "application/json", body);
        assert_eq!(err.to_string(), "no such app");
    }

    #[test]
    fn test_empty_text_body_falls_back_to_reason() {
        let err = Error::from_response(StatusCode::UNAUTHORIZED, "GET", URL, "text/html", "");
        assert!(matches!(err, Error::Auth(msg) if msg == "Unauthorized"));
    }

    #[test]
    fn test_status_taxonomy() {
        let map = |status| Error::from_response(status, "GET", URL, "", "");
        assert!(matches!(map(StatusCode::BAD_REQUEST), Error::Validation(_)));
        assert!(matches!(map(StatusCode::UNAUTHORIZED), Error::Auth(_)));
        assert!(matches!(map(StatusCode::CONFLICT), Error::Conflict(_)));
        assert!(matches!(map(StatusCode::INTERNAL_SERVER_ERROR), Error::Server(_)));
    }

    #[test]
    fn test_http_status_only_for_response_faults() {
        let server = Error::from_response(StatusCode::BAD_GATEWAY, "GET", URL, "", "");
        assert_eq!(server.http_status(), Some(502));

        let mapped = Error::from_response(StatusCode::NOT_FOUND, "GET", URL, "", "");
        assert_eq!(mapped.http_status(), None);
    }

    #[test]
    fn test_not_unique_message() {
        let err = Error::NotUnique("Plan".to_string());
        assert_eq!(
            err.to_string(),
            "More than one Plan by that name. Retry with the UUID."
        );
    }
}

//! Error types for the lobby services client.
//!
//! # Design
//! Request-scoped failures (`Connection`, `DataProcessing`,
//! `UnexpectedResponse`) carry the `RequestInfo` of the call that produced
//! them, so a caller can assert on method, path and server error string
//! instead of matching message substrings. The remaining variants are local
//! misuse or codec failures that never reach the network.

use std::fmt;

use thiserror::Error;

use crate::http::HttpMethod;
use crate::value::ValueKind;

/// Diagnostic context of the request an error originated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: HttpMethod,
    /// The validated endpoint path, without the host prefix.
    pub path: String,
}

impl RequestInfo {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for RequestInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}: {}]", self.method, self.path)
    }
}

/// Errors returned by request building, response parsing and the value codecs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport never produced a response.
    #[error("{}", describe(.info, .reason.as_deref(), "unable to connect to lobby services backend"))]
    Connection {
        info: RequestInfo,
        reason: Option<String>,
    },

    /// A response arrived but its body could not be read or decoded.
    #[error("{}", describe(.info, Some(.reason.as_str()), "unable to process response from lobby services backend"))]
    DataProcessing {
        info: RequestInfo,
        status: u16,
        reason: String,
    },

    /// A well-formed response with a status the operation does not expect.
    #[error("{}", describe(.info, .server_error.as_deref(), &format!("unexpected response status {}", .status)))]
    UnexpectedResponse {
        info: RequestInfo,
        status: u16,
        server_error: Option<String>,
    },

    /// A scalar value was read as the wrong variant.
    #[error("scalar value is a {found}, not a {expected}")]
    TypeMismatch { expected: ValueKind, found: ValueKind },

    /// A wire value had a JSON shape that is not a scalar.
    #[error("unexpected JSON {found} while decoding a scalar value")]
    Decode { found: &'static str },

    /// The operation is not available for this type, e.g. decoding a
    /// write-only `DataUpdate`.
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation { operation: &'static str },

    /// A path template did not match its parameters.
    #[error("invalid path template {template:?}: {reason}")]
    InvalidPath {
        template: &'static str,
        reason: String,
    },

    /// A lobby query filter was set more than once.
    #[error("lobby query filter `{filter}` has already been specified")]
    DuplicateFilter { filter: &'static str },

    /// A data container or update already holds this key.
    #[error("key {key:?} has already been recorded")]
    DuplicateKey { key: String },

    /// An anonymous auth endpoint was called without an app key configured.
    #[error("an app key is required for {operation}")]
    MissingAppKey { operation: &'static str },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// The request this error is attributed to, if it came from a round trip.
    pub fn request_info(&self) -> Option<&RequestInfo> {
        match self {
            ApiError::Connection { info, .. }
            | ApiError::DataProcessing { info, .. }
            | ApiError::UnexpectedResponse { info, .. } => Some(info),
            _ => None,
        }
    }

    /// The HTTP status of the response, when one arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::UnexpectedResponse { status, .. } | ApiError::DataProcessing { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// The `error` string reported by the backend, when one was sent.
    pub fn server_error(&self) -> Option<&str> {
        match self {
            ApiError::UnexpectedResponse { server_error, .. } => server_error.as_deref(),
            _ => None,
        }
    }
}

/// Render `[METHOD: path] detail - message`, skipping an empty detail.
fn describe(info: &RequestInfo, detail: Option<&str>, message: &str) -> String {
    match detail.filter(|d| !d.is_empty()) {
        Some(detail) => format!("{info} {detail} - {message}"),
        None => format!("{info} - {message}"),
    }
}

/// A specialized Result type for lobby services operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> RequestInfo {
        RequestInfo::new(HttpMethod::Get, "lobbies/L1")
    }

    #[test]
    fn connection_error_display_includes_request_and_reason() {
        let err = ApiError::Connection {
            info: info(),
            reason: Some("connection refused".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "[GET: lobbies/L1] connection refused - unable to connect to lobby services backend"
        );
    }

    #[test]
    fn unexpected_response_without_server_error() {
        let err = ApiError::UnexpectedResponse {
            info: info(),
            status: 500,
            server_error: None,
        };
        assert_eq!(
            err.to_string(),
            "[GET: lobbies/L1] - unexpected response status 500"
        );
        assert_eq!(err.status(), Some(500));
        assert!(err.server_error().is_none());
    }

    #[test]
    fn unexpected_response_exposes_fields() {
        let err = ApiError::UnexpectedResponse {
            info: info(),
            status: 404,
            server_error: Some("not_found".to_string()),
        };
        assert_eq!(err.server_error(), Some("not_found"));
        assert_eq!(err.request_info(), Some(&info()));
        assert!(err.to_string().contains("not_found"));
    }

    #[test]
    fn local_errors_have_no_request_info() {
        let err = ApiError::TypeMismatch {
            expected: ValueKind::Bool,
            found: ValueKind::String,
        };
        assert!(err.request_info().is_none());
        assert_eq!(err.to_string(), "scalar value is a string, not a boolean");
    }
}

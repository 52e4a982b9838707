//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and transport outcomes as plain data.
//! The core builds `HttpRequest` values and classifies `TransportResult`
//! values without ever touching the network; whoever executes the request
//! (the bundled `Transport` implementation, an engine host through the C ABI,
//! or a test) reports back what happened as a `TransportResult`.
//!
//! All fields use owned types (`String`, `Vec`) so values can cross FFI
//! boundaries without lifetime concerns.

use std::fmt;

use crate::error::RequestInfo;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Produced by `RequestBuilder::build`. Immutable once built; nothing is sent
/// until a transport executes it.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Fully qualified URL, host included.
    pub url: String,
    /// The validated endpoint path the URL was built from.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Diagnostic context attached to any error this request produces.
    pub fn info(&self) -> RequestInfo {
        RequestInfo::new(self.method, self.path.clone())
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What the transport reports after attempting a request.
///
/// - `status: None` means no response was received at all.
/// - `status: Some(_)` with `error: Some(_)` means a response arrived but its
///   body could not be read.
/// - Otherwise the round trip completed and `body` holds whatever was sent
///   back (`None` or empty when the response had no body).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResult {
    pub status: Option<u16>,
    pub body: Option<String>,
    pub error: Option<String>,
}

impl TransportResult {
    pub fn completed(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(body.into()),
            error: None,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status: Some(status),
            body: None,
            error: None,
        }
    }

    pub fn connection_failed(error: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            error: Some(error.into()),
        }
    }

    pub fn read_failed(status: u16, error: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: None,
            error: Some(error.into()),
        }
    }
}

//! Fluent construction of `HttpRequest` values.
//!
//! # Design
//! A `RequestBuilder` can only be created from a `ValidatedPath`, so every
//! request that leaves the crate went through parameter escaping. Builder
//! calls consume and return the builder; `build` pins the host from a
//! `ServicesConfig` and yields an immutable `HttpRequest`.

use serde::Serialize;

use crate::auth::{Credential, APP_KEY_HEADER, AUTHORIZATION_HEADER};
use crate::config::ServicesConfig;
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpMethod, HttpRequest};
use crate::path::ValidatedPath;

const CONTENT_TYPE_HEADER: &str = "Content-Type";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: HttpMethod,
    path: ValidatedPath,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl RequestBuilder {
    pub fn new(method: HttpMethod, path: ValidatedPath) -> Self {
        Self {
            method,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: ValidatedPath) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: ValidatedPath) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: ValidatedPath) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: ValidatedPath) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Attach a JSON body. Body types omit unset optional fields themselves
    /// (`skip_serializing_if`), which is how "leave unchanged" differs from a
    /// falsy value in partial updates.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> ApiResult<Self> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut builder = self.with_header(CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE);
        builder.body = Some(body);
        Ok(builder)
    }

    /// Set a header, replacing any earlier value with the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(&name)) {
            Some(slot) => *slot = (name, value),
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Authorize the request with the credential's bearer token.
    pub fn with_auth<C: Credential + ?Sized>(self, credential: &C) -> Self {
        let value = format!("Bearer {}", credential.access_token());
        self.with_header(AUTHORIZATION_HEADER, value)
    }

    /// Identify the application on endpoints that take no bearer token.
    pub fn with_app_key(self, app_key: &str) -> Self {
        self.with_header(APP_KEY_HEADER, app_key)
    }

    pub fn build(self, config: &ServicesConfig) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url: config.endpoint_url(&self.path),
            path: self.path.into_string(),
            headers: self.headers,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;
    use crate::auth::UserAuthentication;
    use crate::path::format_path;

    fn config() -> ServicesConfig {
        ServicesConfig::new().with_host("http://localhost:3000")
    }

    #[derive(Serialize)]
    struct Partial {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<u32>,
    }

    #[test]
    fn bare_request_has_no_headers_or_body() {
        let req = RequestBuilder::get(format_path("status", ()).unwrap()).build(&config());
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/status");
        assert_eq!(req.path, "status");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn auth_sets_bearer_header() {
        let auth = UserAuthentication::new("secret-token", "u1");
        let path = format_path("lobbies/{0}", ("L1",)).unwrap();
        let req = RequestBuilder::get(path).with_auth(&auth).build(&config());
        assert_eq!(req.header("authorization"), Some("Bearer secret-token"));
    }

    #[test]
    fn json_body_omits_unset_fields() {
        let path = format_path("lobbies/{0}", ("L1",)).unwrap();
        let body = Partial {
            name: None,
            size: Some(0),
        };
        let req = RequestBuilder::put(path).json(&body).unwrap().build(&config());
        assert_eq!(req.body.as_deref(), Some(r#"{"size":0}"#));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn repeated_header_replaces_value() {
        let req = RequestBuilder::post(format_path("auth/user/anon/create", ()).unwrap())
            .with_app_key("first")
            .with_header("normcore-app-key", "second")
            .build(&config());
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header(APP_KEY_HEADER), Some("second"));
    }

    #[test]
    fn unencodable_body_is_a_serialization_error() {
        let mut data = crate::data::DataContainer::new();
        data.add_value("bad", f64::NAN).unwrap();
        let path = format_path("lobbies", ()).unwrap();
        let err = RequestBuilder::post(path).json(&data).unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
    }
}

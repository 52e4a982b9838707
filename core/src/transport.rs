//! The "send a request, report status and body" capability.
//!
//! # Design
//! The core never opens sockets itself. A `Transport` executes an
//! `HttpRequest` and reports what happened as a `TransportResult`; it does
//! not interpret statuses, so classification stays in one place
//! (`Response::classify`). Timeouts, pooling and TLS belong to the
//! implementation.

use std::future::Future;

use crate::http::{HttpRequest, TransportResult};

pub trait Transport {
    fn send(&self, request: &HttpRequest) -> impl Future<Output = TransportResult> + Send;
}

impl<T: Transport + ?Sized + Sync> Transport for &T {
    fn send(&self, request: &HttpRequest) -> impl Future<Output = TransportResult> + Send {
        (**self).send(request)
    }
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use super::Transport;
    use crate::http::{HttpMethod, HttpRequest, TransportResult};

    /// `Transport` over a shared `reqwest::Client`.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Use a client configured by the application (timeouts, proxies).
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    impl Transport for ReqwestTransport {
        async fn send(&self, request: &HttpRequest) -> TransportResult {
            let mut builder = self.client.request(method(request.method), request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => return TransportResult::connection_failed(e.to_string()),
            };
            let status = response.status().as_u16();
            match response.text().await {
                Ok(body) => TransportResult::completed(status, body),
                Err(e) => TransportResult::read_failed(status, e.to_string()),
            }
        }
    }
}

//! Client core for the lobby services backend.
//!
//! # Overview
//! Builds `HttpRequest` values and parses transport results without
//! requiring any particular HTTP stack (host-does-IO pattern). A host can
//! execute requests itself and feed back a `TransportResult`, or hand the
//! core a `Transport` and use the async `LobbyClient`.
//!
//! # Design
//! - `ServicesClient` is stateless: it holds only a `ServicesConfig`.
//! - Each endpoint is split into `build_*` (produces a request) and
//!   `parse_*` (consumes a classified `Response`), so the I/O boundary is
//!   explicit.
//! - Endpoint paths can only be built through `format_path`, which escapes
//!   every parameter.
//! - Lobby custom data is a closed scalar union (`ScalarValue`) kept in a
//!   `DataContainer`; partial changes travel as a write-only `DataUpdate`.
//! - Every failure surfaces as `ApiError` with the request's method and path.
//! - Nothing outside `heartbeat` needs an async runtime. The `heartbeat`
//!   feature (tokio) and the `reqwest` feature are on by default; building
//!   with `default-features = false` leaves a runtime-free core.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod auth;
pub mod client;
pub mod config;
pub mod data;
pub mod error;
#[cfg(feature = "heartbeat")]
pub mod heartbeat;
pub mod http;
pub mod path;
pub mod query;
pub mod request;
pub mod response;
pub mod session;
pub mod transport;
pub mod types;
pub mod value;

pub use auth::{AnonymousUserAuthentication, Credential, UserAuthentication, UserIdentity};
pub use client::ServicesClient;
pub use config::{ConfigError, ServicesConfig};
pub use data::{DataChange, DataContainer, DataEntry, DataUpdate, Visibility};
pub use error::{ApiError, ApiResult, RequestInfo};
#[cfg(feature = "heartbeat")]
pub use heartbeat::{spawn_heartbeat, HeartbeatConfig, HeartbeatHandle};
pub use http::{HttpMethod, HttpRequest, TransportResult};
pub use path::{format_path, ValidatedPath};
pub use query::{LobbyQuery, QueryRange};
pub use request::RequestBuilder;
pub use response::Response;
pub use session::LobbyClient;
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::Transport;
pub use types::{
    AnonymousAuth, CreateAnonymousUserResult, CreateLobbyBody, LobbyObject, ModifyLobbyBody, UserObject,
};
pub use value::{ScalarValue, ValueKind};

//! C-ABI wrapper around `lobby-core`.
//!
//! # Overview
//! Exposes every lobby services endpoint through `extern "C"` functions so
//! an engine host (or any language with a C FFI) can build requests, run
//! them on its own HTTP stack and parse the responses, without linking
//! against an async runtime or a Rust HTTP client.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - One `lobby_build_*` function per endpoint. Authenticated endpoints take
//!   the session's access token; structured inputs (lobby bodies, queries,
//!   data changes) arrive as JSON text. A build function returns null when
//!   an argument is null or invalid, or when the core rejects the request.
//! - A single `lobby_parse_response` takes the `FfiOperation` the request
//!   was built for, plus the request itself for error context, and returns
//!   an `FfiLobbyResult` whose payload is JSON text.
//! - The C caller owns all returned pointers and must release them with the
//!   matching `lobby_free_*` function.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, UnwindSafe};

use lobby_core::{
    value, ApiError, ApiResult, CreateLobbyBody, Credential, DataUpdate, HttpRequest, LobbyQuery,
    ModifyLobbyBody, RequestInfo, Response, ServicesClient, ServicesConfig, TransportResult,
    UserAuthentication,
};
use serde::Serialize;

use types::*;

/// A bare access token, as handed over by the host.
struct BearerToken<'a>(&'a str);

impl Credential for BearerToken<'_> {
    fn access_token(&self) -> &str {
        self.0
    }
}

/// Borrow a C string. Null and invalid UTF-8 both read as `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Run a request builder behind `catch_unwind`, mapping every failure to null.
fn build(f: impl FnOnce() -> Option<HttpRequest> + UnwindSafe) -> *mut FfiHttpRequest {
    match catch_unwind(f) {
        Ok(Some(req)) => FfiHttpRequest::from_core(req),
        _ => std::ptr::null_mut(),
    }
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client for the backend at `host`.
///
/// `host` may be null to use the default public host. `app_key` may be null
/// when the anonymous auth endpoints are not needed.
/// The caller must free the returned pointer with `lobby_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn lobby_client_new(host: *const c_char, app_key: *const c_char) -> *mut FfiLobbyClient {
    catch_unwind(|| {
        let mut config = ServicesConfig::new();
        if !host.is_null() {
            match unsafe { read_str(host) } {
                Some(host) => config = config.with_host(host),
                None => return std::ptr::null_mut(),
            }
        }
        if let Some(key) = unsafe { read_str(app_key) } {
            config = config.with_app_key(key);
        }
        Box::into_raw(Box::new(FfiLobbyClient {
            inner: ServicesClient::new(config),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `lobby_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn lobby_client_free(client: *mut FfiLobbyClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_status(client: *const FfiLobbyClient) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        client.inner.build_status().ok()
    })
}

/// Returns null if the client has no app key.
#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_create_anonymous_user(client: *const FfiLobbyClient) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        client.inner.build_create_anonymous_user().ok()
    })
}

/// Returns null if the client has no app key.
#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_authenticate_anonymous_user(
    client: *const FfiLobbyClient,
    user_id: *const c_char,
    secret: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let user_id = unsafe { read_str(user_id) }?;
        let secret = unsafe { read_str(secret) }?;
        client.inner.build_authenticate_anonymous_user(user_id, secret).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_get_self(client: *const FfiLobbyClient, token: *const c_char) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        client.inner.build_get_self(&token).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_get_user(
    client: *const FfiLobbyClient,
    token: *const c_char,
    user_id: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        let user_id = unsafe { read_str(user_id) }?;
        client.inner.build_get_user(&token, user_id).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_heartbeat(client: *const FfiLobbyClient, token: *const c_char) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        client.inner.build_heartbeat(&token).ok()
    })
}

/// `body_json` is an object with `size` and optional `name`, `tags` and
/// `data` (a flat object of scalar values).
#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_create_lobby(
    client: *const FfiLobbyClient,
    token: *const c_char,
    body_json: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        let body: CreateLobbyBody = serde_json::from_str(unsafe { read_str(body_json) }?).ok()?;
        client.inner.build_create_lobby(&token, &body).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_get_lobby(
    client: *const FfiLobbyClient,
    token: *const c_char,
    lobby_id: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        let lobby_id = unsafe { read_str(lobby_id) }?;
        client.inner.build_get_lobby(&token, lobby_id).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_get_lobbies(client: *const FfiLobbyClient, token: *const c_char) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        client.inner.build_get_lobbies(&token).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_get_joined_lobbies(
    client: *const FfiLobbyClient,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        client.inner.build_get_joined_lobbies(&token).ok()
    })
}

/// `query_json` uses the wire filter names (`ownerID`, `capacity`,
/// `members`, `tagsIncludeAny`, ...). Unknown filters are rejected.
#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_query_lobbies(
    client: *const FfiLobbyClient,
    token: *const c_char,
    query_json: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        let query: LobbyQuery = serde_json::from_str(unsafe { read_str(query_json) }?).ok()?;
        client.inner.build_query_lobbies(&token, &query).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_get_lobby_members(
    client: *const FfiLobbyClient,
    token: *const c_char,
    lobby_id: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        let lobby_id = unsafe { read_str(lobby_id) }?;
        client.inner.build_get_lobby_members(&token, lobby_id).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_join_lobby(
    client: *const FfiLobbyClient,
    token: *const c_char,
    lobby_id: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        let lobby_id = unsafe { read_str(lobby_id) }?;
        client.inner.build_join_lobby(&token, lobby_id).ok()
    })
}

/// `user_id` is the user the token authenticates. Arguments follow the
/// same order as `lobby_build_remove_member`.
#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_leave_lobby(
    client: *const FfiLobbyClient,
    token: *const c_char,
    lobby_id: *const c_char,
    user_id: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let lobby_id = unsafe { read_str(lobby_id) }?;
        let session = UserAuthentication::new(unsafe { read_str(token) }?, unsafe { read_str(user_id) }?);
        client.inner.build_leave_lobby(&session, lobby_id).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_remove_member(
    client: *const FfiLobbyClient,
    token: *const c_char,
    lobby_id: *const c_char,
    user_id: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        let lobby_id = unsafe { read_str(lobby_id) }?;
        let user_id = unsafe { read_str(user_id) }?;
        client.inner.build_remove_member(&token, lobby_id, user_id).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_get_owner(
    client: *const FfiLobbyClient,
    token: *const c_char,
    lobby_id: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        let lobby_id = unsafe { read_str(lobby_id) }?;
        client.inner.build_get_owner(&token, lobby_id).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_set_owner(
    client: *const FfiLobbyClient,
    token: *const c_char,
    lobby_id: *const c_char,
    user_id: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        let lobby_id = unsafe { read_str(lobby_id) }?;
        let user_id = unsafe { read_str(user_id) }?;
        client.inner.build_set_owner(&token, lobby_id, user_id).ok()
    })
}

/// `changes_json` holds the properties to change (`name`, `tags`, `size`,
/// `data`); missing properties are left as they are.
#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_modify_lobby(
    client: *const FfiLobbyClient,
    token: *const c_char,
    lobby_id: *const c_char,
    changes_json: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        let lobby_id = unsafe { read_str(lobby_id) }?;
        let changes: ModifyLobbyBody = serde_json::from_str(unsafe { read_str(changes_json) }?).ok()?;
        client.inner.build_modify_lobby(&token, lobby_id, &changes).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_close_lobby(
    client: *const FfiLobbyClient,
    token: *const c_char,
    lobby_id: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        let lobby_id = unsafe { read_str(lobby_id) }?;
        client.inner.build_close_lobby(&token, lobby_id).ok()
    })
}

/// `changes_json` is a flat object: a scalar value sets the key, `null`
/// deletes it.
#[unsafe(no_mangle)]
pub extern "C" fn lobby_build_update_lobby_data(
    client: *const FfiLobbyClient,
    token: *const c_char,
    lobby_id: *const c_char,
    changes_json: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let client = unsafe { client.as_ref() }?;
        let token = BearerToken(unsafe { read_str(token) }?);
        let lobby_id = unsafe { read_str(lobby_id) }?;
        let update = data_update_from_json(unsafe { read_str(changes_json) }?).ok()?;
        client.inner.build_update_lobby_data(&token, lobby_id, &update).ok()
    })
}

fn data_update_from_json(json: &str) -> ApiResult<DataUpdate> {
    let changes: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).map_err(|_| ApiError::Decode { found: "non-object" })?;
    let mut update = DataUpdate::new();
    for (key, change) in changes {
        if change.is_null() {
            update.delete_value(key)?;
        } else {
            update.update_value(key, value::decode(&change)?)?;
        }
    }
    Ok(update)
}

// ---------------------------------------------------------------------------
// Parse response
// ---------------------------------------------------------------------------

/// Read the host's report into a core `TransportResult`.
fn transport_result(resp: &FfiHttpResponse) -> TransportResult {
    let lossy = |ptr: *const c_char| {
        (!ptr.is_null()).then(|| unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    };
    TransportResult {
        status: u16::try_from(resp.status).ok(),
        body: lossy(resp.body),
        error: lossy(resp.transport_error),
    }
}

fn to_json<T: Serialize>(value: &T) -> ApiResult<String> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Parse `response` as the answer to `operation` and re-encode the payload.
fn parse_operation(client: &ServicesClient, operation: FfiOperation, response: &Response) -> ApiResult<String> {
    match operation {
        FfiOperation::Status => to_json(&client.parse_status(response)),
        FfiOperation::CreateAnonymousUser => to_json(&client.parse_create_anonymous_user(response)?),
        FfiOperation::AuthenticateAnonymousUser => to_json(&client.parse_authenticate_anonymous_user(response)?),
        FfiOperation::GetSelf => to_json(&client.parse_get_self(response)?),
        FfiOperation::GetUser => to_json(&client.parse_get_user(response)?),
        FfiOperation::Heartbeat => to_json(&client.parse_heartbeat(response)?),
        FfiOperation::CreateLobby => to_json(&client.parse_create_lobby(response)?),
        FfiOperation::GetLobby => to_json(&client.parse_get_lobby(response)?),
        FfiOperation::GetLobbies => to_json(&client.parse_get_lobbies(response)?),
        FfiOperation::GetJoinedLobbies => to_json(&client.parse_get_joined_lobbies(response)?),
        FfiOperation::QueryLobbies => to_json(&client.parse_query_lobbies(response)?),
        FfiOperation::GetLobbyMembers => to_json(&client.parse_get_lobby_members(response)?),
        FfiOperation::JoinLobby => to_json(&client.parse_join_lobby(response)?),
        FfiOperation::LeaveLobby => to_json(&client.parse_leave_lobby(response)?),
        FfiOperation::RemoveMember => to_json(&client.parse_remove_member(response)?),
        FfiOperation::GetOwner => to_json(&client.parse_get_owner(response)?),
        FfiOperation::SetOwner => to_json(&client.parse_set_owner(response)?),
        FfiOperation::ModifyLobby => to_json(&client.parse_modify_lobby(response)?),
        FfiOperation::CloseLobby => to_json(&client.parse_close_lobby(response)?),
        FfiOperation::UpdateLobbyData => to_json(&client.parse_update_lobby_data(response)?),
    }
}

/// Parse the host's response to a request built by `lobby_build_*`.
///
/// `request` is the request that was executed; only its method and path are
/// read. Payloads are returned as JSON in `data_json`: a boolean for
/// `Status`, the owner's user ID string for `GetOwner`, `null` for
/// operations without a payload, and the backend's objects otherwise.
/// The caller must free the result with `lobby_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn lobby_parse_response(
    client: *const FfiLobbyClient,
    operation: FfiOperation,
    request: *const FfiHttpRequest,
    response: *const FfiHttpResponse,
) -> *mut FfiLobbyResult {
    catch_unwind(|| {
        let Some(client) = (unsafe { client.as_ref() }) else {
            return FfiLobbyResult::null_arg("client");
        };
        let Some(request) = (unsafe { request.as_ref() }) else {
            return FfiLobbyResult::null_arg("request");
        };
        let Some(response) = (unsafe { response.as_ref() }) else {
            return FfiLobbyResult::null_arg("response");
        };
        let path = unsafe { read_str(request.path) }.unwrap_or_default();
        let info = RequestInfo::new(request.method.into(), path);
        let parsed = Response::classify(info, transport_result(response))
            .and_then(|response| parse_operation(&client.inner, operation, &response));
        match parsed {
            Ok(json) => FfiLobbyResult::ok(json),
            Err(e) => FfiLobbyResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiLobbyResult::panic("panic in lobby_parse_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by any `lobby_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn lobby_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.path);
        free_c_string(req.body);
        if !req.headers.is_null() {
            let headers = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            for header in unsafe { Box::from_raw(headers) }.iter() {
                free_c_string(header.key);
                free_c_string(header.value);
            }
        }
    });
}

/// Free a result returned by `lobby_parse_response`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn lobby_free_result(result: *mut FfiLobbyResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_c_string(result.server_error);
        free_c_string(result.data_json);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn lobby_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const HOST: &str = "http://localhost:3000";

    fn new_client(app_key: Option<&str>) -> *mut FfiLobbyClient {
        let host = CString::new(HOST).unwrap();
        let key = app_key.map(|k| CString::new(k).unwrap());
        let client = lobby_client_new(host.as_ptr(), key.as_ref().map_or(std::ptr::null(), |k| k.as_ptr()));
        assert!(!client.is_null());
        client
    }

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    fn read(ptr: *const c_char) -> String {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
    }

    fn headers(req: &FfiHttpRequest) -> Vec<(String, String)> {
        if req.headers.is_null() {
            return Vec::new();
        }
        unsafe { std::slice::from_raw_parts(req.headers, req.headers_len as usize) }
            .iter()
            .map(|h| (read(h.key), read(h.value)))
            .collect()
    }

    fn body_json(req: &FfiHttpRequest) -> Value {
        serde_json::from_str(&read(req.body)).unwrap()
    }

    /// Parse `body` with `status` as the answer to `op` for a GET on `path`.
    fn parse(client: *const FfiLobbyClient, op: FfiOperation, status: i32, body: Option<&str>) -> *mut FfiLobbyResult {
        let path = c("lobbies/L1");
        let request = FfiHttpRequest {
            method: FfiHttpMethod::Get,
            url: std::ptr::null_mut(),
            path: path.as_ptr() as *mut c_char,
            headers: std::ptr::null_mut(),
            headers_len: 0,
            body: std::ptr::null_mut(),
        };
        let body = body.map(c);
        let response = FfiHttpResponse {
            status,
            body: body.as_ref().map_or(std::ptr::null(), |b| b.as_ptr()),
            transport_error: std::ptr::null(),
        };
        lobby_parse_response(client, op, &request, &response)
    }

    #[test]
    fn client_new_and_free() {
        let client = new_client(None);
        lobby_client_free(client);
    }

    #[test]
    fn client_with_null_host_uses_default() {
        let client = lobby_client_new(std::ptr::null(), std::ptr::null());
        let req = lobby_build_status(client);
        let url = read(unsafe { &*req }.url);
        assert_eq!(url, "https://alpha.services.normcore.io/status");
        lobby_free_request(req);
        lobby_client_free(client);
    }

    #[test]
    fn client_free_null_is_safe() {
        lobby_client_free(std::ptr::null_mut());
    }

    #[test]
    fn build_status_is_unauthenticated_get() {
        let client = new_client(None);
        let req = lobby_build_status(client);
        assert!(!req.is_null());

        let r = unsafe { &*req };
        assert_eq!(r.method, FfiHttpMethod::Get);
        assert_eq!(read(r.url), "http://localhost:3000/status");
        assert_eq!(read(r.path), "status");
        assert!(r.body.is_null());
        assert_eq!(r.headers_len, 0);

        lobby_free_request(req);
        lobby_client_free(client);
    }

    #[test]
    fn build_with_null_client_returns_null() {
        assert!(lobby_build_status(std::ptr::null()).is_null());
    }

    #[test]
    fn anonymous_create_requires_app_key() {
        let client = new_client(None);
        assert!(lobby_build_create_anonymous_user(client).is_null());
        lobby_client_free(client);

        let client = new_client(Some("app-key"));
        let req = lobby_build_create_anonymous_user(client);
        let r = unsafe { &*req };
        assert_eq!(r.method, FfiHttpMethod::Post);
        assert_eq!(read(r.path), "auth/user/anon/create");
        assert_eq!(
            headers(r),
            vec![("Normcore-App-Key".to_string(), "app-key".to_string())]
        );
        lobby_free_request(req);
        lobby_client_free(client);
    }

    #[test]
    fn authenticate_anonymous_user_sends_credentials() {
        let client = new_client(Some("app-key"));
        let (user, secret) = (c("U1"), c("S1"));
        let req = lobby_build_authenticate_anonymous_user(client, user.as_ptr(), secret.as_ptr());
        let r = unsafe { &*req };
        assert_eq!(body_json(r), json!({"id": "U1", "secret": "S1"}));
        lobby_free_request(req);
        lobby_client_free(client);
    }

    #[test]
    fn authenticated_request_carries_bearer_token() {
        let client = new_client(None);
        let token = c("tok");
        let req = lobby_build_get_self(client, token.as_ptr());
        let r = unsafe { &*req };
        assert_eq!(read(r.path), "users/self");
        assert_eq!(headers(r), vec![("Authorization".to_string(), "Bearer tok".to_string())]);
        lobby_free_request(req);

        assert!(lobby_build_get_self(client, std::ptr::null()).is_null());
        lobby_client_free(client);
    }

    #[test]
    fn path_parameters_are_escaped() {
        let client = new_client(None);
        let (token, lobby) = (c("tok"), c("a/b"));
        let req = lobby_build_get_lobby(client, token.as_ptr(), lobby.as_ptr());
        assert_eq!(read(unsafe { &*req }.path), "lobbies/a%2Fb");
        lobby_free_request(req);
        lobby_client_free(client);
    }

    #[test]
    fn create_lobby_forwards_json_body() {
        let client = new_client(None);
        let token = c("tok");
        let body = c(r#"{"name":"room","size":4,"tags":["pvp"],"data":{"score":10}}"#);
        let req = lobby_build_create_lobby(client, token.as_ptr(), body.as_ptr());
        assert!(!req.is_null());

        let r = unsafe { &*req };
        assert_eq!(r.method, FfiHttpMethod::Post);
        assert_eq!(
            body_json(r),
            json!({"name": "room", "size": 4, "tags": ["pvp"], "data": {"score": 10}})
        );
        lobby_free_request(req);
        lobby_client_free(client);
    }

    #[test]
    fn create_lobby_rejects_malformed_body() {
        let client = new_client(None);
        let token = c("tok");
        let body = c(r#"{"name":"room"}"#);
        assert!(lobby_build_create_lobby(client, token.as_ptr(), body.as_ptr()).is_null());
        lobby_client_free(client);
    }

    #[test]
    fn query_lobbies_uses_wire_filter_names() {
        let client = new_client(None);
        let token = c("tok");
        let query = c(r#"{"capacity":{"min":1,"max":4},"tagsIncludeAny":["pvp"]}"#);
        let req = lobby_build_query_lobbies(client, token.as_ptr(), query.as_ptr());
        let r = unsafe { &*req };
        assert_eq!(read(r.path), "lobbies/query");
        assert_eq!(
            body_json(r),
            json!({"capacity": {"min": 1, "max": 4}, "tagsIncludeAny": ["pvp"]})
        );
        lobby_free_request(req);

        let unknown = c(r#"{"region":"eu"}"#);
        assert!(lobby_build_query_lobbies(client, token.as_ptr(), unknown.as_ptr()).is_null());
        lobby_client_free(client);
    }

    #[test]
    fn leave_lobby_removes_the_session_user() {
        let client = new_client(None);
        let (token, user, lobby) = (c("tok"), c("U1"), c("L1"));
        let req = lobby_build_leave_lobby(client, token.as_ptr(), lobby.as_ptr(), user.as_ptr());
        let r = unsafe { &*req };
        assert_eq!(r.method, FfiHttpMethod::Delete);
        assert_eq!(read(r.path), "lobbies/L1/members/U1");
        lobby_free_request(req);

        let removed = lobby_build_remove_member(client, token.as_ptr(), lobby.as_ptr(), user.as_ptr());
        assert_eq!(read(unsafe { &*removed }.path), "lobbies/L1/members/U1");
        lobby_free_request(removed);
        lobby_client_free(client);
    }

    #[test]
    fn set_owner_sends_new_owner_id() {
        let client = new_client(None);
        let (token, lobby, user) = (c("tok"), c("L1"), c("U2"));
        let req = lobby_build_set_owner(client, token.as_ptr(), lobby.as_ptr(), user.as_ptr());
        let r = unsafe { &*req };
        assert_eq!(r.method, FfiHttpMethod::Put);
        assert_eq!(read(r.path), "lobbies/L1/owner");
        assert_eq!(body_json(r), json!({"id": "U2"}));
        lobby_free_request(req);
        lobby_client_free(client);
    }

    #[test]
    fn modify_lobby_sends_only_given_properties() {
        let client = new_client(None);
        let (token, lobby, changes) = (c("tok"), c("L1"), c(r#"{"size":8}"#));
        let req = lobby_build_modify_lobby(client, token.as_ptr(), lobby.as_ptr(), changes.as_ptr());
        assert_eq!(body_json(unsafe { &*req }), json!({"size": 8}));
        lobby_free_request(req);
        lobby_client_free(client);
    }

    #[test]
    fn update_lobby_data_maps_null_to_delete() {
        let client = new_client(None);
        let (token, lobby) = (c("tok"), c("L1"));
        let changes = c(r#"{"map":"dust","score":null}"#);
        let req = lobby_build_update_lobby_data(client, token.as_ptr(), lobby.as_ptr(), changes.as_ptr());
        let r = unsafe { &*req };
        assert_eq!(read(r.path), "lobbies/L1/data");
        assert_eq!(body_json(r), json!({"data": {"map": "dust", "score": null}}));
        lobby_free_request(req);

        let nested = c(r#"{"map":{"name":"dust"}}"#);
        assert!(lobby_build_update_lobby_data(client, token.as_ptr(), lobby.as_ptr(), nested.as_ptr()).is_null());
        lobby_client_free(client);
    }

    #[test]
    fn parse_get_lobby_returns_lobby_json() {
        let client = new_client(None);
        let body = r#"{"data":{"id":"L1","name":"room","size":4,"tags":["pvp"],"data":{"score":10}}}"#;
        let result = parse(client, FfiOperation::GetLobby, 200, Some(body));
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());

        let lobby: Value = serde_json::from_str(&read(r.data_json)).unwrap();
        assert_eq!(lobby["id"], "L1");
        assert_eq!(lobby["data"]["score"], json!(10));

        lobby_free_result(result);
        lobby_client_free(client);
    }

    #[test]
    fn parse_get_owner_returns_user_id() {
        let client = new_client(None);
        let result = parse(client, FfiOperation::GetOwner, 200, Some(r#"{"data":{"id":"U7"}}"#));
        assert_eq!(read(unsafe { &*result }.data_json), r#""U7""#);
        lobby_free_result(result);
        lobby_client_free(client);
    }

    #[test]
    fn parse_no_content_returns_null_payload() {
        let client = new_client(None);
        let result = parse(client, FfiOperation::Heartbeat, 204, None);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(read(r.data_json), "null");
        lobby_free_result(result);
        lobby_client_free(client);
    }

    #[test]
    fn parse_status_reports_down_without_error() {
        let client = new_client(None);
        let result = parse(client, FfiOperation::Status, 503, Some(""));
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(read(r.data_json), "false");
        lobby_free_result(result);
        lobby_client_free(client);
    }

    #[test]
    fn parse_unexpected_status_carries_server_error() {
        let client = new_client(None);
        let result = parse(client, FfiOperation::GetLobby, 404, Some(r#"{"error":"not_found"}"#));
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::UnexpectedResponse);
        assert_eq!(r.http_status, 404);
        assert_eq!(read(r.server_error), "not_found");
        assert!(read(r.error_message).starts_with("[GET: lobbies/L1] not_found"));
        assert!(r.data_json.is_null());
        lobby_free_result(result);
        lobby_client_free(client);
    }

    #[test]
    fn parse_missing_response_is_connection_error() {
        let client = new_client(None);
        let result = parse(client, FfiOperation::GetLobby, -1, None);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Connection);
        assert_eq!(r.http_status, 0);
        lobby_free_result(result);
        lobby_client_free(client);
    }

    #[test]
    fn parse_malformed_body_is_data_processing() {
        let client = new_client(None);
        let result = parse(client, FfiOperation::GetLobby, 200, Some("{not json"));
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::DataProcessing);
        assert_eq!(r.http_status, 200);
        lobby_free_result(result);
        lobby_client_free(client);
    }

    #[test]
    fn parse_null_arguments_are_reported() {
        let result = parse(std::ptr::null(), FfiOperation::Status, 200, None);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        lobby_free_result(result);

        let client = new_client(None);
        let result = lobby_parse_response(client, FfiOperation::Status, std::ptr::null(), std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        assert_eq!(read(r.error_message), "null argument: request");
        lobby_free_result(result);
        lobby_client_free(client);
    }

    #[test]
    fn interior_nul_is_replaced_not_dropped() {
        let s = types::into_c_string("bad\0id".to_string());
        assert_eq!(read(s), "bad\u{fffd}id");
        lobby_free_string(s);
    }

    #[test]
    fn free_functions_accept_null() {
        lobby_free_request(std::ptr::null_mut());
        lobby_free_result(std::ptr::null_mut());
        lobby_free_string(std::ptr::null_mut());
    }
}

//! C-compatible types for the lobby FFI layer.
//!
//! All heap-allocated data returned to C callers must be freed with the
//! corresponding `lobby_free_*` function. Strings are NUL-terminated and
//! UTF-8 encoded. Payloads are handed over as JSON text rather than as
//! nested C structs so that new fields never break the ABI.

use std::ffi::CString;
use std::os::raw::c_char;

use lobby_core::{ApiError, HttpMethod, HttpRequest, ServicesClient};

/// Opaque handle wrapping a `ServicesClient`.
pub struct FfiLobbyClient {
    pub(crate) inner: ServicesClient,
}

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(method: FfiHttpMethod) -> Self {
        match method {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A request for the host to execute.
///
/// `url` is the fully qualified address to call. `path` is the endpoint
/// path it was built from; the host passes the request back to
/// `lobby_parse_response` so errors can name it. `body` is null when the
/// request has none.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Move a core `HttpRequest` onto the heap as C data.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(key, value)| FfiHeader {
                    key: into_c_string(key),
                    value: into_c_string(value),
                })
                .collect();
            Box::into_raw(headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: into_c_string(req.url),
            path: into_c_string(req.path),
            headers,
            headers_len,
            body: req.body.map_or(std::ptr::null_mut(), into_c_string),
        }))
    }
}

/// What the host observed after executing a request.
///
/// Constructed by the caller, usually on the stack; the FFI layer reads but
/// never frees these fields.
///
/// - `status < 0`: no response was received. `transport_error` may describe why.
/// - `status >= 0` with a non-null `transport_error`: a response arrived but
///   its body could not be read.
/// - Otherwise `body` holds the response text, or null when there was none.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: i32,
    pub body: *const c_char,
    pub transport_error: *const c_char,
}

/// Which endpoint a response belongs to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiOperation {
    Status = 0,
    CreateAnonymousUser = 1,
    AuthenticateAnonymousUser = 2,
    GetSelf = 3,
    GetUser = 4,
    Heartbeat = 5,
    CreateLobby = 6,
    GetLobby = 7,
    GetLobbies = 8,
    GetJoinedLobbies = 9,
    QueryLobbies = 10,
    GetLobbyMembers = 11,
    JoinLobby = 12,
    LeaveLobby = 13,
    RemoveMember = 14,
    GetOwner = 15,
    SetOwner = 16,
    ModifyLobby = 17,
    CloseLobby = 18,
    UpdateLobbyData = 19,
}

/// Error categories reported in `FfiLobbyResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Connection = 1,
    DataProcessing = 2,
    UnexpectedResponse = 3,
    /// Local misuse: bad path parameters, duplicate keys or filters,
    /// type mismatches, unsupported operations.
    InvalidArgument = 4,
    Serialization = 5,
    MissingAppKey = 6,
    Panic = 7,
    NullArg = 8,
}

/// Result envelope for `lobby_parse_response`.
///
/// On success `error_code` is `Ok` and `data_json` holds the operation's
/// payload as JSON (`null` for operations without one). On failure
/// `error_message` is set, `http_status` is the response status when one
/// arrived (0 otherwise) and `server_error` carries the backend's `error`
/// string when it sent one.
#[repr(C)]
pub struct FfiLobbyResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub server_error: *mut c_char,
    pub data_json: *mut c_char,
}

impl FfiLobbyResult {
    pub(crate) fn ok(data_json: String) -> *mut Self {
        Box::into_raw(Box::new(FfiLobbyResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            server_error: std::ptr::null_mut(),
            data_json: into_c_string(data_json),
        }))
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let error_code = match &err {
            ApiError::Connection { .. } => FfiErrorCode::Connection,
            ApiError::DataProcessing { .. } => FfiErrorCode::DataProcessing,
            ApiError::UnexpectedResponse { .. } => FfiErrorCode::UnexpectedResponse,
            ApiError::Serialization(_) => FfiErrorCode::Serialization,
            ApiError::MissingAppKey { .. } => FfiErrorCode::MissingAppKey,
            ApiError::TypeMismatch { .. }
            | ApiError::Decode { .. }
            | ApiError::UnsupportedOperation { .. }
            | ApiError::InvalidPath { .. }
            | ApiError::DuplicateFilter { .. }
            | ApiError::DuplicateKey { .. } => FfiErrorCode::InvalidArgument,
        };
        Box::into_raw(Box::new(FfiLobbyResult {
            error_code,
            error_message: into_c_string(err.to_string()),
            http_status: err.status().unwrap_or(0),
            server_error: err
                .server_error()
                .map_or(std::ptr::null_mut(), |s| into_c_string(s.to_string())),
            data_json: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn failure(error_code: FfiErrorCode, message: String) -> *mut Self {
        Box::into_raw(Box::new(FfiLobbyResult {
            error_code,
            error_message: into_c_string(message),
            http_status: 0,
            server_error: std::ptr::null_mut(),
            data_json: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg.to_string())
    }
}

/// Hand a Rust string to C. Interior NULs cannot be represented and are
/// replaced by U+FFFD.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    let s = if s.contains('\0') { s.replace('\0', "\u{fffd}") } else { s };
    CString::new(s).unwrap_or_default().into_raw()
}

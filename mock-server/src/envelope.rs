//! Response envelopes: `{"data": ...}` on success, `{"error": "..."}` on failure.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

/// A successful response with a payload.
pub struct Data<T>(pub T);

impl<T: Serialize> IntoResponse for Data<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(json!({ "data": self.0 }))).into_response()
    }
}

/// Every failure the mock backend reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Unauthorized,
    InvalidAppKey,
    InvalidCredentials,
    InvalidBody,
    InvalidData,
    InvalidSize,
    NotFound,
    NotMember,
    NotOwner,
    LobbyFull,
}

impl Failure {
    pub fn status(self) -> StatusCode {
        match self {
            Failure::Unauthorized | Failure::InvalidAppKey | Failure::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Failure::InvalidBody | Failure::InvalidData | Failure::InvalidSize => StatusCode::BAD_REQUEST,
            Failure::NotFound | Failure::NotMember => StatusCode::NOT_FOUND,
            Failure::NotOwner => StatusCode::FORBIDDEN,
            Failure::LobbyFull => StatusCode::CONFLICT,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Failure::Unauthorized => "unauthorized",
            Failure::InvalidAppKey => "invalid_app_key",
            Failure::InvalidCredentials => "invalid_credentials",
            Failure::InvalidBody => "invalid_body",
            Failure::InvalidData => "invalid_data",
            Failure::InvalidSize => "invalid_size",
            Failure::NotFound => "not_found",
            Failure::NotMember => "not_member",
            Failure::NotOwner => "not_owner",
            Failure::LobbyFull => "lobby_full",
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.code() }))).into_response()
    }
}

impl From<JsonRejection> for Failure {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected request body");
        Failure::InvalidBody
    }
}

//! Classification and parsing of transport results.
//!
//! # Design
//! `Response::classify` turns a raw `TransportResult` into either a completed
//! `Response` or a request-scoped error (`Connection`, `DataProcessing`).
//! A completed response is then checked against the statuses the calling
//! operation expects and unwrapped from the backend's envelopes:
//! `{"data": T}` on success, `{"error": "..."}` on failure.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult, RequestInfo};
use crate::http::TransportResult;

/// Statuses the backend uses for successful calls.
pub const SUCCESS_STATUSES: [u16; 2] = [200, 204];

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// A response that completed at the transport level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    body: Option<String>,
    info: RequestInfo,
}

impl Response {
    pub fn new(info: RequestInfo, status: u16, body: Option<String>) -> Self {
        Self { status, body, info }
    }

    /// Sort a transport outcome into a response or a transport-level error.
    pub fn classify(info: RequestInfo, result: TransportResult) -> ApiResult<Response> {
        match (result.status, result.error) {
            (None, reason) => Err(ApiError::Connection { info, reason }),
            (Some(status), Some(reason)) => Err(ApiError::DataProcessing {
                info,
                status,
                reason: format!("failed to read body of {status} response: {reason}"),
            }),
            (Some(status), None) => Ok(Response::new(info, status, result.body)),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn info(&self) -> &RequestInfo {
        &self.info
    }

    pub fn is_success(&self) -> bool {
        SUCCESS_STATUSES.contains(&self.status)
    }

    /// The `error` field of the body, if the body is an error envelope.
    pub fn server_error(&self) -> Option<String> {
        let body = self.non_empty_body()?;
        serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error)
    }

    /// An `UnexpectedResponse` error for this response.
    pub fn unexpected(&self) -> ApiError {
        ApiError::UnexpectedResponse {
            info: self.info.clone(),
            status: self.status,
            server_error: self.server_error(),
        }
    }

    /// Fail with `UnexpectedResponse` unless the status is one of `expected`.
    pub fn expect_status(&self, expected: &[u16]) -> ApiResult<()> {
        if expected.contains(&self.status) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Decode the `data` field of a success envelope.
    pub fn parse_data<T: DeserializeOwned>(&self) -> ApiResult<T> {
        if !self.is_success() {
            return Err(self.unexpected());
        }
        let body = self
            .non_empty_body()
            .ok_or_else(|| self.processing_error("the response body is empty".to_string()))?;
        serde_json::from_str::<DataEnvelope<T>>(body)
            .map(|envelope| envelope.data)
            .map_err(|e| self.processing_error(e.to_string()))
    }

    /// Decode the `error` field of a failure envelope.
    ///
    /// Calling this on a success response is a caller bug and is reported
    /// as `UnexpectedResponse` rather than returning a made-up message.
    pub fn parse_error(&self) -> ApiResult<String> {
        if self.is_success() {
            return Err(ApiError::UnexpectedResponse {
                info: self.info.clone(),
                status: self.status,
                server_error: None,
            });
        }
        let body = self
            .non_empty_body()
            .ok_or_else(|| self.processing_error("the error response body is empty".to_string()))?;
        serde_json::from_str::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error)
            .map_err(|e| self.processing_error(e.to_string()))
    }

    fn non_empty_body(&self) -> Option<&str> {
        self.body.as_deref().filter(|b| !b.trim().is_empty())
    }

    fn processing_error(&self, reason: String) -> ApiError {
        ApiError::DataProcessing {
            info: self.info.clone(),
            status: self.status,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::types::LobbyObject;
    use crate::value::ScalarValue;

    fn info() -> RequestInfo {
        RequestInfo::new(HttpMethod::Get, "lobbies/L1")
    }

    fn response(status: u16, body: &str) -> Response {
        Response::new(info(), status, Some(body.to_string()))
    }

    #[test]
    fn connection_failure_keeps_method_and_path() {
        let info = RequestInfo::new(HttpMethod::Post, "lobbies/L%201/members");
        let err = Response::classify(info.clone(), TransportResult::connection_failed("refused")).unwrap_err();
        match err {
            ApiError::Connection { info: got, reason } => {
                assert_eq!(got, info);
                assert_eq!(reason.as_deref(), Some("refused"));
            }
            other => panic!("expected connection error, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_body_is_data_processing() {
        let err = Response::classify(info(), TransportResult::read_failed(200, "truncated")).unwrap_err();
        assert!(matches!(err, ApiError::DataProcessing { status: 200, .. }));
        assert_eq!(err.request_info(), Some(&info()));
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn completed_result_becomes_response() {
        let resp = Response::classify(info(), TransportResult::completed(204, "")).unwrap();
        assert_eq!(resp.status(), 204);
        assert!(resp.expect_status(&[204]).is_ok());
    }

    #[test]
    fn parse_lobby_with_data() {
        let resp = response(
            200,
            r#"{"data":{"id":"L1","name":"room","size":4,"tags":[],"data":{"score":10}}}"#,
        );
        let lobby: LobbyObject = resp.parse_data().unwrap();
        assert_eq!(lobby.id, "L1");
        assert_eq!(lobby.name, "room");
        assert_eq!(lobby.size, 4);
        assert!(lobby.tags.is_empty());
        assert_eq!(lobby.data.len(), 1);
        assert_eq!(lobby.data.get("score"), Some(&ScalarValue::Number(10.0)));
    }

    #[test]
    fn parse_data_requires_success_status() {
        let err = response(404, r#"{"error":"not_found"}"#)
            .parse_data::<LobbyObject>()
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.server_error(), Some("not_found"));
    }

    #[test]
    fn parse_data_requires_body() {
        let resp = Response::new(info(), 204, None);
        assert!(matches!(
            resp.parse_data::<LobbyObject>(),
            Err(ApiError::DataProcessing { .. })
        ));
    }

    #[test]
    fn parse_data_bad_json_is_data_processing() {
        let err = response(200, "not json").parse_data::<LobbyObject>().unwrap_err();
        assert!(matches!(err, ApiError::DataProcessing { .. }));
        assert_eq!(err.status(), Some(200));
        let err = response(200, r#"{"data":{"id":"L1","size":4,"data":{"x":[1]}}}"#)
            .parse_data::<LobbyObject>()
            .unwrap_err();
        assert!(matches!(err, ApiError::DataProcessing { .. }));
    }

    #[test]
    fn parse_error_extracts_message() {
        assert_eq!(
            response(404, r#"{"error":"not_found"}"#).parse_error().unwrap(),
            "not_found"
        );
    }

    #[test]
    fn parse_error_on_success_is_rejected() {
        let err = response(200, r#"{"data":{}}"#).parse_error().unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedResponse { status: 200, .. }));
    }

    #[test]
    fn parse_error_requires_body() {
        let err = response(500, "").parse_error().unwrap_err();
        assert!(matches!(err, ApiError::DataProcessing { .. }));
    }

    #[test]
    fn unexpected_status_attaches_server_error_when_present() {
        let err = response(409, r#"{"error":"lobby_full"}"#).expect_status(&[200]).unwrap_err();
        assert_eq!(err.server_error(), Some("lobby_full"));

        let err = response(502, "<html>bad gateway</html>").expect_status(&[200]).unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert!(err.server_error().is_none());
    }
}

//! Request builders and response parsers for every lobby services endpoint.
//!
//! # Design
//! `ServicesClient` holds only a `ServicesConfig` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes a
//! classified `Response`. The caller executes the HTTP round-trip in between,
//! either itself (a game engine host over FFI) or through a `Transport`
//! (see `session::LobbyClient`).

use tracing::debug;

use crate::auth::{AnonymousUserAuthentication, Credential, UserAuthentication, UserIdentity};
use crate::config::{self, ServicesConfig};
use crate::data::DataUpdate;
use crate::error::{ApiError, ApiResult};
use crate::http::HttpRequest;
use crate::path::format_path;
use crate::query::LobbyQuery;
use crate::request::RequestBuilder;
use crate::response::Response;
use crate::transport::Transport;
use crate::types::{
    AnonymousAuth, AnonymousCredentialsBody, CreateAnonymousUserResult, CreateLobbyBody, LobbyObject,
    ModifyLobbyBody, SetOwnerBody, UpdateLobbyDataBody, UserObject,
};

/// Stateless builder/parser for the lobby services API.
#[derive(Debug, Clone, Default)]
pub struct ServicesClient {
    config: ServicesConfig,
}

impl ServicesClient {
    pub fn new(config: ServicesConfig) -> Self {
        Self { config }
    }

    /// A client over the process-wide configuration.
    pub fn from_global() -> Self {
        Self::new(config::global().clone())
    }

    pub fn config(&self) -> &ServicesConfig {
        &self.config
    }

    fn app_key(&self, operation: &'static str) -> ApiResult<&str> {
        self.config.app_key().ok_or(ApiError::MissingAppKey { operation })
    }

    pub fn build_status(&self) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::get(format_path("status", ())?).build(&self.config))
    }

    /// The backend is up when it answers 200; any other status means down.
    pub fn parse_status(&self, response: &Response) -> bool {
        response.status() == 200
    }

    pub fn build_create_anonymous_user(&self) -> ApiResult<HttpRequest> {
        let app_key = self.app_key("create anonymous user")?;
        Ok(RequestBuilder::post(format_path("auth/user/anon/create", ())?)
            .with_app_key(app_key)
            .build(&self.config))
    }

    pub fn parse_create_anonymous_user(&self, response: &Response) -> ApiResult<CreateAnonymousUserResult> {
        expect_data(response)
    }

    pub fn build_authenticate_anonymous_user(&self, user_id: &str, secret: &str) -> ApiResult<HttpRequest> {
        let app_key = self.app_key("authenticate anonymous user")?;
        let body = AnonymousCredentialsBody {
            id: user_id.to_string(),
            secret: secret.to_string(),
        };
        Ok(RequestBuilder::post(format_path("auth/user/anon", ())?)
            .with_app_key(app_key)
            .json(&body)?
            .build(&self.config))
    }

    pub fn parse_authenticate_anonymous_user(&self, response: &Response) -> ApiResult<AnonymousAuth> {
        expect_data(response)
    }

    /// Credentials for a freshly created anonymous user.
    pub fn anonymous_session(&self, response: &Response) -> ApiResult<AnonymousUserAuthentication> {
        let result = self.parse_create_anonymous_user(response)?;
        Ok(AnonymousUserAuthentication {
            authentication: UserAuthentication::new(result.token, result.user.id.clone()),
            user_id: result.user.id,
            secret: result.auth.secret,
        })
    }

    /// Credentials after re-authenticating an existing anonymous user.
    ///
    /// The stored `secret` is kept unless the backend rotated it.
    pub fn anonymous_reauthentication(
        &self,
        response: &Response,
        user_id: &str,
        secret: &str,
    ) -> ApiResult<AnonymousUserAuthentication> {
        let auth = self.parse_authenticate_anonymous_user(response)?;
        let token = auth.token.ok_or_else(|| ApiError::DataProcessing {
            info: response.info().clone(),
            status: response.status(),
            reason: "authentication response carries no token".to_string(),
        })?;
        Ok(AnonymousUserAuthentication {
            user_id: user_id.to_string(),
            secret: auth.secret.unwrap_or_else(|| secret.to_string()),
            authentication: UserAuthentication::new(token, user_id),
        })
    }

    pub fn build_get_self<C: Credential + ?Sized>(&self, auth: &C) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::get(format_path("users/self", ())?)
            .with_auth(auth)
            .build(&self.config))
    }

    pub fn parse_get_self(&self, response: &Response) -> ApiResult<UserObject> {
        expect_data(response)
    }

    pub fn build_get_user<C: Credential + ?Sized>(&self, auth: &C, user_id: &str) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::get(format_path("users/{0}", (user_id,))?)
            .with_auth(auth)
            .build(&self.config))
    }

    pub fn parse_get_user(&self, response: &Response) -> ApiResult<UserObject> {
        expect_data(response)
    }

    pub fn build_heartbeat<C: Credential + ?Sized>(&self, auth: &C) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::post(format_path("users/heartbeat", ())?)
            .with_auth(auth)
            .build(&self.config))
    }

    pub fn parse_heartbeat(&self, response: &Response) -> ApiResult<()> {
        expect_no_content(response)
    }

    pub fn build_create_lobby<C: Credential + ?Sized>(
        &self,
        auth: &C,
        body: &CreateLobbyBody,
    ) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::post(format_path("lobbies", ())?)
            .with_auth(auth)
            .json(body)?
            .build(&self.config))
    }

    pub fn parse_create_lobby(&self, response: &Response) -> ApiResult<LobbyObject> {
        expect_data(response)
    }

    pub fn build_get_lobby<C: Credential + ?Sized>(&self, auth: &C, lobby_id: &str) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::get(format_path("lobbies/{0}", (lobby_id,))?)
            .with_auth(auth)
            .build(&self.config))
    }

    pub fn parse_get_lobby(&self, response: &Response) -> ApiResult<LobbyObject> {
        expect_data(response)
    }

    /// The most recently created lobbies, unfiltered.
    pub fn build_get_lobbies<C: Credential + ?Sized>(&self, auth: &C) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::get(format_path("lobbies", ())?)
            .with_auth(auth)
            .build(&self.config))
    }

    pub fn parse_get_lobbies(&self, response: &Response) -> ApiResult<Vec<LobbyObject>> {
        expect_data(response)
    }

    pub fn build_get_joined_lobbies<C: Credential + ?Sized>(&self, auth: &C) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::get(format_path("lobbies/joined", ())?)
            .with_auth(auth)
            .build(&self.config))
    }

    pub fn parse_get_joined_lobbies(&self, response: &Response) -> ApiResult<Vec<LobbyObject>> {
        expect_data(response)
    }

    pub fn build_query_lobbies<C: Credential + ?Sized>(&self, auth: &C, query: &LobbyQuery) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::post(format_path("lobbies/query", ())?)
            .with_auth(auth)
            .json(query)?
            .build(&self.config))
    }

    pub fn parse_query_lobbies(&self, response: &Response) -> ApiResult<Vec<LobbyObject>> {
        expect_data(response)
    }

    pub fn build_get_lobby_members<C: Credential + ?Sized>(
        &self,
        auth: &C,
        lobby_id: &str,
    ) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::get(format_path("lobbies/{0}/members", (lobby_id,))?)
            .with_auth(auth)
            .build(&self.config))
    }

    pub fn parse_get_lobby_members(&self, response: &Response) -> ApiResult<Vec<UserObject>> {
        expect_data(response)
    }

    pub fn build_join_lobby<C: Credential + ?Sized>(&self, auth: &C, lobby_id: &str) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::post(format_path("lobbies/{0}/members", (lobby_id,))?)
            .with_auth(auth)
            .build(&self.config))
    }

    pub fn parse_join_lobby(&self, response: &Response) -> ApiResult<LobbyObject> {
        expect_data(response)
    }

    /// Remove the authenticated user from a lobby.
    pub fn build_leave_lobby<C: UserIdentity + ?Sized>(&self, auth: &C, lobby_id: &str) -> ApiResult<HttpRequest> {
        self.build_remove_member(auth, lobby_id, auth.user_id())
    }

    pub fn parse_leave_lobby(&self, response: &Response) -> ApiResult<()> {
        expect_no_content(response)
    }

    pub fn build_remove_member<C: Credential + ?Sized>(
        &self,
        auth: &C,
        lobby_id: &str,
        user_id: &str,
    ) -> ApiResult<HttpRequest> {
        Ok(
            RequestBuilder::delete(format_path("lobbies/{0}/members/{1}", (lobby_id, user_id))?)
                .with_auth(auth)
                .build(&self.config),
        )
    }

    pub fn parse_remove_member(&self, response: &Response) -> ApiResult<()> {
        expect_no_content(response)
    }

    pub fn build_get_owner<C: Credential + ?Sized>(&self, auth: &C, lobby_id: &str) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::get(format_path("lobbies/{0}/owner", (lobby_id,))?)
            .with_auth(auth)
            .build(&self.config))
    }

    /// The owner's user ID.
    pub fn parse_get_owner(&self, response: &Response) -> ApiResult<String> {
        expect_data::<UserObject>(response).map(|user| user.id)
    }

    pub fn build_set_owner<C: Credential + ?Sized>(
        &self,
        auth: &C,
        lobby_id: &str,
        user_id: &str,
    ) -> ApiResult<HttpRequest> {
        let body = SetOwnerBody {
            id: user_id.to_string(),
        };
        Ok(RequestBuilder::put(format_path("lobbies/{0}/owner", (lobby_id,))?)
            .with_auth(auth)
            .json(&body)?
            .build(&self.config))
    }

    pub fn parse_set_owner(&self, response: &Response) -> ApiResult<()> {
        expect_no_content(response)
    }

    pub fn build_modify_lobby<C: Credential + ?Sized>(
        &self,
        auth: &C,
        lobby_id: &str,
        changes: &ModifyLobbyBody,
    ) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::put(format_path("lobbies/{0}", (lobby_id,))?)
            .with_auth(auth)
            .json(changes)?
            .build(&self.config))
    }

    pub fn parse_modify_lobby(&self, response: &Response) -> ApiResult<()> {
        expect_no_content(response)
    }

    pub fn build_close_lobby<C: Credential + ?Sized>(&self, auth: &C, lobby_id: &str) -> ApiResult<HttpRequest> {
        Ok(RequestBuilder::delete(format_path("lobbies/{0}", (lobby_id,))?)
            .with_auth(auth)
            .build(&self.config))
    }

    pub fn parse_close_lobby(&self, response: &Response) -> ApiResult<()> {
        expect_no_content(response)
    }

    pub fn build_update_lobby_data<C: Credential + ?Sized>(
        &self,
        auth: &C,
        lobby_id: &str,
        update: &DataUpdate,
    ) -> ApiResult<HttpRequest> {
        let body = UpdateLobbyDataBody { data: update.clone() };
        Ok(RequestBuilder::post(format_path("lobbies/{0}/data", (lobby_id,))?)
            .with_auth(auth)
            .json(&body)?
            .build(&self.config))
    }

    pub fn parse_update_lobby_data(&self, response: &Response) -> ApiResult<LobbyObject> {
        expect_data(response)
    }

    /// Execute `request` through `transport` and classify the outcome.
    pub async fn send<T: Transport>(&self, transport: &T, request: HttpRequest) -> ApiResult<Response> {
        let info = request.info();
        debug!(method = %info.method, path = %info.path, "sending lobby services request");
        let result = transport.send(&request).await;
        let response = Response::classify(info, result)?;
        debug!(
            method = %response.info().method,
            path = %response.info().path,
            status = response.status(),
            "received lobby services response"
        );
        Ok(response)
    }

    /// Whether the backend reports itself healthy. Transport failures are errors.
    pub async fn status<T: Transport>(&self, transport: &T) -> ApiResult<bool> {
        let response = self.send(transport, self.build_status()?).await?;
        Ok(self.parse_status(&response))
    }

    pub async fn create_anonymous_user<T: Transport>(
        &self,
        transport: &T,
    ) -> ApiResult<AnonymousUserAuthentication> {
        let response = self.send(transport, self.build_create_anonymous_user()?).await?;
        self.anonymous_session(&response)
    }

    pub async fn authenticate_anonymous_user<T: Transport>(
        &self,
        transport: &T,
        user_id: &str,
        secret: &str,
    ) -> ApiResult<AnonymousUserAuthentication> {
        let request = self.build_authenticate_anonymous_user(user_id, secret)?;
        let response = self.send(transport, request).await?;
        self.anonymous_reauthentication(&response, user_id, secret)
    }
}

/// Require a 200 and decode its `data` payload.
fn expect_data<T: serde::de::DeserializeOwned>(response: &Response) -> ApiResult<T> {
    response.expect_status(&[200])?;
    response.parse_data()
}

fn expect_no_content(response: &Response) -> ApiResult<()> {
    response.expect_status(&[204])
}

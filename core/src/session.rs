//! Authenticated lobby services session driving a `Transport`.
//!
//! Every method issues exactly one request: build, send, classify, parse.
//! Nothing is retried or cached.

use crate::auth::{AnonymousUserAuthentication, Credential, UserAuthentication, UserIdentity};
use crate::client::ServicesClient;
use crate::data::DataUpdate;
use crate::error::ApiResult;
use crate::query::LobbyQuery;
use crate::transport::Transport;
use crate::types::{CreateLobbyBody, LobbyObject, ModifyLobbyBody, UserObject};

#[derive(Debug, Clone)]
pub struct LobbyClient<T, C = UserAuthentication> {
    services: ServicesClient,
    transport: T,
    credential: C,
}

impl<T: Transport> LobbyClient<T, AnonymousUserAuthentication> {
    /// Create a new anonymous user and open a session as that user.
    pub async fn as_new_anonymous_user(services: ServicesClient, transport: T) -> ApiResult<Self> {
        let credential = services.create_anonymous_user(&transport).await?;
        Ok(Self::new(services, transport, credential))
    }

    /// Re-authenticate a stored anonymous user and open a session.
    pub async fn as_anonymous_user(
        services: ServicesClient,
        transport: T,
        user_id: &str,
        secret: &str,
    ) -> ApiResult<Self> {
        let credential = services
            .authenticate_anonymous_user(&transport, user_id, secret)
            .await?;
        Ok(Self::new(services, transport, credential))
    }
}

impl<T: Transport, C: Credential> LobbyClient<T, C> {
    pub fn new(services: ServicesClient, transport: T, credential: C) -> Self {
        Self {
            services,
            transport,
            credential,
        }
    }

    pub fn services(&self) -> &ServicesClient {
        &self.services
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn credential(&self) -> &C {
        &self.credential
    }

    pub async fn status(&self) -> ApiResult<bool> {
        self.services.status(&self.transport).await
    }

    pub async fn get_self(&self) -> ApiResult<UserObject> {
        let request = self.services.build_get_self(&self.credential)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_get_self(&response)
    }

    pub async fn get_user(&self, user_id: &str) -> ApiResult<UserObject> {
        let request = self.services.build_get_user(&self.credential, user_id)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_get_user(&response)
    }

    /// Tell the backend this user is still online.
    pub async fn heartbeat(&self) -> ApiResult<()> {
        let request = self.services.build_heartbeat(&self.credential)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_heartbeat(&response)
    }

    pub async fn create_lobby(&self, body: &CreateLobbyBody) -> ApiResult<LobbyObject> {
        let request = self.services.build_create_lobby(&self.credential, body)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_create_lobby(&response)
    }

    pub async fn get_lobby(&self, lobby_id: &str) -> ApiResult<LobbyObject> {
        let request = self.services.build_get_lobby(&self.credential, lobby_id)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_get_lobby(&response)
    }

    pub async fn get_lobbies(&self) -> ApiResult<Vec<LobbyObject>> {
        let request = self.services.build_get_lobbies(&self.credential)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_get_lobbies(&response)
    }

    pub async fn get_joined_lobbies(&self) -> ApiResult<Vec<LobbyObject>> {
        let request = self.services.build_get_joined_lobbies(&self.credential)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_get_joined_lobbies(&response)
    }

    pub async fn query_lobbies(&self, query: &LobbyQuery) -> ApiResult<Vec<LobbyObject>> {
        let request = self.services.build_query_lobbies(&self.credential, query)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_query_lobbies(&response)
    }

    pub async fn get_lobby_members(&self, lobby_id: &str) -> ApiResult<Vec<UserObject>> {
        let request = self.services.build_get_lobby_members(&self.credential, lobby_id)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_get_lobby_members(&response)
    }

    pub async fn join_lobby(&self, lobby_id: &str) -> ApiResult<LobbyObject> {
        let request = self.services.build_join_lobby(&self.credential, lobby_id)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_join_lobby(&response)
    }

    pub async fn remove_member(&self, lobby_id: &str, user_id: &str) -> ApiResult<()> {
        let request = self
            .services
            .build_remove_member(&self.credential, lobby_id, user_id)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_remove_member(&response)
    }

    /// The user ID of the lobby owner.
    pub async fn get_owner(&self, lobby_id: &str) -> ApiResult<String> {
        let request = self.services.build_get_owner(&self.credential, lobby_id)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_get_owner(&response)
    }

    pub async fn set_owner(&self, lobby_id: &str, user_id: &str) -> ApiResult<()> {
        let request = self.services.build_set_owner(&self.credential, lobby_id, user_id)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_set_owner(&response)
    }

    pub async fn modify_lobby(&self, lobby_id: &str, changes: &ModifyLobbyBody) -> ApiResult<()> {
        let request = self
            .services
            .build_modify_lobby(&self.credential, lobby_id, changes)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_modify_lobby(&response)
    }

    pub async fn close_lobby(&self, lobby_id: &str) -> ApiResult<()> {
        let request = self.services.build_close_lobby(&self.credential, lobby_id)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_close_lobby(&response)
    }

    pub async fn update_lobby_data(&self, lobby_id: &str, update: &DataUpdate) -> ApiResult<LobbyObject> {
        let request = self
            .services
            .build_update_lobby_data(&self.credential, lobby_id, update)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_update_lobby_data(&response)
    }
}

impl<T: Transport, C: UserIdentity> LobbyClient<T, C> {
    pub fn user_id(&self) -> &str {
        self.credential.user_id()
    }

    pub async fn leave_lobby(&self, lobby_id: &str) -> ApiResult<()> {
        let request = self.services.build_leave_lobby(&self.credential, lobby_id)?;
        let response = self.services.send(&self.transport, request).await?;
        self.services.parse_leave_lobby(&response)
    }
}

//! In-memory lobby services backend speaking the same wire protocol as the
//! hosted service. Used by the client's integration tests and runnable on
//! its own (`cargo run -p mock-server`).

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub mod envelope;
pub mod store;

use envelope::{Data, Failure};
use store::{
    CreateLobby, Credentials, DataChanges, LobbyView, ModifyLobby, NewAnonymousUser, NewOwner, Query, Store,
    TokenView, UserView,
};

/// App key accepted by `app()`.
pub const DEFAULT_APP_KEY: &str = "mock-app-key";

/// Header carrying the app key on the anonymous auth endpoints.
pub const APP_KEY_HEADER: &str = "Normcore-App-Key";

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    app_key: Arc<str>,
}

impl AppState {
    pub fn new(app_key: &str) -> Self {
        Self {
            db: Arc::new(RwLock::new(Store::new())),
            app_key: Arc::from(app_key),
        }
    }

    /// Shared handle on the store, for tests that inspect server-side state.
    pub fn db(&self) -> &Db {
        &self.db
    }
}

pub fn app() -> Router {
    app_with_state(AppState::new(DEFAULT_APP_KEY))
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/auth/user/anon/create", post(create_anonymous_user))
        .route("/auth/user/anon", post(authenticate_anonymous_user))
        .route("/users/self", get(get_self))
        .route("/users/heartbeat", post(heartbeat))
        .route("/users/{id}", get(get_user))
        .route("/lobbies", get(get_lobbies).post(create_lobby))
        .route("/lobbies/joined", get(get_joined_lobbies))
        .route("/lobbies/query", post(query_lobbies))
        .route("/lobbies/{id}", get(get_lobby).put(modify_lobby).delete(close_lobby))
        .route("/lobbies/{id}/members", get(get_members).post(join_lobby))
        .route("/lobbies/{id}/members/{user_id}", delete(remove_member))
        .route("/lobbies/{id}/owner", get(get_owner).put(set_owner))
        .route("/lobbies/{id}/data", post(update_data))
        .fallback(|| async { Failure::NotFound })
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::new(DEFAULT_APP_KEY)).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock lobby services listening");
    }
    axum::serve(listener, app_with_state(state)).await
}

/// The user behind the request's bearer token.
pub struct AuthUser(pub String);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(Failure::Unauthorized)?;
        state
            .db
            .read()
            .await
            .authenticate(token)
            .map(AuthUser)
            .ok_or(Failure::Unauthorized)
    }
}

/// Proof that the request carried the configured app key.
pub struct AppKey;

impl FromRequestParts<AppState> for AppKey {
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match parts.headers.get(APP_KEY_HEADER).and_then(|v| v.to_str().ok()) {
            Some(key) if key == &*state.app_key => Ok(AppKey),
            _ => Err(Failure::InvalidAppKey),
        }
    }
}

type Body<T> = Result<Json<T>, JsonRejection>;

async fn status() -> Data<&'static str> {
    Data("ok")
}

async fn create_anonymous_user(State(state): State<AppState>, _: AppKey) -> Data<NewAnonymousUser> {
    let created = state.db.write().await.create_anonymous_user();
    info!(user_id = %created.user.id, "created anonymous user");
    Data(created)
}

async fn authenticate_anonymous_user(
    State(state): State<AppState>,
    _: AppKey,
    body: Body<Credentials>,
) -> Result<Data<TokenView>, Failure> {
    let Json(credentials) = body?;
    state
        .db
        .write()
        .await
        .authenticate_anonymous_user(&credentials)
        .map(Data)
}

async fn get_self(AuthUser(user_id): AuthUser) -> Data<UserView> {
    Data(UserView { id: user_id })
}

async fn get_user(
    State(state): State<AppState>,
    _: AuthUser,
    Path(id): Path<String>,
) -> Result<Data<UserView>, Failure> {
    state.db.read().await.get_user(&id).map(Data)
}

async fn heartbeat(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<StatusCode, Failure> {
    let beats = state.db.write().await.heartbeat(&user_id)?;
    debug!(%user_id, beats, "heartbeat");
    Ok(StatusCode::NO_CONTENT)
}

async fn create_lobby(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Body<CreateLobby>,
) -> Result<Data<LobbyView>, Failure> {
    let Json(input) = body?;
    let lobby = state.db.write().await.create_lobby(&user_id, input)?;
    info!(lobby_id = %lobby.id, owner = %user_id, "created lobby");
    Ok(Data(lobby))
}

async fn get_lobbies(State(state): State<AppState>, _: AuthUser) -> Data<Vec<LobbyView>> {
    Data(state.db.read().await.recent_lobbies())
}

async fn get_joined_lobbies(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Data<Vec<LobbyView>> {
    Data(state.db.read().await.joined_lobbies(&user_id))
}

async fn query_lobbies(
    State(state): State<AppState>,
    _: AuthUser,
    body: Body<Query>,
) -> Result<Data<Vec<LobbyView>>, Failure> {
    let Json(query) = body?;
    Ok(Data(state.db.read().await.query_lobbies(&query)))
}

async fn get_lobby(
    State(state): State<AppState>,
    _: AuthUser,
    Path(id): Path<String>,
) -> Result<Data<LobbyView>, Failure> {
    state.db.read().await.get_lobby(&id).map(Data)
}

async fn modify_lobby(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    body: Body<ModifyLobby>,
) -> Result<StatusCode, Failure> {
    let Json(changes) = body?;
    state.db.write().await.modify(&id, &user_id, changes)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn close_lobby(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, Failure> {
    state.db.write().await.close(&id, &user_id)?;
    info!(lobby_id = %id, "closed lobby");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_members(
    State(state): State<AppState>,
    _: AuthUser,
    Path(id): Path<String>,
) -> Result<Data<Vec<UserView>>, Failure> {
    state.db.read().await.members(&id).map(Data)
}

async fn join_lobby(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Data<LobbyView>, Failure> {
    state.db.write().await.join(&id, &user_id).map(Data)
}

async fn remove_member(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, Failure> {
    state.db.write().await.remove_member(&id, &caller, &user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_owner(
    State(state): State<AppState>,
    _: AuthUser,
    Path(id): Path<String>,
) -> Result<Data<UserView>, Failure> {
    state.db.read().await.owner(&id).map(Data)
}

async fn set_owner(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    body: Body<NewOwner>,
) -> Result<StatusCode, Failure> {
    let Json(owner) = body?;
    state.db.write().await.set_owner(&id, &caller, &owner.id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_data(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    body: Body<DataChanges>,
) -> Result<Data<LobbyView>, Failure> {
    let Json(changes) = body?;
    state.db.write().await.update_data(&id, &caller, changes.data).map(Data)
}

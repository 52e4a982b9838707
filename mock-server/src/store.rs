//! In-memory users, sessions and lobbies.
//!
//! All rules of the mock backend live here so they can be tested without
//! HTTP. Handlers lock the store, call one method and wrap the outcome.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::envelope::Failure;

/// How many lobbies `GET /lobbies` and `POST /lobbies/query` return at most.
pub const LIST_LIMIT: usize = 50;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserView {
    pub id: String,
}

/// Lobby as it appears on the wire.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LobbyView {
    pub id: String,
    pub name: String,
    pub size: u32,
    pub tags: Vec<String>,
    pub data: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewAnonymousUser {
    pub user: UserView,
    pub auth: SecretView,
    pub token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecretView {
    pub secret: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenView {
    pub token: String,
}

#[derive(Deserialize)]
pub struct CreateLobby {
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub size: u32,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Deserialize, Default)]
pub struct ModifyLobby {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub size: Option<u32>,
    pub data: Option<Map<String, Value>>,
}

#[derive(Deserialize, Clone, Copy, Debug)]
pub struct Range {
    pub min: u32,
    pub max: u32,
}

impl Range {
    fn contains(&self, n: u32) -> bool {
        self.min <= n && n <= self.max
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(rename = "ownerID")]
    pub owner_id: Option<String>,
    pub capacity: Option<Range>,
    pub members: Option<Range>,
    pub tags_include_any: Option<Vec<String>>,
    pub tags_include_all: Option<Vec<String>>,
    pub tags_exclude_any: Option<Vec<String>>,
    pub tags_exclude_all: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub id: String,
    pub secret: String,
}

#[derive(Deserialize)]
pub struct NewOwner {
    pub id: String,
}

#[derive(Deserialize)]
pub struct DataChanges {
    pub data: Map<String, Value>,
}

struct User {
    secret: String,
    heartbeats: u64,
}

struct Lobby {
    id: String,
    name: String,
    size: u32,
    tags: Vec<String>,
    data: Map<String, Value>,
    owner: String,
    members: Vec<String>,
}

impl Lobby {
    fn view(&self) -> LobbyView {
        LobbyView {
            id: self.id.clone(),
            name: self.name.clone(),
            size: self.size,
            tags: self.tags.clone(),
            data: self.data.clone(),
        }
    }

    fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }

    fn available_space(&self) -> u32 {
        let members = u32::try_from(self.members.len()).unwrap_or(u32::MAX);
        self.size.saturating_sub(members)
    }

    fn member_count(&self) -> u32 {
        u32::try_from(self.members.len()).unwrap_or(u32::MAX)
    }

    fn require_owner(&self, user_id: &str) -> Result<(), Failure> {
        if self.owner == user_id {
            Ok(())
        } else {
            Err(Failure::NotOwner)
        }
    }

    fn matches(&self, query: &Query) -> bool {
        let has = |tag: &String| self.tags.contains(tag);
        query.owner_id.as_ref().is_none_or(|owner| *owner == self.owner)
            && query.capacity.is_none_or(|r| r.contains(self.available_space()))
            && query.members.is_none_or(|r| r.contains(self.member_count()))
            && query.tags_include_any.as_ref().is_none_or(|t| t.iter().any(has))
            && query.tags_include_all.as_ref().is_none_or(|t| t.iter().all(has))
            && query.tags_exclude_any.as_ref().is_none_or(|t| !t.iter().any(has))
            && query.tags_exclude_all.as_ref().is_none_or(|t| t.is_empty() || !t.iter().all(has))
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

fn validate_data(data: &Map<String, Value>) -> Result<(), Failure> {
    if data.values().all(is_scalar) {
        Ok(())
    } else {
        Err(Failure::InvalidData)
    }
}

#[derive(Default)]
pub struct Store {
    users: HashMap<String, User>,
    /// access token -> user ID
    tokens: HashMap<String, String>,
    /// Oldest first.
    lobbies: Vec<Lobby>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_token(&mut self, user_id: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }

    pub fn create_anonymous_user(&mut self) -> NewAnonymousUser {
        let id = Uuid::new_v4().to_string();
        let secret = Uuid::new_v4().to_string();
        self.users.insert(
            id.clone(),
            User {
                secret: secret.clone(),
                heartbeats: 0,
            },
        );
        let token = self.issue_token(&id);
        NewAnonymousUser {
            user: UserView { id },
            auth: SecretView { secret },
            token,
        }
    }

    pub fn authenticate_anonymous_user(&mut self, credentials: &Credentials) -> Result<TokenView, Failure> {
        match self.users.get(&credentials.id) {
            Some(user) if user.secret == credentials.secret => Ok(TokenView {
                token: self.issue_token(&credentials.id),
            }),
            _ => Err(Failure::InvalidCredentials),
        }
    }

    /// The user a bearer token belongs to.
    pub fn authenticate(&self, token: &str) -> Option<String> {
        self.tokens.get(token).cloned()
    }

    pub fn get_user(&self, user_id: &str) -> Result<UserView, Failure> {
        if self.users.contains_key(user_id) {
            Ok(UserView {
                id: user_id.to_string(),
            })
        } else {
            Err(Failure::NotFound)
        }
    }

    pub fn heartbeat(&mut self, user_id: &str) -> Result<u64, Failure> {
        let user = self.users.get_mut(user_id).ok_or(Failure::NotFound)?;
        user.heartbeats += 1;
        Ok(user.heartbeats)
    }

    pub fn heartbeats(&self, user_id: &str) -> u64 {
        self.users.get(user_id).map_or(0, |u| u.heartbeats)
    }

    fn lobby(&self, lobby_id: &str) -> Result<&Lobby, Failure> {
        self.lobbies.iter().find(|l| l.id == lobby_id).ok_or(Failure::NotFound)
    }

    fn lobby_mut(&mut self, lobby_id: &str) -> Result<&mut Lobby, Failure> {
        self.lobbies.iter_mut().find(|l| l.id == lobby_id).ok_or(Failure::NotFound)
    }

    pub fn create_lobby(&mut self, owner: &str, input: CreateLobby) -> Result<LobbyView, Failure> {
        if input.size == 0 {
            return Err(Failure::InvalidSize);
        }
        validate_data(&input.data)?;
        let lobby = Lobby {
            id: Uuid::new_v4().to_string(),
            name: input.name.unwrap_or_default(),
            size: input.size,
            tags: input.tags,
            data: input.data,
            owner: owner.to_string(),
            members: vec![owner.to_string()],
        };
        let view = lobby.view();
        self.lobbies.push(lobby);
        Ok(view)
    }

    pub fn get_lobby(&self, lobby_id: &str) -> Result<LobbyView, Failure> {
        self.lobby(lobby_id).map(Lobby::view)
    }

    /// Newest first.
    pub fn recent_lobbies(&self) -> Vec<LobbyView> {
        self.lobbies.iter().rev().take(LIST_LIMIT).map(Lobby::view).collect()
    }

    pub fn joined_lobbies(&self, user_id: &str) -> Vec<LobbyView> {
        self.lobbies
            .iter()
            .rev()
            .filter(|l| l.is_member(user_id))
            .map(Lobby::view)
            .collect()
    }

    pub fn query_lobbies(&self, query: &Query) -> Vec<LobbyView> {
        self.lobbies
            .iter()
            .rev()
            .filter(|l| l.matches(query))
            .take(LIST_LIMIT)
            .map(Lobby::view)
            .collect()
    }

    pub fn members(&self, lobby_id: &str) -> Result<Vec<UserView>, Failure> {
        let lobby = self.lobby(lobby_id)?;
        Ok(lobby.members.iter().map(|id| UserView { id: id.clone() }).collect())
    }

    /// Joining a lobby the user is already in is a no-op.
    pub fn join(&mut self, lobby_id: &str, user_id: &str) -> Result<LobbyView, Failure> {
        let lobby = self.lobby_mut(lobby_id)?;
        if !lobby.is_member(user_id) {
            if lobby.available_space() == 0 {
                return Err(Failure::LobbyFull);
            }
            lobby.members.push(user_id.to_string());
        }
        Ok(lobby.view())
    }

    /// Members may remove themselves; the owner may remove anyone.
    ///
    /// When the owner leaves, the longest-standing member takes over. A lobby
    /// left without members is closed.
    pub fn remove_member(&mut self, lobby_id: &str, caller: &str, user_id: &str) -> Result<(), Failure> {
        let lobby = self.lobby_mut(lobby_id)?;
        if caller != user_id {
            lobby.require_owner(caller)?;
        }
        let position = lobby
            .members
            .iter()
            .position(|m| m == user_id)
            .ok_or(Failure::NotMember)?;
        lobby.members.remove(position);

        if lobby.members.is_empty() {
            self.lobbies.retain(|l| l.id != lobby_id);
        } else if lobby.owner == user_id {
            lobby.owner = lobby.members[0].clone();
        }
        Ok(())
    }

    pub fn owner(&self, lobby_id: &str) -> Result<UserView, Failure> {
        let lobby = self.lobby(lobby_id)?;
        Ok(UserView {
            id: lobby.owner.clone(),
        })
    }

    pub fn set_owner(&mut self, lobby_id: &str, caller: &str, new_owner: &str) -> Result<(), Failure> {
        let lobby = self.lobby_mut(lobby_id)?;
        lobby.require_owner(caller)?;
        if !lobby.is_member(new_owner) {
            return Err(Failure::NotMember);
        }
        lobby.owner = new_owner.to_string();
        Ok(())
    }

    pub fn modify(&mut self, lobby_id: &str, caller: &str, changes: ModifyLobby) -> Result<(), Failure> {
        let lobby = self.lobby_mut(lobby_id)?;
        lobby.require_owner(caller)?;
        if let Some(size) = changes.size {
            if size == 0 || size < lobby.member_count() {
                return Err(Failure::InvalidSize);
            }
        }
        if let Some(data) = &changes.data {
            validate_data(data)?;
        }

        if let Some(name) = changes.name {
            lobby.name = name;
        }
        if let Some(tags) = changes.tags {
            lobby.tags = tags;
        }
        if let Some(size) = changes.size {
            lobby.size = size;
        }
        if let Some(data) = changes.data {
            lobby.data = data;
        }
        Ok(())
    }

    pub fn close(&mut self, lobby_id: &str, caller: &str) -> Result<(), Failure> {
        self.lobby(lobby_id)?.require_owner(caller)?;
        self.lobbies.retain(|l| l.id != lobby_id);
        Ok(())
    }

    /// Apply `{key: scalar}` sets and `{key: null}` deletes. Any member may
    /// update lobby data.
    pub fn update_data(
        &mut self,
        lobby_id: &str,
        caller: &str,
        changes: Map<String, Value>,
    ) -> Result<LobbyView, Failure> {
        let lobby = self.lobby_mut(lobby_id)?;
        if !lobby.is_member(caller) {
            return Err(Failure::NotMember);
        }
        if !changes.values().all(|v| v.is_null() || is_scalar(v)) {
            return Err(Failure::InvalidData);
        }
        for (key, value) in changes {
            if value.is_null() {
                lobby.data.remove(&key);
            } else {
                lobby.data.insert(key, value);
            }
        }
        Ok(lobby.view())
    }
}

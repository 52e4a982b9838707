//! Payloads exchanged with the lobby services backend.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Integration tests catch any drift between the two crates. Request bodies
//! omit unset optional fields so a partial update never clears a property by
//! accident.

use serde::{Deserialize, Deserializer, Serialize};

use crate::data::{DataContainer, DataUpdate};

/// `null` and a missing field both decode to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A lobby as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyObject {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Maximum number of members.
    pub size: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: DataContainer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserObject {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousSecret {
    pub secret: String,
}

/// Response of `POST auth/user/anon/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAnonymousUserResult {
    pub user: UserObject,
    pub auth: AnonymousSecret,
    pub token: String,
}

/// Response of `POST auth/user/anon`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousAuth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousCredentialsBody {
    pub id: String,
    pub secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateLobbyBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub size: u32,
    #[serde(default)]
    pub data: DataContainer,
}

impl CreateLobbyBody {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }
}

/// Partial lobby update. `None` leaves the property as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifyLobbyBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataContainer>,
}

impl ModifyLobbyBody {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.tags.is_none() && self.size.is_none() && self.data.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOwnerBody {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateLobbyDataBody {
    pub data: DataUpdate,
}

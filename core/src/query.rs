//! Lobby search filters.
//!
//! Each filter can be specified once. Setting it again is reported as
//! `DuplicateFilter` immediately, before any request exists.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Inclusive `[min, max]` bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRange {
    pub min: u32,
    pub max: u32,
}

impl QueryRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn exactly(count: u32) -> Self {
        Self::new(count, count)
    }
}

/// Body of `POST lobbies/query`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LobbyQuery {
    #[serde(rename = "ownerID", default, skip_serializing_if = "Option::is_none")]
    owner_id: Option<String>,
    /// Free space for additional members.
    #[serde(rename = "capacity", default, skip_serializing_if = "Option::is_none")]
    available_space: Option<QueryRange>,
    #[serde(rename = "members", default, skip_serializing_if = "Option::is_none")]
    member_count: Option<QueryRange>,
    #[serde(rename = "tagsIncludeAny", default, skip_serializing_if = "Option::is_none")]
    tags_include_any: Option<Vec<String>>,
    #[serde(rename = "tagsIncludeAll", default, skip_serializing_if = "Option::is_none")]
    tags_include_all: Option<Vec<String>>,
    #[serde(rename = "tagsExcludeAny", default, skip_serializing_if = "Option::is_none")]
    tags_exclude_any: Option<Vec<String>>,
    #[serde(rename = "tagsExcludeAll", default, skip_serializing_if = "Option::is_none")]
    tags_exclude_all: Option<Vec<String>>,
}

fn set_once<T>(slot: &mut Option<T>, value: T, filter: &'static str) -> ApiResult<()> {
    if slot.is_some() {
        return Err(ApiError::DuplicateFilter { filter });
    }
    *slot = Some(value);
    Ok(())
}

fn collect_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tags.into_iter().map(Into::into).collect()
}

impl LobbyQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lobbies owned by the given user.
    pub fn with_owner(mut self, user_id: impl Into<String>) -> ApiResult<Self> {
        set_once(&mut self.owner_id, user_id.into(), "owner")?;
        Ok(self)
    }

    pub fn with_member_count(mut self, min: u32, max: u32) -> ApiResult<Self> {
        set_once(&mut self.member_count, QueryRange::new(min, max), "member count")?;
        Ok(self)
    }

    pub fn with_member_count_exactly(mut self, count: u32) -> ApiResult<Self> {
        set_once(&mut self.member_count, QueryRange::exactly(count), "member count")?;
        Ok(self)
    }

    /// Lobbies with room for between `min` and `max` more members.
    pub fn with_available_space(mut self, min: u32, max: u32) -> ApiResult<Self> {
        set_once(&mut self.available_space, QueryRange::new(min, max), "available space")?;
        Ok(self)
    }

    pub fn with_available_space_exactly(mut self, count: u32) -> ApiResult<Self> {
        set_once(&mut self.available_space, QueryRange::exactly(count), "available space")?;
        Ok(self)
    }

    pub fn include_any_tags<I, S>(mut self, tags: I) -> ApiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        set_once(&mut self.tags_include_any, collect_tags(tags), "include any tags")?;
        Ok(self)
    }

    pub fn include_all_tags<I, S>(mut self, tags: I) -> ApiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        set_once(&mut self.tags_include_all, collect_tags(tags), "include all tags")?;
        Ok(self)
    }

    pub fn exclude_any_tags<I, S>(mut self, tags: I) -> ApiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        set_once(&mut self.tags_exclude_any, collect_tags(tags), "exclude any tags")?;
        Ok(self)
    }

    pub fn exclude_all_tags<I, S>(mut self, tags: I) -> ApiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        set_once(&mut self.tags_exclude_all, collect_tags(tags), "exclude all tags")?;
        Ok(self)
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    pub fn member_count(&self) -> Option<QueryRange> {
        self.member_count
    }

    pub fn available_space(&self) -> Option<QueryRange> {
        self.available_space
    }

    pub fn tags_include_any(&self) -> Option<&[String]> {
        self.tags_include_any.as_deref()
    }

    pub fn tags_include_all(&self) -> Option<&[String]> {
        self.tags_include_all.as_deref()
    }

    pub fn tags_exclude_any(&self) -> Option<&[String]> {
        self.tags_exclude_any.as_deref()
    }

    pub fn tags_exclude_all(&self) -> Option<&[String]> {
        self.tags_exclude_all.as_deref()
    }
}

//! Custom lobby data: the full-state container and the partial update.
//!
//! # Design
//! Both maps are flat JSON objects on the wire, `{key: scalar}`. The
//! `DataEntry` wrapper only exists in memory so visibility metadata can be
//! added later without changing call sites; it serializes as its scalar.
//!
//! `DataUpdate` uses an explicit `DataChange` marker per key. A key that is
//! absent stays unchanged on the server, `Set` writes the value and `Delete`
//! is sent as JSON `null`. Updates are send-only: decoding one always fails.

use std::collections::btree_map::{self, BTreeMap};

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ApiError, ApiResult};
use crate::value::ScalarValue;

/// Who may read an entry. Only public entries exist today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Public,
}

/// A value in the lobby data map together with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DataEntry {
    value: ScalarValue,
    visibility: Visibility,
}

impl DataEntry {
    pub fn public(value: impl Into<ScalarValue>) -> Self {
        Self {
            value: value.into(),
            visibility: Visibility::Public,
        }
    }

    pub fn value(&self) -> &ScalarValue {
        &self.value
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn into_value(self) -> ScalarValue {
        self.value
    }
}

impl Serialize for DataEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DataEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ScalarValue::deserialize(deserializer).map(DataEntry::public)
    }
}

/// The complete custom data of a lobby.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataContainer {
    entries: BTreeMap<String, DataEntry>,
}

impl DataContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a public value. Fails if the key is already present.
    pub fn add_value(&mut self, key: impl Into<String>, value: impl Into<ScalarValue>) -> ApiResult<()> {
        match self.entries.entry(key.into()) {
            btree_map::Entry::Occupied(slot) => Err(ApiError::DuplicateKey {
                key: slot.key().clone(),
            }),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(DataEntry::public(value));
                Ok(())
            }
        }
    }

    /// Builder-style `add_value`.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<ScalarValue>) -> ApiResult<Self> {
        self.add_value(key, value)?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&ScalarValue> {
        self.entries.get(key).map(DataEntry::value)
    }

    pub fn entry(&self, key: &str) -> Option<&DataEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry.value()))
    }
}

impl Serialize for DataContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DataContainer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, DataEntry>::deserialize(deserializer).map(|entries| Self { entries })
    }
}

/// One recorded change in a `DataUpdate`.
#[derive(Debug, Clone, PartialEq)]
pub enum DataChange {
    Set(DataEntry),
    Delete,
}

/// A set of incremental changes to a lobby's custom data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataUpdate {
    changes: BTreeMap<String, DataChange>,
}

impl DataUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change that creates or replaces `key`.
    pub fn update_value(&mut self, key: impl Into<String>, value: impl Into<ScalarValue>) -> ApiResult<()> {
        self.record(key.into(), DataChange::Set(DataEntry::public(value)))
    }

    /// Record a change that deletes `key`.
    pub fn delete_value(&mut self, key: impl Into<String>) -> ApiResult<()> {
        self.record(key.into(), DataChange::Delete)
    }

    /// The change recorded for `key`; `None` means it is left unchanged.
    pub fn change(&self, key: &str) -> Option<&DataChange> {
        self.changes.get(key)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataChange)> {
        self.changes.iter().map(|(key, change)| (key.as_str(), change))
    }

    /// Updates are never received from the backend, so there is no decoder.
    pub fn from_json(_json: &str) -> ApiResult<Self> {
        Err(unsupported_decode())
    }

    fn record(&mut self, key: String, change: DataChange) -> ApiResult<()> {
        match self.changes.entry(key) {
            btree_map::Entry::Occupied(slot) => Err(ApiError::DuplicateKey {
                key: slot.key().clone(),
            }),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(change);
                Ok(())
            }
        }
    }
}

fn unsupported_decode() -> ApiError {
    ApiError::UnsupportedOperation {
        operation: "decode a data update",
    }
}

impl Serialize for DataUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.changes.len()))?;
        for (key, change) in &self.changes {
            match change {
                DataChange::Set(entry) => map.serialize_entry(key, entry)?,
                DataChange::Delete => map.serialize_entry(key, &())?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DataUpdate {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
        Err(serde::de::Error::custom(unsupported_decode()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn container_serializes_flat() {
        let data = DataContainer::new()
            .with_value("score", 10)
            .unwrap()
            .with_value("open", true)
            .unwrap()
            .with_value("map", "dust")
            .unwrap();
        let wire = serde_json::to_value(&data).unwrap();
        assert_eq!(wire, json!({"score": 10, "open": true, "map": "dust"}));
    }

    #[test]
    fn container_decodes_public_entries() {
        let data: DataContainer = serde_json::from_value(json!({"score": 10, "name": "x"})).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.get("score"), Some(&ScalarValue::Number(10.0)));
        assert_eq!(data.entry("name").unwrap().visibility(), Visibility::Public);
        assert!(data.get("missing").is_none());
    }

    #[test]
    fn container_rejects_nested_values() {
        let result: Result<DataContainer, _> = serde_json::from_value(json!({"a": {"b": 1}}));
        assert!(result.is_err());
    }

    #[test]
    fn container_rejects_duplicate_key() {
        let mut data = DataContainer::new();
        data.add_value("a", 1).unwrap();
        match data.add_value("a", 2) {
            Err(ApiError::DuplicateKey { key }) => assert_eq!(key, "a"),
            other => panic!("expected duplicate key, got {other:?}"),
        }
        assert_eq!(data.get("a"), Some(&ScalarValue::Number(1.0)));
    }

    #[test]
    fn update_serializes_sets_and_deletes() {
        let mut update = DataUpdate::new();
        update.update_value("a", 1).unwrap();
        update.delete_value("b").unwrap();
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"a":1,"b":null}"#);
    }

    #[test]
    fn update_falsy_set_is_not_a_delete() {
        let mut update = DataUpdate::new();
        update.update_value("flag", false).unwrap();
        update.update_value("count", 0).unwrap();
        update.update_value("label", "").unwrap();
        let wire = serde_json::to_value(&update).unwrap();
        assert_eq!(wire, json!({"flag": false, "count": 0, "label": ""}));
        assert!(matches!(update.change("flag"), Some(DataChange::Set(_))));
        assert!(update.change("untouched").is_none());
    }

    #[test]
    fn update_key_appears_once() {
        let mut update = DataUpdate::new();
        update.update_value("a", 1).unwrap();
        assert!(update.delete_value("a").is_err());
        assert_eq!(update.len(), 1);
    }

    #[test]
    fn update_decode_always_fails() {
        for payload in ["{}", r#"{"a":1}"#, r#"{"b":null}"#, "[]"] {
            let err = serde_json::from_str::<DataUpdate>(payload).unwrap_err();
            assert!(err.to_string().contains("unsupported operation"), "{err}");
            assert!(matches!(
                DataUpdate::from_json(payload),
                Err(ApiError::UnsupportedOperation { .. })
            ));
        }
    }
}

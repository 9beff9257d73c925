/// Opaque entity identifiers
///
/// The task API assigns identifiers server-side and is inconsistent about
/// their JSON type: some endpoints send numbers, others strings. [`EntityId`]
/// accepts either and compares by canonical text, so `1`, `"1"` and `"01"`
/// name the same entity. Numeric text is canonicalized to its decimal form.
///
/// On output a purely numeric identifier is written back as a JSON number,
/// since the create-task endpoint expects a numeric `category_id`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Server-assigned identifier for a task, category or user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    /// Creates an identifier from its textual form
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let id = id.trim();
        match id.parse::<i64>() {
            Ok(n) => EntityId(n.to_string()),
            Err(_) => EntityId(id.to_string()),
        }
    }

    /// Returns the textual form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn as_number(&self) -> Option<i64> {
        self.0.parse::<i64>().ok()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId(id.to_string())
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId::new(id)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_number() {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_str(&self.0),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Uint(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => EntityId(n.to_string()),
            RawId::Uint(n) => EntityId(n.to_string()),
            RawId::Text(s) => EntityId::new(s),
        })
    }
}

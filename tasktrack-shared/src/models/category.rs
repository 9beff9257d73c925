/// Category model
///
/// Categories group tasks. They are created by the user, owned by the user
/// who created them, and never renamed or deleted by this client. Tasks hold
/// a weak reference to a category which may dangle; lookups therefore go
/// through [`category_name`] which degrades to [`UNKNOWN_CATEGORY`].

use crate::error::{StoreError, StoreResult};
use crate::models::id::EntityId;
use serde::{Deserialize, Serialize};

/// Display name for a task whose category is missing or unknown
pub const UNKNOWN_CATEGORY: &str = "unknown category";

/// A task category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Server-assigned identifier
    pub id: EntityId,

    /// Non-empty name
    pub name: String,

    /// Owning user, when the server reports it
    #[serde(default, alias = "owner_id")]
    pub user_id: Option<EntityId>,
}

/// Body of a create-category request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

impl NewCategory {
    /// Trims and validates a category name
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if the trimmed name is empty.
    pub fn parse(name: &str) -> StoreResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Invalid("name: must not be blank".to_string()));
        }
        Ok(NewCategory {
            name: name.to_string(),
        })
    }
}

/// Resolves a task's category reference to a display name
pub fn category_name<'a>(categories: &'a [Category], id: Option<&EntityId>) -> &'a str {
    id.and_then(|id| categories.iter().find(|c| &c.id == id))
        .map(|c| c.name.as_str())
        .unwrap_or(UNKNOWN_CATEGORY)
}

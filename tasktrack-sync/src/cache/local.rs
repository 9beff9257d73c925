/// Typed cache operations
///
/// [`LocalCache`] knows about exactly two shapes: tracking history and the
/// session credential. It owns the storage keys and the corruption policy so
/// no other component touches the substrate directly.
///
/// # Keys
///
/// - `token`: bearer token (raw string)
/// - `user`: user profile (JSON)
/// - `tracking_history`: history entries, newest first (JSON array)
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tasktrack_sync::cache::{LocalCache, MemoryStore};
///
/// let cache = LocalCache::new(Arc::new(MemoryStore::new()));
/// assert!(cache.load_cached_history().is_empty());
/// assert!(cache.load_cached_session().is_none());
/// ```

use crate::cache::kv::{CacheError, KeyValueStore};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tasktrack_shared::models::{SessionCredential, TrackingEntry, UserProfile};

/// Storage key of the bearer token
pub const TOKEN_KEY: &str = "token";

/// Storage key of the user profile
pub const USER_KEY: &str = "user";

/// Storage key of the tracking history snapshot
pub const HISTORY_KEY: &str = "tracking_history";

/// Best-effort persistence for history and session
#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn KeyValueStore>,
}

impl LocalCache {
    /// Wraps a key-value substrate
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        LocalCache { store }
    }

    /// Last saved history snapshot; empty when absent or corrupt
    pub fn load_cached_history(&self) -> Vec<TrackingEntry> {
        self.read_json(HISTORY_KEY).unwrap_or_default()
    }

    /// Saves a history snapshot
    ///
    /// Returns `false` if the write failed (e.g. quota exceeded).
    pub fn save_cached_history(&self, entries: &[TrackingEntry]) -> bool {
        match serde_json::to_string(entries) {
            Ok(json) => self.write(HISTORY_KEY, &json),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode history for cache");
                false
            }
        }
    }

    /// Removes the history snapshot
    pub fn clear_history(&self) -> bool {
        self.delete(HISTORY_KEY)
    }

    /// Persisted session; `None` unless both token and profile are readable
    pub fn load_cached_session(&self) -> Option<SessionCredential> {
        let token = self.read_raw(TOKEN_KEY)?;
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let user: UserProfile = self.read_json(USER_KEY)?;
        Some(SessionCredential {
            token: token.to_string(),
            user,
        })
    }

    /// Persists a session so it survives a restart
    pub fn save_session(&self, credential: &SessionCredential) -> bool {
        let user = match serde_json::to_string(&credential.user) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode user profile for cache");
                return false;
            }
        };
        self.write(TOKEN_KEY, &credential.token) && self.write(USER_KEY, &user)
    }

    /// Removes the persisted session
    pub fn clear_session(&self) -> bool {
        let token = self.delete(TOKEN_KEY);
        let user = self.delete(USER_KEY);
        token && user
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache read failed, treating as empty");
                None
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                let e = CacheError::from(e);
                tracing::warn!(key, error = %e, "Cached value is corrupt, ignoring it");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> bool {
        match self.store.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache write failed");
                false
            }
        }
    }

    fn delete(&self, key: &str) -> bool {
        match self.store.remove(key) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache remove failed");
                false
            }
        }
    }
}

//! # Tasktrack Sync Library
//!
//! This library keeps an in-memory view of a user's tasks, categories and
//! status history consistent with a remote task API.
//!
//! ## Modules
//!
//! - `remote`: The task store contract, its HTTP client and an in-memory store
//! - `cache`: Best-effort local persistence for history and session
//! - `state`: The synchronized collections and their id-keyed transforms
//! - `synchronizer`: Intents, optimistic mutations, reconciliation and rollback
//! - `binding`: Per-view subscriptions and intent dispatch
//! - `view`: Read-only dashboard projection
//! - `refresh`: Periodic full refetch
//! - `timeout`: Request deadlines
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tasktrack_sync::cache::{LocalCache, MemoryStore};
//! use tasktrack_sync::remote::InMemoryTaskStore;
//! use tasktrack_sync::synchronizer::{SyncConfig, Synchronizer};
//!
//! # async fn example() {
//! let store = Arc::new(InMemoryTaskStore::new());
//! let cache = LocalCache::new(Arc::new(MemoryStore::new()));
//! let sync = Synchronizer::new(store, cache, SyncConfig::default());
//!
//! let report = sync.refresh_all().await;
//! println!("tasks loaded: {:?}", report.tasks);
//! # }
//! ```

pub mod binding;
pub mod cache;
pub mod refresh;
pub mod remote;
pub mod state;
pub mod synchronizer;
pub mod timeout;
pub mod view;

/// State synchronizer
///
/// The synchronizer owns the in-memory collections (tasks, categories,
/// history) and is the only component that mutates them. Views subscribe to
/// the state and issue intents; the synchronizer turns each intent into
/// local mutations and remote calls.
///
/// # Intents
///
/// | Intent | Local effect before the call | On success | On failure |
/// |---|---|---|---|
/// | `refresh_all` | none | commit each collection independently | keep stale data, warn per collection |
/// | `create_task` | validate only | append server task | nothing |
/// | `complete_task` | status := Completed | record history entry, persist | restore captured status |
/// | `delete_task` | remove task | keep removed | re-insert at captured index |
/// | `add_category` | validate only | append server category | nothing |
///
/// # Ordering
///
/// Intents run concurrently on a single logical thread and may resolve in
/// any order. Every state change is an id-keyed transform applied through
/// the watch channel to the state current at that moment, and each rollback
/// restores the value captured before its own optimistic change. No retries
/// are made; every failure is returned to the caller and published as a
/// [`Notice`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasktrack_shared::models::EntityId;
/// use tasktrack_sync::cache::{LocalCache, MemoryStore};
/// use tasktrack_sync::remote::InMemoryTaskStore;
/// use tasktrack_sync::synchronizer::{SyncConfig, Synchronizer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sync = Synchronizer::new(
///     Arc::new(InMemoryTaskStore::new()),
///     LocalCache::new(Arc::new(MemoryStore::new())),
///     SyncConfig::default(),
/// );
///
/// sync.hydrate();
/// sync.refresh_all().await;
/// sync.complete_task(&EntityId::from(1)).await?;
/// # Ok(())
/// # }
/// ```

use crate::cache::LocalCache;
use crate::remote::TaskStore;
use crate::state::{RefreshTicket, SyncState};
use crate::timeout::RequestTimeout;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tasktrack_shared::error::{StoreError, StoreResult};
use tasktrack_shared::models::category::NewCategory;
use tasktrack_shared::models::{Category, EntityId, Task, TaskDraft, TaskStatus, TrackingEntry};
use tokio::sync::{broadcast, watch};

/// Synchronizer configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Deadline applied to every remote call
    pub request_timeout: RequestTimeout,

    /// Buffered notices per subscriber before the oldest are dropped
    pub notice_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            request_timeout: RequestTimeout::default(),
            notice_capacity: 64,
        }
    }
}

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user, published on every intent outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}

/// How the history collection fared during a refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// Server history of the selected task was merged
    Fetched { task_id: EntityId, added: usize },

    /// No server history was available; the cached snapshot was merged
    FromCache { added: usize },

    /// The server rejected the history request
    Failed(StoreError),
}

/// Per-collection result of [`Synchronizer::refresh_all`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    /// Number of tasks committed, or why the fetch failed
    pub tasks: StoreResult<usize>,

    /// Number of categories committed, or why the fetch failed
    pub categories: StoreResult<usize>,

    pub history: HistoryOutcome,
}

impl RefreshReport {
    /// Checks if every collection was fetched from the server
    pub fn is_complete(&self) -> bool {
        self.tasks.is_ok()
            && self.categories.is_ok()
            && !matches!(self.history, HistoryOutcome::Failed(_))
    }

    /// Checks if the server could not be reached for either list
    pub fn is_offline(&self) -> bool {
        matches!(&self.tasks, Err(e) if e.is_network())
            && matches!(&self.categories, Err(e) if e.is_network())
    }
}

/// Keeps a refresh registered until it finishes or is dropped
struct RefreshGuard<'a> {
    state: &'a watch::Sender<SyncState>,
    ticket: RefreshTicket,
}

impl<'a> RefreshGuard<'a> {
    fn begin(state: &'a watch::Sender<SyncState>) -> Self {
        let mut ticket = RefreshTicket::default();
        // Bookkeeping only; subscribers are not woken.
        state.send_if_modified(|s| {
            ticket = s.begin_refresh();
            false
        });
        RefreshGuard { state, ticket }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        let ticket = self.ticket;
        self.state.send_if_modified(|s| {
            s.end_refresh(ticket);
            false
        });
    }
}

struct Inner {
    store: Arc<dyn TaskStore>,
    cache: LocalCache,
    state: watch::Sender<SyncState>,
    notices: broadcast::Sender<Notice>,
    timeout: RequestTimeout,
}

/// Keeps tasks, categories and history consistent with the remote store
///
/// Cloning is cheap and every clone drives the same state.
#[derive(Clone)]
pub struct Synchronizer {
    inner: Arc<Inner>,
}

impl Synchronizer {
    /// Creates a synchronizer with empty state
    pub fn new(store: Arc<dyn TaskStore>, cache: LocalCache, config: SyncConfig) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        let (notices, _) = broadcast::channel(config.notice_capacity.max(1));

        tracing::debug!(store = store.name(), "Synchronizer created");

        Synchronizer {
            inner: Arc::new(Inner {
                store,
                cache,
                state,
                notices,
                timeout: config.request_timeout,
            }),
        }
    }

    /// Subscribes to state changes
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    /// Subscribes to user-visible notices
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SyncState {
        self.inner.state.borrow().clone()
    }

    /// Local cache used for history and session persistence
    pub fn cache(&self) -> &LocalCache {
        &self.inner.cache
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        // Nobody listening is fine.
        let _ = self.inner.notices.send(Notice {
            level,
            message: message.into(),
        });
    }

    fn notify_failure(&self, action: &str, err: &StoreError) {
        self.notify(NoticeLevel::Error, format!("Failed to {}: {}", action, err));
    }

    fn persist_history(&self, history: &[TrackingEntry]) {
        if !self.inner.cache.save_cached_history(history) {
            self.notify(
                NoticeLevel::Warning,
                "Tracking history could not be saved locally",
            );
        }
    }

    /// Merges the cached history snapshot into the state
    fn merge_cached_history(&self) -> usize {
        let cached = self.inner.cache.load_cached_history();
        if cached.is_empty() {
            return 0;
        }
        let mut added = 0;
        self.inner.state.send_if_modified(|state| {
            added = state.merge_history(cached);
            added > 0
        });
        added
    }

    /// Loads the cached history into the state
    ///
    /// Call once when the session starts, before the first refresh.
    pub fn hydrate(&self) -> usize {
        let added = self.merge_cached_history();
        tracing::debug!(entries = added, "Hydrated history from cache");
        added
    }

    /// Sets the task whose server history is fetched on refresh
    pub fn select_task(&self, task_id: Option<EntityId>) {
        self.inner.state.send_if_modified(|state| {
            if state.selected_task == task_id {
                return false;
            }
            state.selected_task = task_id;
            true
        });
    }

    /// Clears the history in memory and in the cache
    pub fn clear_history(&self) {
        self.inner.state.send_modify(SyncState::clear_history);
        self.inner.cache.clear_history();
        tracing::info!("Tracking history cleared");
        self.notify(NoticeLevel::Info, "Tracking history cleared");
    }

    fn warn_collection(&self, collection: &'static str, err: &StoreError) {
        tracing::warn!(collection, error = %err, "Refresh failed, keeping previous data");
        let level = if err.is_network() {
            NoticeLevel::Warning
        } else {
            NoticeLevel::Error
        };
        self.notify(level, format!("Could not load {}: {}", collection, err));
    }

    /// Refetches every collection
    ///
    /// Tasks and categories are always fetched; the history is fetched only
    /// for the selected task. The fetches run concurrently and each one
    /// commits or fails on its own: a failed collection keeps whatever was
    /// loaded before. When no server history arrives, either because no task
    /// is selected or because the server is unreachable, the cached snapshot
    /// is merged instead.
    ///
    /// Completions and deletions confirmed while the fetch was under way are
    /// kept even when the fetched list predates them.
    pub async fn refresh_all(&self) -> RefreshReport {
        let store = &self.inner.store;
        let timeout = self.inner.timeout;
        let selected = self.inner.state.borrow().selected_task.clone();
        let refresh = RefreshGuard::begin(&self.inner.state);

        let history_call = async move {
            match selected {
                Some(task_id) => {
                    let result = timeout
                        .run("tracking_history", store.tracking_history(&task_id))
                        .await;
                    Some((task_id, result))
                }
                None => None,
            }
        };

        let (tasks, categories, history) = tokio::join!(
            timeout.run("list_tasks", store.list_tasks()),
            timeout.run("list_categories", store.list_categories()),
            history_call,
        );

        let tasks = match tasks {
            Ok(fresh) => {
                let count = fresh.len();
                self.inner
                    .state
                    .send_modify(|state| state.replace_tasks(fresh, refresh.ticket));
                Ok(count)
            }
            Err(e) => {
                self.warn_collection("tasks", &e);
                Err(e)
            }
        };

        let categories = match categories {
            Ok(fresh) => {
                let count = fresh.len();
                self.inner
                    .state
                    .send_modify(|state| state.replace_categories(fresh));
                Ok(count)
            }
            Err(e) => {
                self.warn_collection("categories", &e);
                Err(e)
            }
        };

        let history = match history {
            Some((task_id, Ok(entries))) => {
                let mut added = 0;
                let mut snapshot = None;
                self.inner.state.send_if_modified(|state| {
                    added = state.merge_history(entries);
                    if added > 0 {
                        snapshot = Some(state.history.clone());
                    }
                    added > 0
                });
                if let Some(snapshot) = snapshot {
                    self.persist_history(&snapshot);
                }
                HistoryOutcome::Fetched { task_id, added }
            }
            Some((_, Err(e))) if e.is_network() => {
                self.warn_collection("history", &e);
                HistoryOutcome::FromCache {
                    added: self.merge_cached_history(),
                }
            }
            Some((_, Err(e))) => {
                self.warn_collection("history", &e);
                HistoryOutcome::Failed(e)
            }
            None => HistoryOutcome::FromCache {
                added: self.merge_cached_history(),
            },
        };

        let report = RefreshReport {
            tasks,
            categories,
            history,
        };
        tracing::info!(
            complete = report.is_complete(),
            offline = report.is_offline(),
            "Refresh finished"
        );
        report
    }

    /// Creates a task from user input
    ///
    /// The draft is validated against the current categories first; nothing
    /// is sent if it is invalid. The task appears locally only once the
    /// server has assigned its id.
    pub async fn create_task(&self, draft: TaskDraft) -> StoreResult<Task> {
        let categories = self.inner.state.borrow().categories.clone();
        let new_task = match draft.into_new_task(&categories) {
            Ok(task) => task,
            Err(e) => {
                self.notify_failure("create task", &e);
                return Err(e);
            }
        };

        let result = self
            .inner
            .timeout
            .run("create_task", self.inner.store.create_task(&new_task))
            .await;

        match result {
            Ok(task) => {
                tracing::info!(task_id = %task.id, title = %task.title, "Task created");
                self.inner
                    .state
                    .send_modify(|state| state.upsert_task(task.clone()));
                self.notify(NoticeLevel::Info, format!("Task '{}' created", task.title));
                Ok(task)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Create task failed");
                self.notify_failure("create task", &e);
                Err(e)
            }
        }
    }

    /// Marks a task as completed, optimistically
    ///
    /// The status flips to `Completed` immediately. On success a history
    /// entry from the captured prior status is recorded and persisted (unless
    /// the task was already completed). On failure the captured prior status
    /// is restored.
    ///
    /// Completing a task whose completion is already in flight captures the
    /// status from before the first one. A failure then leaves the optimistic
    /// status to whichever completion is still outstanding, and the
    /// transition is recorded once.
    ///
    /// # Errors
    ///
    /// `NotFound` without a remote call if the task is not in the local
    /// state; otherwise whatever the remote store returned.
    pub async fn complete_task(&self, id: &EntityId) -> StoreResult<()> {
        let mut begun = None;
        self.inner.state.send_if_modified(|state| {
            begun = state.begin_complete(id);
            begun.is_some()
        });

        let Some((task, pending)) = begun else {
            let err = StoreError::NotFound(format!("Task {} is not loaded", id));
            self.notify_failure("complete task", &err);
            return Err(err);
        };

        let result = self
            .inner
            .timeout
            .run("complete_task", self.inner.store.complete_task(id))
            .await;

        match result {
            Ok(ack) => {
                let mut prior = None;
                let mut snapshot = None;
                self.inner.state.send_modify(|state| {
                    prior = state.confirm_complete(pending);
                    let entry = prior
                        .filter(|from| from.can_transition_to(TaskStatus::Completed))
                        .map(|from| {
                            TrackingEntry::transition(&task, from, TaskStatus::Completed, Utc::now())
                        });
                    if let Some(entry) = entry {
                        state.merge_history([entry]);
                        snapshot = Some(state.history.clone());
                    }
                });
                if let Some(snapshot) = snapshot {
                    self.persist_history(&snapshot);
                }

                tracing::info!(task_id = %id, from = ?prior, "Task completed");
                self.notify(
                    NoticeLevel::Info,
                    ack.message
                        .unwrap_or_else(|| "Task marked as completed".to_string()),
                );
                Ok(())
            }
            Err(e) => {
                let mut restored = None;
                self.inner.state.send_modify(|state| {
                    restored = state.reject_complete(pending);
                });
                tracing::warn!(task_id = %id, restored = ?restored, error = %e, "Complete failed, rolled back");
                self.notify_failure("complete task", &e);
                Err(e)
            }
        }
    }

    /// Deletes a task, optimistically
    ///
    /// The task disappears immediately. On failure it is re-inserted at its
    /// place in server order, unless it has reappeared in the meantime.
    /// History entries of the task are kept.
    ///
    /// # Errors
    ///
    /// `NotFound` without a remote call if the task is not in the local
    /// state; otherwise whatever the remote store returned.
    pub async fn delete_task(&self, id: &EntityId) -> StoreResult<()> {
        let mut begun = None;
        self.inner.state.send_if_modified(|state| {
            begun = state.begin_delete(id);
            begun.is_some()
        });

        let Some((index, task, pending)) = begun else {
            let err = StoreError::NotFound(format!("Task {} is not loaded", id));
            self.notify_failure("delete task", &err);
            return Err(err);
        };

        let result = self
            .inner
            .timeout
            .run("delete_task", self.inner.store.delete_task(id))
            .await;

        match result {
            Ok(ack) => {
                self.inner
                    .state
                    .send_modify(|state| state.confirm_delete(pending));
                tracing::info!(task_id = %id, "Task deleted");
                self.notify(
                    NoticeLevel::Info,
                    ack.message.unwrap_or_else(|| "Task deleted".to_string()),
                );
                Ok(())
            }
            Err(e) => {
                self.inner.state.send_modify(|state| {
                    state.reject_delete(pending, index, task);
                });
                tracing::warn!(task_id = %id, index, error = %e, "Delete failed, task restored");
                self.notify_failure("delete task", &e);
                Err(e)
            }
        }
    }

    /// Creates a category
    ///
    /// The name is trimmed and must not be empty. The category appears
    /// locally only once the server has assigned its id.
    pub async fn add_category(&self, name: &str) -> StoreResult<Category> {
        let category = match NewCategory::parse(name) {
            Ok(category) => category,
            Err(e) => {
                self.notify_failure("add category", &e);
                return Err(e);
            }
        };

        let result = self
            .inner
            .timeout
            .run("create_category", self.inner.store.create_category(&category))
            .await;

        match result {
            Ok(created) => {
                tracing::info!(category_id = %created.id, name = %created.name, "Category created");
                self.inner
                    .state
                    .send_modify(|state| state.upsert_category(created.clone()));
                self.notify(
                    NoticeLevel::Info,
                    format!("Category '{}' added", created.name),
                );
                Ok(created)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Add category failed");
                self.notify_failure("add category", &e);
                Err(e)
            }
        }
    }
}

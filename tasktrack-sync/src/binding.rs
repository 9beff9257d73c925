/// View binding
///
/// A [`ViewBinding`] is what a mounted view holds: a subscription to the
/// synchronized state plus a way to issue intents. Intents run on their own
/// Tokio task, so several can be in flight at once.
///
/// # Lifetime
///
/// Each binding carries a [`CancellationToken`] that is cancelled when the
/// view unmounts (explicitly or by dropping the binding). Cancellation only
/// stops outcome delivery: the synchronizer finishes every mutation it has
/// started, including reconciliation and rollback, so shared state stays
/// correct for the views that remain.
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::models::EntityId;
/// use tasktrack_sync::binding::Intent;
/// # use tasktrack_sync::synchronizer::Synchronizer;
///
/// # async fn example(sync: Synchronizer) {
/// let mut view = sync.bind();
/// view.dispatch(Intent::CompleteTask(EntityId::from(1)));
///
/// while view.changed().await {
///     let state = view.snapshot();
///     println!("{} tasks", state.tasks.len());
/// }
/// # }
/// ```

use crate::state::SyncState;
use crate::synchronizer::{RefreshReport, Synchronizer};
use crate::view::DashboardView;
use chrono::NaiveDate;
use tasktrack_shared::error::StoreResult;
use tasktrack_shared::models::{Category, EntityId, Task, TaskDraft};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A user action a view can request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Refresh,
    CreateTask(TaskDraft),
    CompleteTask(EntityId),
    DeleteTask(EntityId),
    AddCategory(String),
    SelectTask(Option<EntityId>),
    ClearHistory,
}

impl Intent {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Refresh => "refresh",
            Intent::CreateTask(_) => "create_task",
            Intent::CompleteTask(_) => "complete_task",
            Intent::DeleteTask(_) => "delete_task",
            Intent::AddCategory(_) => "add_category",
            Intent::SelectTask(_) => "select_task",
            Intent::ClearHistory => "clear_history",
        }
    }
}

/// Successful result of an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Refreshed(RefreshReport),
    TaskCreated(Task),
    TaskCompleted(EntityId),
    TaskDeleted(EntityId),
    CategoryAdded(Category),
    SelectionChanged(Option<EntityId>),
    HistoryCleared,
}

impl Synchronizer {
    /// Runs an intent to completion
    pub async fn execute(&self, intent: Intent) -> StoreResult<Outcome> {
        match intent {
            Intent::Refresh => Ok(Outcome::Refreshed(self.refresh_all().await)),
            Intent::CreateTask(draft) => self.create_task(draft).await.map(Outcome::TaskCreated),
            Intent::CompleteTask(id) => {
                self.complete_task(&id).await?;
                Ok(Outcome::TaskCompleted(id))
            }
            Intent::DeleteTask(id) => {
                self.delete_task(&id).await?;
                Ok(Outcome::TaskDeleted(id))
            }
            Intent::AddCategory(name) => self.add_category(&name).await.map(Outcome::CategoryAdded),
            Intent::SelectTask(id) => {
                self.select_task(id.clone());
                Ok(Outcome::SelectionChanged(id))
            }
            Intent::ClearHistory => {
                self.clear_history();
                Ok(Outcome::HistoryCleared)
            }
        }
    }

    /// Creates a binding for a newly mounted view
    pub fn bind(&self) -> ViewBinding {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        ViewBinding {
            sync: self.clone(),
            state: self.subscribe(),
            lifetime: CancellationToken::new(),
            outcomes_tx,
            outcomes_rx,
        }
    }
}

/// One view's connection to the synchronizer
pub struct ViewBinding {
    sync: Synchronizer,
    state: watch::Receiver<SyncState>,
    lifetime: CancellationToken,
    outcomes_tx: mpsc::UnboundedSender<StoreResult<Outcome>>,
    outcomes_rx: mpsc::UnboundedReceiver<StoreResult<Outcome>>,
}

impl ViewBinding {
    /// Starts an intent in the background
    ///
    /// The outcome is delivered through [`ViewBinding::next_outcome`] unless
    /// the view has unmounted by the time it resolves.
    pub fn dispatch(&self, intent: Intent) -> JoinHandle<()> {
        let sync = self.sync.clone();
        let lifetime = self.lifetime.clone();
        let outcomes = self.outcomes_tx.clone();

        tokio::spawn(async move {
            let name = intent.name();
            let result = sync.execute(intent).await;

            if lifetime.is_cancelled() {
                tracing::debug!(intent = name, "View unmounted, dropping outcome");
                return;
            }
            let _ = outcomes.send(result);
        })
    }

    /// Waits for the next intent outcome; `None` once unmounted
    pub async fn next_outcome(&mut self) -> Option<StoreResult<Outcome>> {
        tokio::select! {
            outcome = self.outcomes_rx.recv() => outcome,
            _ = self.lifetime.cancelled() => None,
        }
    }

    /// Waits until the state changes; `false` once unmounted
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            result = self.state.changed() => result.is_ok(),
            _ = self.lifetime.cancelled() => false,
        }
    }

    /// Copy of the current state, marking it as seen
    pub fn snapshot(&mut self) -> SyncState {
        self.state.borrow_and_update().clone()
    }

    /// Dashboard projection of the current state
    pub fn dashboard(&self, today: NaiveDate, history_limit: usize) -> DashboardView {
        DashboardView::project(&self.state.borrow(), today, history_limit)
    }

    /// Token cancelled when the view unmounts
    pub fn lifetime(&self) -> CancellationToken {
        self.lifetime.clone()
    }

    pub fn is_mounted(&self) -> bool {
        !self.lifetime.is_cancelled()
    }

    /// Stops outcome delivery; in-flight intents still finish
    pub fn unmount(&self) {
        if !self.lifetime.is_cancelled() {
            tracing::debug!("View unmounted");
            self.lifetime.cancel();
        }
    }
}

impl Drop for ViewBinding {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{LocalCache, MemoryStore};
    use crate::remote::{InMemoryTaskStore, Operation};
    use crate::synchronizer::SyncConfig;
    use std::sync::Arc;
    use std::time::Duration;
    use tasktrack_shared::error::ErrorKind;
    use tasktrack_shared::models::{Priority, TaskStatus};

    fn seeded() -> (Arc<InMemoryTaskStore>, Synchronizer) {
        let task = Task {
            id: EntityId::from(1),
            title: "Create wireframe".to_string(),
            priority: Priority::High,
            deadline: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            category_id: None,
            status: TaskStatus::Upcoming,
        };
        let store = Arc::new(InMemoryTaskStore::with_data(vec![task], Vec::new()));
        let cache = LocalCache::new(Arc::new(MemoryStore::new()));
        let sync = Synchronizer::new(store.clone(), cache, SyncConfig::default());
        (store, sync)
    }

    #[tokio::test]
    async fn test_dispatch_delivers_outcome() {
        let (_store, sync) = seeded();
        let mut view = sync.bind();

        view.dispatch(Intent::Refresh).await.unwrap();
        assert!(matches!(view.next_outcome().await, Some(Ok(Outcome::Refreshed(_)))));

        view.dispatch(Intent::CompleteTask(EntityId::from(1))).await.unwrap();
        assert_eq!(
            view.next_outcome().await,
            Some(Ok(Outcome::TaskCompleted(EntityId::from(1))))
        );
        assert_eq!(view.snapshot().tasks[0].status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_intent_delivers_error() {
        let (_store, sync) = seeded();
        let mut view = sync.bind();

        view.dispatch(Intent::DeleteTask(EntityId::from(7))).await.unwrap();
        let err = view.next_outcome().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_drops_outcome_but_finishes_mutation() {
        let (store, sync) = seeded();
        sync.refresh_all().await;
        store.set_latency(Operation::CompleteTask, Duration::from_secs(2)).await;

        let mut view = sync.bind();
        let handle = view.dispatch(Intent::CompleteTask(EntityId::from(1)));
        tokio::task::yield_now().await;
        view.unmount();

        handle.await.unwrap();
        assert!(!view.is_mounted());
        assert_eq!(view.next_outcome().await, None);

        let state = sync.snapshot();
        assert_eq!(state.tasks[0].status, TaskStatus::Completed);
        assert_eq!(state.history.len(), 1);
    }

    #[tokio::test]
    async fn test_changed_after_mutation() {
        let (_store, sync) = seeded();
        let mut view = sync.bind();

        let refresh = view.dispatch(Intent::Refresh);
        assert!(view.changed().await);
        refresh.await.unwrap();
        assert_eq!(view.snapshot().tasks.len(), 1);

        view.unmount();
        assert!(!view.changed().await);
    }

    #[tokio::test]
    async fn test_drop_cancels_lifetime() {
        let (_store, sync) = seeded();
        let view = sync.bind();
        let lifetime = view.lifetime();
        drop(view);
        assert!(lifetime.is_cancelled());
    }

    #[tokio::test]
    async fn test_select_intent() {
        let (_store, sync) = seeded();
        let outcome = sync
            .execute(Intent::SelectTask(Some(EntityId::from(1))))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::SelectionChanged(Some(EntityId::from(1))));
        assert_eq!(sync.snapshot().selected_task, Some(EntityId::from(1)));
    }
}

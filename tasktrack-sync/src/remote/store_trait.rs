/// Task store contract
///
/// The synchronizer talks to the remote API only through [`TaskStore`]. An
/// implementation must:
/// 1. Attach the current session credential to every call
/// 2. Fail fast with `Unauthorized` when no credential exists, without I/O
/// 3. Translate every transport or status failure into a [`StoreError`]
/// 4. Never retry; retry policy belongs to the caller
///
/// [`StoreError`]: tasktrack_shared::error::StoreError

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tasktrack_shared::error::StoreResult;
use tasktrack_shared::models::category::NewCategory;
use tasktrack_shared::models::{Category, EntityId, NewTask, Task, TrackingEntry};

/// Acknowledgement of a mutation that returns no entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Server-provided confirmation text
    #[serde(default)]
    pub message: Option<String>,
}

/// Remote store of tasks, categories and tracking history
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Lists the user's tasks
    async fn list_tasks(&self) -> StoreResult<Vec<Task>>;

    /// Creates a task and returns it with its server-assigned id
    async fn create_task(&self, task: &NewTask) -> StoreResult<Task>;

    /// Marks a task as completed
    async fn complete_task(&self, id: &EntityId) -> StoreResult<Ack>;

    /// Deletes a task
    async fn delete_task(&self, id: &EntityId) -> StoreResult<Ack>;

    /// Lists the user's categories
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    /// Creates a category and returns it with its server-assigned id
    async fn create_category(&self, category: &NewCategory) -> StoreResult<Category>;

    /// Status history of one task; an unknown task has an empty history
    async fn tracking_history(&self, task_id: &EntityId) -> StoreResult<Vec<TrackingEntry>>;
}

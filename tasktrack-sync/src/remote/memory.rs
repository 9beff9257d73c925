/// In-memory task store for testing and demos
///
/// Behaves like the HTTP API (server-assigned ids, 404 on unknown ids, empty
/// history for unknown tasks) without any I/O. Failures and latency can be
/// scripted per operation, which makes it possible to reproduce races between
/// a refresh and an in-flight mutation deterministically under a paused
/// Tokio clock.
///
/// # Example
///
/// ```
/// use tasktrack_sync::remote::{InMemoryTaskStore, Operation, TaskStore};
/// use tasktrack_shared::error::StoreError;
///
/// # async fn example() {
/// let store = InMemoryTaskStore::new();
/// store.fail_next(Operation::ListTasks, StoreError::ServerError("boom".into())).await;
///
/// assert!(store.list_tasks().await.is_err());
/// assert!(store.list_tasks().await.is_ok());
/// assert_eq!(store.calls(Operation::ListTasks).await, 2);
/// # }
/// ```

use crate::remote::store_trait::{Ack, TaskStore};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tasktrack_shared::error::{StoreError, StoreResult};
use tasktrack_shared::models::category::NewCategory;
use tasktrack_shared::models::{
    Category, EntityId, NewTask, Task, TaskStatus, TrackingEntry,
};
use tokio::sync::Mutex;

/// Store operations that can be scripted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListTasks,
    CreateTask,
    CompleteTask,
    DeleteTask,
    ListCategories,
    CreateCategory,
    TrackingHistory,
}

#[derive(Default)]
struct StoreData {
    tasks: Vec<Task>,
    categories: Vec<Category>,
    history: HashMap<EntityId, Vec<TrackingEntry>>,
    next_id: i64,
    offline: bool,
    failures: HashMap<Operation, VecDeque<StoreError>>,
    latency: HashMap<Operation, Duration>,
    reply_latency: HashMap<Operation, Duration>,
    calls: HashMap<Operation, usize>,
}

/// Scriptable in-process task store
pub struct InMemoryTaskStore {
    data: Mutex<StoreData>,
}

impl InMemoryTaskStore {
    /// Creates an empty store
    pub fn new() -> Self {
        InMemoryTaskStore {
            data: Mutex::new(StoreData {
                next_id: 1,
                ..StoreData::default()
            }),
        }
    }

    /// Creates a store pre-populated with tasks and categories
    pub fn with_data(tasks: Vec<Task>, categories: Vec<Category>) -> Self {
        let next_id = tasks
            .iter()
            .map(|t| &t.id)
            .chain(categories.iter().map(|c| &c.id))
            .filter_map(|id| id.as_str().parse::<i64>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        InMemoryTaskStore {
            data: Mutex::new(StoreData {
                tasks,
                categories,
                next_id,
                ..StoreData::default()
            }),
        }
    }

    /// Makes every call fail with `NetworkUnavailable` until switched back
    pub async fn set_offline(&self, offline: bool) {
        self.data.lock().await.offline = offline;
    }

    /// Queues a failure for the next call of `operation`
    pub async fn fail_next(&self, operation: Operation, error: StoreError) {
        self.data
            .lock()
            .await
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Delays every call of `operation` by `delay`
    pub async fn set_latency(&self, operation: Operation, delay: Duration) {
        self.data.lock().await.latency.insert(operation, delay);
    }

    /// Delays the reply of `operation` by `delay` after its result is taken,
    /// so the caller receives data as it was when the call arrived
    pub async fn set_reply_latency(&self, operation: Operation, delay: Duration) {
        self.data.lock().await.reply_latency.insert(operation, delay);
    }

    /// Seeds the server-side history of a task
    pub async fn seed_history(&self, task_id: EntityId, entries: Vec<TrackingEntry>) {
        self.data.lock().await.history.insert(task_id, entries);
    }

    /// Number of calls made to `operation`, including failed ones
    pub async fn calls(&self, operation: Operation) -> usize {
        self.data.lock().await.calls.get(&operation).copied().unwrap_or(0)
    }

    /// Server-side copy of the tasks
    pub async fn tasks(&self) -> Vec<Task> {
        self.data.lock().await.tasks.clone()
    }

    /// Server-side copy of the categories
    pub async fn categories(&self) -> Vec<Category> {
        self.data.lock().await.categories.clone()
    }

    /// Records the call, applies latency, and returns a scripted failure
    async fn enter(&self, operation: Operation) -> StoreResult<()> {
        let (delay, failure) = {
            let mut data = self.data.lock().await;
            *data.calls.entry(operation).or_default() += 1;

            let failure = if data.offline {
                Some(StoreError::NetworkUnavailable("store is offline".to_string()))
            } else {
                data.failures.get_mut(&operation).and_then(VecDeque::pop_front)
            };
            (data.latency.get(&operation).copied(), failure)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn reply<T>(&self, operation: Operation, value: T) -> StoreResult<T> {
        let delay = self.data.lock().await.reply_latency.get(&operation).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(value)
    }

    fn allocate_id(data: &mut StoreData) -> EntityId {
        let id = EntityId::from(data.next_id);
        data.next_id += 1;
        id
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        self.enter(Operation::ListTasks).await?;
        let tasks = self.data.lock().await.tasks.clone();
        self.reply(Operation::ListTasks, tasks).await
    }

    async fn create_task(&self, task: &NewTask) -> StoreResult<Task> {
        self.enter(Operation::CreateTask).await?;
        let mut data = self.data.lock().await;

        if task.title.trim().is_empty() {
            return Err(StoreError::Invalid("Title is required".to_string()));
        }
        if !data.categories.iter().any(|c| c.id == task.category_id) {
            return Err(StoreError::Invalid("Category does not exist".to_string()));
        }

        let created = Task {
            id: Self::allocate_id(&mut data),
            title: task.title.clone(),
            priority: task.priority,
            deadline: task.deadline,
            category_id: Some(task.category_id.clone()),
            status: TaskStatus::Upcoming,
        };
        data.tasks.push(created.clone());
        Ok(created)
    }

    async fn complete_task(&self, id: &EntityId) -> StoreResult<Ack> {
        self.enter(Operation::CompleteTask).await?;
        let mut data = self.data.lock().await;
        let task = data
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Task {} not found", id)))?;
        task.status = TaskStatus::Completed;
        Ok(Ack {
            message: Some("Task marked as complete".to_string()),
        })
    }

    async fn delete_task(&self, id: &EntityId) -> StoreResult<Ack> {
        self.enter(Operation::DeleteTask).await?;
        let mut data = self.data.lock().await;
        let before = data.tasks.len();
        data.tasks.retain(|t| &t.id != id);
        if data.tasks.len() == before {
            return Err(StoreError::NotFound(format!("Task {} not found", id)));
        }
        Ok(Ack {
            message: Some("Task deleted".to_string()),
        })
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        self.enter(Operation::ListCategories).await?;
        let categories = self.data.lock().await.categories.clone();
        self.reply(Operation::ListCategories, categories).await
    }

    async fn create_category(&self, category: &NewCategory) -> StoreResult<Category> {
        self.enter(Operation::CreateCategory).await?;
        let mut data = self.data.lock().await;
        let created = Category {
            id: Self::allocate_id(&mut data),
            name: category.name.clone(),
            user_id: None,
        };
        data.categories.push(created.clone());
        Ok(created)
    }

    async fn tracking_history(&self, task_id: &EntityId) -> StoreResult<Vec<TrackingEntry>> {
        self.enter(Operation::TrackingHistory).await?;
        let entries = self
            .data
            .lock()
            .await
            .history
            .get(task_id)
            .cloned()
            .unwrap_or_default();
        self.reply(Operation::TrackingHistory, entries).await
    }
}

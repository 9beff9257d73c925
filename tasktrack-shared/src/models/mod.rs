/// Domain models for Tasktrack
///
/// These types mirror the JSON shapes exchanged with the task API and the
/// shapes persisted by the local cache.
///
/// # Models
///
/// - `id`: Opaque server-assigned identifiers
/// - `task`: Tasks, priorities, statuses and creation drafts
/// - `category`: Task categories
/// - `tracking`: Append-only status-change history
/// - `session`: Bearer credential, user profile and auth requests
/// - `notification`: Self-scheduled reminders
///
/// # Example
///
/// ```
/// use tasktrack_shared::models::task::{Task, TaskStatus};
///
/// let task: Task = serde_json::from_str(
///     r#"{"id": 1, "title": "Write report", "priority": "High",
///         "deadline": "2024-03-01", "category_id": 2, "status": "In Progress"}"#,
/// ).unwrap();
/// assert_eq!(task.status, TaskStatus::InProgress);
/// ```

pub mod category;
pub mod id;
pub mod notification;
pub mod session;
pub mod task;
pub mod tracking;

pub use category::{Category, NewCategory};
pub use id::EntityId;
pub use notification::{NewReminder, Notification};
pub use session::{LoginRequest, RegisterRequest, RegisterResponse, SessionCredential, UserProfile};
pub use task::{NewTask, Priority, Task, TaskDraft, TaskStatus};
pub use tracking::TrackingEntry;

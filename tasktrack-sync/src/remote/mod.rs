/// Remote task store
///
/// This module contains the contract the synchronizer uses to reach the task
/// API and its implementations.
///
/// # Stores
///
/// - [`HttpTaskStore`]: The real API over HTTP, including login and registration
/// - [`InMemoryTaskStore`]: Scriptable in-process store for tests and demos
///
/// # Example
///
/// ```no_run
/// use tasktrack_sync::remote::{HttpConfig, HttpTaskStore, TaskStore};
/// use tasktrack_shared::auth::SessionContext;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = SessionContext::new();
/// let store = HttpTaskStore::new(HttpConfig::default(), session.handle())?;
/// let tasks = store.list_tasks().await?;
/// println!("{} tasks", tasks.len());
/// # Ok(())
/// # }
/// ```

pub mod http;
pub mod memory;
pub mod store_trait;

pub use http::{HttpConfig, HttpTaskStore};
pub use memory::{InMemoryTaskStore, Operation};
pub use store_trait::{Ack, TaskStore};

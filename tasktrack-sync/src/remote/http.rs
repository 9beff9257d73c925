/// HTTP client for the task API
///
/// # Endpoints
///
/// | Operation | Method | Path | Auth | Response |
/// |---|---|---|---|---|
/// | List tasks | GET | `/tasks/` | Bearer | `{ tasks }` |
/// | Create task | POST | `/tasks/` | Bearer | `{ task, message }` |
/// | Complete task | PUT | `/tasks/{id}/complete` | Bearer | `{ message }` |
/// | Delete task | DELETE | `/tasks/{id}` | Bearer | `{ message }` |
/// | List categories | GET | `/categories/` | Bearer | `{ categories }` |
/// | Create category | POST | `/categories/` | Bearer | `{ category }` |
/// | Tracking history | GET | `/tracking/{task_id}` | Bearer | `{ history }` |
/// | Login | POST | `/auth/login` | none | `{ token, user }` |
/// | Register | POST | `/auth/register` | none | `{ user }` or `{ message }` |
/// | List notifications | GET | `/notifications/` | Bearer | `{ notifications }` |
/// | Add reminder | POST | `/notifications/` | Bearer | `{ message }` |
/// | Mark read | PUT | `/notifications/{id}/read` | Bearer | `{ message }` |
///
/// Requests carry `Authorization: Bearer <token>` from the session handle.
/// The client is built with a bounded timeout; a request that times out or
/// never reaches the server fails with `NetworkUnavailable`.

use crate::remote::store_trait::{Ack, TaskStore};
use crate::timeout::RequestTimeout;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tasktrack_shared::auth::SessionHandle;
use tasktrack_shared::error::{StoreError, StoreResult};
use tasktrack_shared::models::category::NewCategory;
use tasktrack_shared::models::notification::{NewReminder, Notification};
use tasktrack_shared::models::session::{
    LoginRequest, RegisterRequest, RegisterResponse, SessionCredential, UserProfile,
};
use tasktrack_shared::models::{Category, EntityId, NewTask, Task, TrackingEntry};
use validator::Validate;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL, e.g. `http://127.0.0.1:8000`
    pub base_url: String,

    /// Per-request timeout
    pub timeout: RequestTimeout,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: RequestTimeout::default(),
        }
    }
}

#[derive(Deserialize)]
struct TasksEnvelope {
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct CreatedTaskEnvelope {
    task: Option<Task>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct CategoriesEnvelope {
    #[serde(default)]
    categories: Vec<Category>,
}

#[derive(Deserialize)]
struct CreatedCategoryEnvelope {
    category: Category,
}

#[derive(Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    history: Vec<TrackingEntry>,
}

#[derive(Deserialize)]
struct NotificationsEnvelope {
    #[serde(default)]
    notifications: Vec<Notification>,
}

#[derive(Deserialize)]
struct LoginEnvelope {
    token: String,
    user: UserProfile,
}

/// Error body shapes seen from the API
#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    detail: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message.or(self.error).or(self.detail)
    }
}

/// Task store backed by the HTTP API
#[derive(Clone)]
pub struct HttpTaskStore {
    client: Client,
    base_url: String,
    session: SessionHandle,
}

impl HttpTaskStore {
    /// Creates a client for the configured API
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or the HTTP client cannot be
    /// constructed.
    pub fn new(config: HttpConfig, session: SessionHandle) -> StoreResult<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StoreError::Invalid("base URL must not be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout.duration())
            .connect_timeout(config.timeout.duration().min(Duration::from_secs(5)))
            .build()
            .map_err(|e| StoreError::ServerError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpTaskStore {
            client,
            base_url,
            session,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches the bearer credential or fails without touching the network
    fn authorized(&self, request: RequestBuilder) -> StoreResult<RequestBuilder> {
        match self.session.current() {
            Some(credential) => Ok(request.header(reqwest::header::AUTHORIZATION, credential.bearer())),
            None => Err(StoreError::missing_credential()),
        }
    }

    /// Sends a request and returns the raw success body
    async fn execute(&self, request: RequestBuilder) -> StoreResult<SuccessBody> {
        let response = request.send().await.map_err(map_transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport)?;

        if status.is_success() {
            return Ok(SuccessBody(body.to_vec()));
        }

        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message);
        let err = StoreError::from_status(status.as_u16(), message);
        tracing::debug!(status = status.as_u16(), error = %err, "Request rejected");
        Err(err)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        self.execute(request).await?.decode()
    }

    /// Logs in and returns the issued credential
    ///
    /// The caller (the authentication boundary) is responsible for
    /// establishing the session with the returned credential.
    ///
    /// # Errors
    ///
    /// - `Invalid` if the request fails local validation or the server rejects it
    /// - `Unauthorized` if the credentials are wrong
    pub async fn login(&self, request: &LoginRequest) -> StoreResult<SessionCredential> {
        request.validate()?;
        tracing::debug!(email = %request.email, "POST /auth/login");

        let envelope: LoginEnvelope = self
            .fetch(self.client.post(self.url("/auth/login")).json(request))
            .await?;

        Ok(SessionCredential {
            token: envelope.token,
            user: envelope.user,
        })
    }

    /// Registers a new account
    ///
    /// Registration does not log the user in.
    pub async fn register(&self, request: &RegisterRequest) -> StoreResult<RegisterResponse> {
        request.validate()?;
        tracing::debug!(email = %request.email, "POST /auth/register");

        let body = self
            .execute(self.client.post(self.url("/auth/register")).json(request))
            .await?;
        body.decode_or_default()
    }

    /// Lists the user's reminders in server order
    pub async fn list_notifications(&self) -> StoreResult<Vec<Notification>> {
        let request = self.authorized(self.client.get(self.url("/notifications/")))?;
        tracing::debug!("GET /notifications/");
        let envelope: NotificationsEnvelope = self.fetch(request).await?;
        Ok(envelope.notifications)
    }

    /// Schedules a reminder
    ///
    /// The server does not echo the stored notification; list again to see
    /// its id.
    pub async fn add_reminder(&self, reminder: &NewReminder) -> StoreResult<Ack> {
        let request = self.authorized(self.client.post(self.url("/notifications/")).json(reminder))?;
        tracing::debug!(due = %reminder.timestamp, "POST /notifications/");
        self.execute(request).await?.decode_or_default()
    }

    /// Marks a reminder as read
    pub async fn mark_notification_read(&self, id: &EntityId) -> StoreResult<Ack> {
        let path = format!("/notifications/{}/read", id);
        let request = self.authorized(self.client.put(self.url(&path)))?;
        tracing::debug!(notification_id = %id, "PUT {}", path);
        self.execute(request).await?.decode_or_default()
    }
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let request = self.authorized(self.client.get(self.url("/tasks/")))?;
        tracing::debug!("GET /tasks/");
        let envelope: TasksEnvelope = self.fetch(request).await?;
        Ok(envelope.tasks)
    }

    async fn create_task(&self, task: &NewTask) -> StoreResult<Task> {
        let request = self.authorized(self.client.post(self.url("/tasks/")).json(task))?;
        tracing::debug!(title = %task.title, "POST /tasks/");
        let envelope: CreatedTaskEnvelope = self.fetch(request).await?;
        match envelope.task {
            Some(task) => Ok(task),
            None => Err(StoreError::ServerError(
                envelope
                    .message
                    .unwrap_or_else(|| "Create task response had no task".to_string()),
            )),
        }
    }

    async fn complete_task(&self, id: &EntityId) -> StoreResult<Ack> {
        let path = format!("/tasks/{}/complete", id);
        let request = self.authorized(self.client.put(self.url(&path)))?;
        tracing::debug!(task_id = %id, "PUT {}", path);
        self.execute(request).await?.decode_or_default()
    }

    async fn delete_task(&self, id: &EntityId) -> StoreResult<Ack> {
        let path = format!("/tasks/{}", id);
        let request = self.authorized(self.client.delete(self.url(&path)))?;
        tracing::debug!(task_id = %id, "DELETE {}", path);
        self.execute(request).await?.decode_or_default()
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let request = self.authorized(self.client.get(self.url("/categories/")))?;
        tracing::debug!("GET /categories/");
        let envelope: CategoriesEnvelope = self.fetch(request).await?;
        Ok(envelope.categories)
    }

    async fn create_category(&self, category: &NewCategory) -> StoreResult<Category> {
        let request = self.authorized(self.client.post(self.url("/categories/")).json(category))?;
        tracing::debug!(name = %category.name, "POST /categories/");
        let envelope: CreatedCategoryEnvelope = self.fetch(request).await?;
        Ok(envelope.category)
    }

    async fn tracking_history(&self, task_id: &EntityId) -> StoreResult<Vec<TrackingEntry>> {
        let path = format!("/tracking/{}", task_id);
        let request = self.authorized(self.client.get(self.url(&path)))?;
        tracing::debug!(task_id = %task_id, "GET {}", path);
        match self.fetch::<HistoryEnvelope>(request).await {
            Ok(envelope) => Ok(envelope.history),
            Err(StoreError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

/// Maps transport failures into the taxonomy
fn map_transport(err: reqwest::Error) -> StoreError {
    if err.is_decode() {
        StoreError::ServerError(format!("Malformed response: {}", err))
    } else if err.is_timeout() {
        StoreError::NetworkUnavailable(format!("Request timed out: {}", err))
    } else {
        StoreError::NetworkUnavailable(err.to_string())
    }
}

/// Raw body of a successful response
struct SuccessBody(Vec<u8>);

impl SuccessBody {
    fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_slice(&self.0)
            .map_err(|e| StoreError::ServerError(format!("Malformed response: {}", e)))
    }

    /// Like `decode`, but an empty body yields `T::default()`
    fn decode_or_default<T: DeserializeOwned + Default>(&self) -> StoreResult<T> {
        if self.0.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        self.decode()
    }
}

/// Common test utilities for integration tests
///
/// This module provides an in-process fake of the task API:
/// - Bearer-token check on every task, category, history and notification route
/// - Server-assigned ids
/// - Switchable failures and response delays
/// - Login and registration endpoints

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tasktrack_shared::auth::{SessionContext, SessionHandle};
use tasktrack_shared::models::category::NewCategory;
use tasktrack_shared::models::{
    Category, EntityId, NewReminder, NewTask, Notification, Priority, SessionCredential, Task,
    TaskStatus, UserProfile,
};
use tasktrack_sync::remote::{HttpConfig, HttpTaskStore};
use tasktrack_sync::timeout::RequestTimeout;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Token the fake accepts
pub const TOKEN: &str = "test-token";

/// Account the fake accepts at login
pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "secret";

/// Server-side data and behavior switches
#[derive(Default)]
pub struct Backend {
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,

    /// Raw history entries per task id, as the server would send them
    pub history: HashMap<String, Vec<Value>>,

    pub notifications: Vec<Notification>,

    pub next_id: i64,

    /// Every complete request fails with a 500
    pub fail_complete: bool,

    /// Every delete request fails with a 500
    pub fail_delete: bool,

    /// Delay before answering task list requests
    pub list_delay: Option<Duration>,
}

pub type Shared = Arc<Mutex<Backend>>;

/// Backend with two tasks and one category
pub fn seeded_backend() -> Backend {
    Backend {
        tasks: vec![
            task(1, "Create wireframe", TaskStatus::Upcoming),
            task(2, "Contract signing", TaskStatus::InProgress),
        ],
        categories: vec![Category {
            id: EntityId::from(10),
            name: "Work".to_string(),
            user_id: Some(EntityId::from(1)),
        }],
        next_id: 100,
        ..Backend::default()
    }
}

pub fn task(id: i64, title: &str, status: TaskStatus) -> Task {
    Task {
        id: EntityId::from(id),
        title: title.to_string(),
        priority: Priority::High,
        deadline: chrono::NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        category_id: Some(EntityId::from(10)),
        status,
    }
}

pub fn credential() -> SessionCredential {
    SessionCredential {
        token: TOKEN.to_string(),
        user: UserProfile {
            id: EntityId::from(1),
            name: "Ada".to_string(),
            email: EMAIL.to_string(),
        },
    }
}

/// Running fake server
pub struct FakeServer {
    pub base_url: String,
    pub state: Shared,
    handle: JoinHandle<()>,
}

impl FakeServer {
    /// Starts the fake on an ephemeral port
    pub async fn start(backend: Backend) -> Self {
        let state = Arc::new(Mutex::new(backend));
        let app = router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeServer {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    /// HTTP store using the given session handle
    pub fn store(&self, session: SessionHandle) -> HttpTaskStore {
        self.store_with_timeout(session, RequestTimeout::default())
    }

    pub fn store_with_timeout(&self, session: SessionHandle, timeout: RequestTimeout) -> HttpTaskStore {
        HttpTaskStore::new(
            HttpConfig {
                base_url: self.base_url.clone(),
                timeout,
            },
            session,
        )
        .unwrap()
    }

    /// HTTP store with an established session
    pub fn authorized_store(&self) -> (SessionContext, HttpTaskStore) {
        let session = SessionContext::restored(Some(credential()));
        let store = self.store(session.handle());
        (session, store)
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Backend) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    /// Stops serving; later requests fail to connect
    pub async fn stop(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

type Reply = (StatusCode, Json<Value>);

fn reply(status: StatusCode, body: Value) -> Reply {
    (status, Json(body))
}

fn check_auth(headers: &HeaderMap) -> Result<(), Reply> {
    let expected = format!("Bearer {}", TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(reply(
            StatusCode::UNAUTHORIZED,
            json!({ "message": "Invalid or expired token" }),
        )),
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/tasks/", get(list_tasks).post(create_task))
        .route("/tasks/:id/complete", put(complete_task))
        .route("/tasks/:id", axum::routing::delete(delete_task))
        .route("/categories/", get(list_categories).post(create_category))
        .route("/tracking/:id", get(tracking_history))
        .route("/notifications/", get(list_notifications).post(add_reminder))
        .route("/notifications/:id/read", put(mark_read))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .with_state(state)
}

async fn list_tasks(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if let Err(rejected) = check_auth(&headers) {
        return rejected;
    }
    let delay = state.lock().unwrap().list_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let tasks = state.lock().unwrap().tasks.clone();
    reply(StatusCode::OK, json!({ "tasks": tasks }))
}

async fn create_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewTask>,
) -> Reply {
    if let Err(rejected) = check_auth(&headers) {
        return rejected;
    }
    let mut backend = state.lock().unwrap();
    if !backend.categories.iter().any(|c| c.id == body.category_id) {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "message": "Category does not exist" }),
        );
    }

    let id = backend.next_id;
    backend.next_id += 1;
    let created = Task {
        id: EntityId::from(id),
        title: body.title,
        priority: body.priority,
        deadline: body.deadline,
        category_id: Some(body.category_id),
        status: TaskStatus::Upcoming,
    };
    backend.tasks.push(created.clone());
    reply(
        StatusCode::CREATED,
        json!({ "task": created, "message": "Task created successfully" }),
    )
}

async fn complete_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if let Err(rejected) = check_auth(&headers) {
        return rejected;
    }
    let mut backend = state.lock().unwrap();
    if backend.fail_complete {
        return reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "database unavailable" }),
        );
    }
    match backend.tasks.iter_mut().find(|t| t.id.as_str() == id) {
        Some(task) => {
            task.status = TaskStatus::Completed;
            reply(StatusCode::OK, json!({ "message": "Task marked as complete" }))
        }
        None => reply(StatusCode::NOT_FOUND, json!({ "message": "Task not found" })),
    }
}

async fn delete_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if let Err(rejected) = check_auth(&headers) {
        return rejected;
    }
    let mut backend = state.lock().unwrap();
    if backend.fail_delete {
        return reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "database unavailable" }),
        );
    }
    let before = backend.tasks.len();
    backend.tasks.retain(|t| t.id.as_str() != id);
    if backend.tasks.len() == before {
        return reply(StatusCode::NOT_FOUND, json!({ "message": "Task not found" }));
    }
    reply(StatusCode::OK, json!({ "message": "Task deleted successfully" }))
}

async fn list_categories(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if let Err(rejected) = check_auth(&headers) {
        return rejected;
    }
    let categories = state.lock().unwrap().categories.clone();
    reply(StatusCode::OK, json!({ "categories": categories }))
}

async fn create_category(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewCategory>,
) -> Reply {
    if let Err(rejected) = check_auth(&headers) {
        return rejected;
    }
    let mut backend = state.lock().unwrap();
    let id = backend.next_id;
    backend.next_id += 1;
    let created = Category {
        id: EntityId::from(id),
        name: body.name,
        user_id: Some(EntityId::from(1)),
    };
    backend.categories.push(created.clone());
    reply(StatusCode::CREATED, json!({ "category": created }))
}

async fn tracking_history(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if let Err(rejected) = check_auth(&headers) {
        return rejected;
    }
    match state.lock().unwrap().history.get(&id) {
        Some(entries) => reply(StatusCode::OK, json!({ "history": entries })),
        None => reply(StatusCode::NOT_FOUND, json!({ "message": "No history" })),
    }
}

async fn list_notifications(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if let Err(rejected) = check_auth(&headers) {
        return rejected;
    }
    let notifications = state.lock().unwrap().notifications.clone();
    reply(StatusCode::OK, json!({ "notifications": notifications }))
}

async fn add_reminder(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewReminder>,
) -> Reply {
    if let Err(rejected) = check_auth(&headers) {
        return rejected;
    }
    let mut backend = state.lock().unwrap();
    let id = backend.next_id;
    backend.next_id += 1;
    backend.notifications.push(Notification {
        id: EntityId::from(id),
        message: body.message,
        timestamp: body.timestamp,
        read: false,
    });
    reply(StatusCode::CREATED, json!({ "message": "Reminder added" }))
}

async fn mark_read(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if let Err(rejected) = check_auth(&headers) {
        return rejected;
    }
    let mut backend = state.lock().unwrap();
    match backend.notifications.iter_mut().find(|n| n.id.as_str() == id) {
        Some(notification) => {
            notification.read = true;
            reply(StatusCode::OK, json!({ "message": "Notification marked as read" }))
        }
        None => reply(StatusCode::NOT_FOUND, json!({ "message": "Notification not found" })),
    }
}

async fn login(Json(body): Json<Value>) -> Reply {
    let email = body.get("email").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);
    if email == Some(EMAIL) && password == Some(PASSWORD) {
        reply(
            StatusCode::OK,
            json!({
                "token": TOKEN,
                "user": { "id": 1, "username": "Ada", "email": EMAIL }
            }),
        )
    } else {
        reply(
            StatusCode::UNAUTHORIZED,
            json!({ "message": "Invalid email or password" }),
        )
    }
}

async fn register(Json(body): Json<Value>) -> Reply {
    if body.get("email").and_then(Value::as_str) == Some(EMAIL) {
        return reply(
            StatusCode::CONFLICT,
            json!({ "message": "Email already registered" }),
        );
    }
    reply(
        StatusCode::CREATED,
        json!({ "message": "User registered successfully" }),
    )
}

/// Common test utilities for CLI integration tests
///
/// Provides a minimal in-process task API and a configuration pointing at
/// it with a temporary data directory.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tasktrack_cli::config::Config;
use tasktrack_sync::timeout::RequestTimeout;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TOKEN: &str = "cli-token";
pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "secret";

type Shared = Arc<Mutex<Value>>;
type Reply = (StatusCode, Json<Value>);

/// Running fake API
pub struct FakeApi {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl FakeApi {
    pub async fn start() -> Self {
        let data = json!({
            "tasks": [
                {
                    "id": 1,
                    "title": "Create wireframe",
                    "priority": "High",
                    "deadline": "2024-03-10",
                    "category_id": 10,
                    "status": "Upcoming"
                }
            ],
            "categories": [{ "id": 10, "name": "Work" }],
            "notifications": [
                {
                    "id": 7,
                    "message": "Submit timesheet",
                    "timestamp": "2024-03-08T16:00:00",
                    "read": false
                }
            ],
            "next_id": 100
        });
        let state: Shared = Arc::new(Mutex::new(data));

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/tasks/", get(list_tasks).post(create_task))
            .route("/tasks/:id/complete", put(complete_task))
            .route("/categories/", get(list_categories))
            .route("/tracking/:id", get(tracking))
            .route("/notifications/", get(list_notifications).post(add_notification))
            .route("/notifications/:id/read", put(mark_read))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeApi {
            base_url: format!("http://{}", addr),
            handle,
        }
    }

    /// Configuration for this API and data directory
    pub fn config(&self, data_dir: &std::path::Path) -> Config {
        Config {
            api_url: self.base_url.clone(),
            timeout: RequestTimeout::exact(Duration::from_secs(5)),
            data_dir: data_dir.to_path_buf(),
            refresh_interval: Duration::ZERO,
        }
    }

    pub async fn stop(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

fn unauthorized(headers: &HeaderMap) -> Option<Reply> {
    let expected = format!("Bearer {}", TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => None,
        _ => Some((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid token" })),
        )),
    }
}

async fn login(Json(body): Json<Value>) -> Reply {
    if body["email"] == EMAIL && body["password"] == PASSWORD {
        (
            StatusCode::OK,
            Json(json!({
                "token": TOKEN,
                "user": { "id": 1, "username": "Ada", "email": EMAIL }
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        )
    }
}

async fn list_tasks(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if let Some(rejected) = unauthorized(&headers) {
        return rejected;
    }
    let tasks = state.lock().unwrap()["tasks"].clone();
    (StatusCode::OK, Json(json!({ "tasks": tasks })))
}

async fn create_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Some(rejected) = unauthorized(&headers) {
        return rejected;
    }
    let mut data = state.lock().unwrap();
    let id = data["next_id"].as_i64().unwrap_or(100);
    data["next_id"] = json!(id + 1);

    let mut task = body;
    task["id"] = json!(id);
    task["status"] = json!("Upcoming");
    if let Some(tasks) = data["tasks"].as_array_mut() {
        tasks.push(task.clone());
    }
    (StatusCode::CREATED, Json(json!({ "task": task })))
}

async fn complete_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    if let Some(rejected) = unauthorized(&headers) {
        return rejected;
    }
    let mut data = state.lock().unwrap();
    let task = data["tasks"]
        .as_array_mut()
        .and_then(|tasks| tasks.iter_mut().find(|t| t["id"] == id));
    match task {
        Some(task) => {
            task["status"] = json!("Completed");
            (StatusCode::OK, Json(json!({ "message": "Task marked as complete" })))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Task not found" })),
        ),
    }
}

async fn list_categories(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if let Some(rejected) = unauthorized(&headers) {
        return rejected;
    }
    let categories = state.lock().unwrap()["categories"].clone();
    (StatusCode::OK, Json(json!({ "categories": categories })))
}

async fn tracking(headers: HeaderMap, Path(_id): Path<String>) -> Reply {
    if let Some(rejected) = unauthorized(&headers) {
        return rejected;
    }
    (StatusCode::OK, Json(json!({ "history": [] })))
}

async fn list_notifications(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if let Some(rejected) = unauthorized(&headers) {
        return rejected;
    }
    let notifications = state.lock().unwrap()["notifications"].clone();
    (StatusCode::OK, Json(json!({ "notifications": notifications })))
}

async fn add_notification(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Some(rejected) = unauthorized(&headers) {
        return rejected;
    }
    let mut data = state.lock().unwrap();
    let id = data["next_id"].as_i64().unwrap_or(100);
    data["next_id"] = json!(id + 1);

    let mut notification = body;
    notification["id"] = json!(id);
    notification["read"] = json!(false);
    if let Some(notifications) = data["notifications"].as_array_mut() {
        notifications.push(notification);
    }
    (StatusCode::CREATED, Json(json!({ "message": "Reminder added successfully" })))
}

async fn mark_read(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    if let Some(rejected) = unauthorized(&headers) {
        return rejected;
    }
    let mut data = state.lock().unwrap();
    let notification = data["notifications"]
        .as_array_mut()
        .and_then(|list| list.iter_mut().find(|n| n["id"] == id));
    match notification {
        Some(notification) => {
            notification["read"] = json!(true);
            (StatusCode::OK, Json(json!({ "message": "Notification marked as read" })))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Notification not found" })),
        ),
    }
}

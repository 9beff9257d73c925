/// Integration tests for the command-line client
///
/// These tests run commands against a fake API with a temporary data
/// directory:
/// - Login, session persistence and logout
/// - Task commands and their output
/// - History surviving restarts
/// - Reminders
/// - Offline behavior and exit codes

#[allow(dead_code)]
mod common;

use common::{FakeApi, EMAIL, PASSWORD};
use tasktrack_cli::app::App;
use tasktrack_cli::cli::{
    AddArgs, Command, DashboardArgs, HistoryArgs, LoginArgs, NotificationIdArgs, RemindArgs,
    TaskIdArgs, TasksArgs,
};
use tasktrack_cli::commands;
use tasktrack_cli::error::{CliError, CliResult};
use tokio_util::sync::CancellationToken;

struct Output {
    out: String,
    err: String,
}

async fn run(app: &App, command: Command) -> (CliResult<()>, Output) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = commands::run(app, command, &mut out, &mut err, CancellationToken::new()).await;
    let output = Output {
        out: String::from_utf8(out).unwrap(),
        err: String::from_utf8(err).unwrap(),
    };
    (result, output)
}

fn login_command() -> Command {
    Command::Login(LoginArgs {
        email: EMAIL.to_string(),
        password: PASSWORD.to_string(),
    })
}

#[tokio::test]
async fn test_session_survives_restart_until_logout() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();

    let app = App::open(api.config(dir.path())).unwrap();
    let (result, output) = run(&app, login_command()).await;
    result.unwrap();
    assert_eq!(output.out, "Welcome back, Ada!\n");

    let restarted = App::open(api.config(dir.path())).unwrap();
    let (result, output) = run(&restarted, Command::Whoami).await;
    result.unwrap();
    assert_eq!(output.out, "Ada <ada@example.com> (id 1)\n");

    run(&restarted, Command::Logout).await.0.unwrap();
    let after_logout = App::open(api.config(dir.path())).unwrap();
    let (result, _) = run(&after_logout, Command::Whoami).await;
    assert!(matches!(result, Err(CliError::NotLoggedIn)));
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(api.config(dir.path())).unwrap();

    let (result, _) = run(
        &app,
        Command::Login(LoginArgs {
            email: EMAIL.to_string(),
            password: "wrong".to_string(),
        }),
    )
    .await;
    let err = result.unwrap_err();
    assert_eq!(err.exit_code(), 3);
    assert!(app.session().current().is_none());
}

#[tokio::test]
async fn test_data_commands_require_login() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(api.config(dir.path())).unwrap();

    let (result, _) = run(&app, Command::Dashboard(DashboardArgs { history: 5 })).await;
    let err = result.unwrap_err();
    assert!(matches!(err, CliError::NotLoggedIn));
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn test_complete_records_history_across_restarts() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(api.config(dir.path())).unwrap();
    run(&app, login_command()).await.0.unwrap();

    let (result, output) = run(&app, Command::Complete(TaskIdArgs { id: "1".to_string() })).await;
    result.unwrap();
    assert_eq!(output.out, "Task 1 marked as completed.\n");

    let restarted = App::open(api.config(dir.path())).unwrap();
    let (result, output) = run(&restarted, Command::History(HistoryArgs { task_id: None })).await;
    result.unwrap();
    assert!(output.out.contains("Create wireframe: Upcoming -> Completed"));
}

#[tokio::test]
async fn test_complete_unknown_task() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(api.config(dir.path())).unwrap();
    run(&app, login_command()).await.0.unwrap();

    let (result, _) = run(&app, Command::Complete(TaskIdArgs { id: "42".to_string() })).await;
    assert_eq!(result.unwrap_err().exit_code(), 4);
}

#[tokio::test]
async fn test_add_validates_before_sending() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(api.config(dir.path())).unwrap();
    run(&app, login_command()).await.0.unwrap();

    let (result, _) = run(
        &app,
        Command::Add(AddArgs {
            title: "Write report".to_string(),
            priority: "Medium".to_string(),
            deadline: "next week".to_string(),
            category: "10".to_string(),
        }),
    )
    .await;
    assert_eq!(result.unwrap_err().exit_code(), 2);

    let (result, output) = run(
        &app,
        Command::Add(AddArgs {
            title: "Write report".to_string(),
            priority: "Medium".to_string(),
            deadline: "2024-04-01".to_string(),
            category: "10".to_string(),
        }),
    )
    .await;
    result.unwrap();
    assert_eq!(output.out, "Created task 100: Write report\n");

    let (result, output) = run(&app, Command::Tasks(TasksArgs { json: true })).await;
    result.unwrap();
    let tasks: serde_json::Value = serde_json::from_str(&output.out).unwrap();
    assert_eq!(tasks.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_dashboard_renders() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(api.config(dir.path())).unwrap();
    run(&app, login_command()).await.0.unwrap();

    let (result, output) = run(&app, Command::Dashboard(DashboardArgs { history: 5 })).await;
    result.unwrap();
    assert!(output.out.starts_with("Tasks: 1 total, 1 upcoming"));
    assert!(output.out.contains("Create wireframe"));
    assert!(output.out.contains("Work"));
    assert!(output.err.is_empty());
}

#[tokio::test]
async fn test_dashboard_offline_warns() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    run(&App::open(api.config(dir.path())).unwrap(), login_command())
        .await
        .0
        .unwrap();
    let config = api.config(dir.path());
    api.stop().await;

    let app = App::open(config).unwrap();
    let (result, output) = run(&app, Command::Dashboard(DashboardArgs { history: 5 })).await;
    result.unwrap();
    assert_eq!(output.err, "warning: server unreachable, showing cached data\n");
    assert!(output.out.contains("No tasks."));
}

#[tokio::test]
async fn test_watch_stops_on_shutdown() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(api.config(dir.path())).unwrap();
    run(&app, login_command()).await.0.unwrap();

    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let mut out = Vec::new();
    let mut err = Vec::new();
    commands::run(
        &app,
        Command::Watch(DashboardArgs { history: 5 }),
        &mut out,
        &mut err,
        shutdown,
    )
    .await
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Tasks: 1 total"));
}

#[tokio::test]
async fn test_clear_history_works_logged_out() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(api.config(dir.path())).unwrap();

    let (result, output) = run(&app, Command::ClearHistory).await;
    result.unwrap();
    assert_eq!(output.out, "History cleared.\n");

    let (result, output) = run(&app, Command::History(HistoryArgs { task_id: None })).await;
    result.unwrap();
    assert_eq!(output.out, "  No history yet.\n");
}

#[tokio::test]
async fn test_remind_then_mark_read() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(api.config(dir.path())).unwrap();
    run(&app, login_command()).await.0.unwrap();

    let (result, output) = run(&app, Command::Notifications).await;
    result.unwrap();
    assert_eq!(output.out, "7      * 2024-03-08 16:00  Submit timesheet\n");

    let (result, output) = run(
        &app,
        Command::Remind(RemindArgs {
            message: "Call the bank".to_string(),
            at: "2024-03-09T09:30".to_string(),
        }),
    )
    .await;
    result.unwrap();
    assert_eq!(output.out, "Reminder added successfully\n");

    let (result, output) = run(&app, Command::MarkRead(NotificationIdArgs { id: "7".to_string() })).await;
    result.unwrap();
    assert_eq!(output.out, "Notification 7 marked as read.\n");

    let (result, output) = run(&app, Command::Notifications).await;
    result.unwrap();
    assert_eq!(
        output.out,
        "7        2024-03-08 16:00  Submit timesheet\n100    * 2024-03-09 09:30  Call the bank\n"
    );
}

#[tokio::test]
async fn test_remind_validates_before_sending() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(api.config(dir.path())).unwrap();
    run(&app, login_command()).await.0.unwrap();

    let (result, _) = run(
        &app,
        Command::Remind(RemindArgs {
            message: "Call the bank".to_string(),
            at: "soon".to_string(),
        }),
    )
    .await;
    assert_eq!(result.unwrap_err().exit_code(), 2);

    let (result, _) = run(&app, Command::MarkRead(NotificationIdArgs { id: "99".to_string() })).await;
    assert_eq!(result.unwrap_err().exit_code(), 4);

    let (result, output) = run(&app, Command::Notifications).await;
    result.unwrap();
    assert_eq!(output.out.lines().count(), 1);
}

#[tokio::test]
async fn test_notifications_require_login() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::open(api.config(dir.path())).unwrap();

    let (result, _) = run(&app, Command::Notifications).await;
    assert!(matches!(result, Err(CliError::NotLoggedIn)));
}

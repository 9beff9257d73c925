/// Command handlers
///
/// Each handler drives the synchronizer the way a view would: refresh, issue
/// intents, then render the resulting state. Regular output goes to `out`;
/// refresh warnings and notices go to `err`.
///
/// Login and logout are the authentication boundary: they are the only
/// places that establish or clear the session, and they keep the cached
/// session in step with it.

use crate::app::App;
use crate::cli::{
    AddArgs, AddCategoryArgs, Command, DashboardArgs, HistoryArgs, LoginArgs,
    NotificationIdArgs, RegisterArgs, RemindArgs, TaskIdArgs, TasksArgs,
};
use crate::error::{CliError, CliResult};
use crate::render;
use chrono::Local;
use std::io::Write;
use tasktrack_shared::models::tracking::history_for;
use tasktrack_shared::models::{EntityId, LoginRequest, NewReminder, RegisterRequest, TaskDraft};
use tasktrack_sync::refresh::spawn_periodic_refresh;
use tasktrack_sync::synchronizer::RefreshReport;
use tasktrack_sync::view::DashboardView;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

/// Runs one command to completion
///
/// `shutdown` ends long-running commands (`watch`).
pub async fn run(
    app: &App,
    command: Command,
    out: &mut dyn Write,
    err: &mut dyn Write,
    shutdown: CancellationToken,
) -> CliResult<()> {
    match command {
        Command::Login(args) => login(app, args, out).await,
        Command::Register(args) => register(app, args, out).await,
        Command::Logout => logout(app, out),
        Command::Whoami => whoami(app, out),
        Command::Dashboard(args) => dashboard(app, args, out, err).await,
        Command::Watch(args) => watch(app, args, out, err, shutdown).await,
        Command::Tasks(args) => tasks(app, args, out, err).await,
        Command::Add(args) => add(app, args, out).await,
        Command::Complete(args) => complete(app, args, out).await,
        Command::Delete(args) => delete(app, args, out).await,
        Command::Categories => categories(app, out, err).await,
        Command::AddCategory(args) => add_category(app, args, out).await,
        Command::History(args) => history(app, args, out, err).await,
        Command::ClearHistory => {
            app.sync().clear_history();
            writeln!(out, "History cleared.")?;
            Ok(())
        }
        Command::Notifications => notifications(app, out).await,
        Command::Remind(args) => remind(app, args, out).await,
        Command::MarkRead(args) => mark_read(app, args, out).await,
    }
}

async fn login(app: &App, args: LoginArgs, out: &mut dyn Write) -> CliResult<()> {
    let credential = app
        .http()
        .login(&LoginRequest {
            email: args.email,
            password: args.password,
        })
        .await?;

    if !app.cache().save_session(&credential) {
        tracing::warn!("Session could not be saved; it will not survive this process");
    }
    let name = credential.user.name.clone();
    app.session().establish(credential);

    writeln!(out, "Welcome back, {}!", name)?;
    Ok(())
}

async fn register(app: &App, args: RegisterArgs, out: &mut dyn Write) -> CliResult<()> {
    let email = args.email.clone();
    let response = app
        .http()
        .register(&RegisterRequest {
            name: args.name,
            email: args.email,
            password: args.password,
        })
        .await?;

    match response.message {
        Some(message) => writeln!(out, "{}", message)?,
        None => writeln!(out, "Registered {}.", email)?,
    }
    writeln!(out, "Log in with `tasktrack login --email {}`.", email)?;
    Ok(())
}

fn logout(app: &App, out: &mut dyn Write) -> CliResult<()> {
    app.session().clear();
    app.cache().clear_session();
    writeln!(out, "Logged out.")?;
    Ok(())
}

fn whoami(app: &App, out: &mut dyn Write) -> CliResult<()> {
    let credential = app.session().current().ok_or(CliError::NotLoggedIn)?;
    let user = credential.user;
    writeln!(out, "{} <{}> (id {})", user.name, user.email, user.id)?;
    Ok(())
}

/// Refreshes everything, reporting stale collections on `err`
async fn refresh(app: &App, err: &mut dyn Write) -> CliResult<RefreshReport> {
    app.require_login()?;
    let report = app.sync().refresh_all().await;
    render::refresh_warnings(err, &report)?;
    Ok(report)
}

/// Refreshes and requires the task list to have loaded
async fn refresh_tasks(app: &App) -> CliResult<RefreshReport> {
    app.require_login()?;
    let report = app.sync().refresh_all().await;
    if let Err(e) = &report.tasks {
        return Err(e.clone().into());
    }
    Ok(report)
}

fn project(app: &App, history_limit: usize) -> DashboardView {
    DashboardView::project(
        &app.sync().snapshot(),
        Local::now().date_naive(),
        history_limit,
    )
}

async fn dashboard(
    app: &App,
    args: DashboardArgs,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> CliResult<()> {
    refresh(app, err).await?;
    render::dashboard(out, &project(app, args.history))?;
    Ok(())
}

async fn watch(
    app: &App,
    args: DashboardArgs,
    out: &mut dyn Write,
    err: &mut dyn Write,
    shutdown: CancellationToken,
) -> CliResult<()> {
    app.require_login()?;
    let sync = app.sync();
    let mut view = sync.bind();
    let mut notices = sync.notices();
    let refresher = spawn_periodic_refresh(
        sync.clone(),
        app.config.refresh_interval,
        shutdown.child_token(),
    );

    let report = sync.refresh_all().await;
    render::refresh_warnings(err, &report)?;
    render::dashboard(out, &view.dashboard(Local::now().date_naive(), args.history))?;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = view.changed() => {
                if !changed {
                    break;
                }
                writeln!(out)?;
                render::dashboard(out, &view.dashboard(Local::now().date_naive(), args.history))?;
            }
            notice = notices.recv() => match notice {
                Ok(notice) => render::notice(err, &notice)?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Notices dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    view.unmount();
    shutdown.cancel();
    if let Err(e) = refresher.await {
        tracing::warn!(error = %e, "Refresh loop ended abnormally");
    }
    Ok(())
}

async fn tasks(app: &App, args: TasksArgs, out: &mut dyn Write, err: &mut dyn Write) -> CliResult<()> {
    if args.json {
        refresh_tasks(app).await?;
        let tasks = app.sync().snapshot().tasks;
        let json = serde_json::to_string_pretty(&tasks)
            .map_err(|e| CliError::Io(e.into()))?;
        writeln!(out, "{}", json)?;
        return Ok(());
    }

    refresh(app, err).await?;
    render::tasks(out, &project(app, 0).tasks)?;
    Ok(())
}

async fn add(app: &App, args: AddArgs, out: &mut dyn Write) -> CliResult<()> {
    let report = refresh_tasks(app).await?;
    if let Err(e) = report.categories {
        return Err(e.into());
    }

    let task = app
        .sync()
        .create_task(TaskDraft {
            title: args.title,
            priority: args.priority,
            deadline: args.deadline,
            category_id: args.category,
        })
        .await?;
    writeln!(out, "Created task {}: {}", task.id, task.title)?;
    Ok(())
}

async fn complete(app: &App, args: TaskIdArgs, out: &mut dyn Write) -> CliResult<()> {
    refresh_tasks(app).await?;
    let id = EntityId::new(&args.id);
    app.sync().complete_task(&id).await?;
    writeln!(out, "Task {} marked as completed.", id)?;
    Ok(())
}

async fn delete(app: &App, args: TaskIdArgs, out: &mut dyn Write) -> CliResult<()> {
    refresh_tasks(app).await?;
    let id = EntityId::new(&args.id);
    app.sync().delete_task(&id).await?;
    writeln!(out, "Task {} deleted.", id)?;
    Ok(())
}

async fn categories(app: &App, out: &mut dyn Write, err: &mut dyn Write) -> CliResult<()> {
    refresh(app, err).await?;
    render::categories(out, &app.sync().snapshot().categories)?;
    Ok(())
}

async fn add_category(app: &App, args: AddCategoryArgs, out: &mut dyn Write) -> CliResult<()> {
    app.require_login()?;
    let category = app.sync().add_category(&args.name).await?;
    writeln!(out, "Created category {}: {}", category.id, category.name)?;
    Ok(())
}

async fn history(
    app: &App,
    args: HistoryArgs,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> CliResult<()> {
    match args.task_id {
        Some(raw) => {
            let id = EntityId::new(&raw);
            app.sync().select_task(Some(id.clone()));
            refresh(app, err).await?;
            let state = app.sync().snapshot();
            render::history(out, history_for(&state.history, &id))?;
        }
        // Cached history only; works offline and logged out.
        None => render::history(out, &app.sync().snapshot().history)?,
    }
    Ok(())
}

async fn notifications(app: &App, out: &mut dyn Write) -> CliResult<()> {
    app.require_login()?;
    let notifications = app.http().list_notifications().await?;
    render::notifications(out, &notifications)?;
    Ok(())
}

async fn remind(app: &App, args: RemindArgs, out: &mut dyn Write) -> CliResult<()> {
    let reminder = NewReminder::parse(&args.message, &args.at)?;
    app.require_login()?;
    let ack = app.http().add_reminder(&reminder).await?;
    tracing::info!(due = %reminder.timestamp, "Reminder added");
    writeln!(
        out,
        "{}",
        ack.message
            .unwrap_or_else(|| "Reminder added successfully".to_string())
    )?;
    Ok(())
}

async fn mark_read(app: &App, args: NotificationIdArgs, out: &mut dyn Write) -> CliResult<()> {
    app.require_login()?;
    let id = EntityId::new(&args.id);
    app.http().mark_notification_read(&id).await?;
    writeln!(out, "Notification {} marked as read.", id)?;
    Ok(())
}

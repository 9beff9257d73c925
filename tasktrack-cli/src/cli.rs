/// Command-line arguments

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tasktrack")]
#[command(version)]
#[command(about = "Track tasks, categories and status history against a task API")]
pub struct Cli {
    #[arg(long, global = true, help = "Base URL of the task API.")]
    pub api_url: Option<String>,

    #[arg(long, global = true, help = "Directory of the local session and history cache.")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Per-request timeout in seconds (1-120).")]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Log in and remember the session.")]
    Login(LoginArgs),
    #[command(about = "Create an account.")]
    Register(RegisterArgs),
    #[command(about = "Forget the stored session.")]
    Logout,
    #[command(about = "Show the logged-in user.")]
    Whoami,
    #[command(about = "Refresh once and show the dashboard.")]
    Dashboard(DashboardArgs),
    #[command(about = "Keep the dashboard up to date until interrupted.")]
    Watch(DashboardArgs),
    #[command(about = "List tasks.")]
    Tasks(TasksArgs),
    #[command(about = "Create a task.")]
    Add(AddArgs),
    #[command(about = "Mark a task as completed.")]
    Complete(TaskIdArgs),
    #[command(about = "Delete a task.")]
    Delete(TaskIdArgs),
    #[command(about = "List categories.")]
    Categories,
    #[command(about = "Create a category.")]
    AddCategory(AddCategoryArgs),
    #[command(about = "Show status-change history, optionally for one task.")]
    History(HistoryArgs),
    #[command(about = "Erase the locally stored history.")]
    ClearHistory,
    #[command(about = "List reminders.")]
    Notifications,
    #[command(about = "Schedule a reminder.")]
    Remind(RemindArgs),
    #[command(about = "Mark a reminder as read.")]
    MarkRead(NotificationIdArgs),
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "TASKTRACK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "TASKTRACK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    #[arg(long, default_value_t = 5, help = "Number of history entries to show.")]
    pub history: usize,
}

#[derive(Debug, Args)]
pub struct TasksArgs {
    #[arg(long, help = "Print the tasks as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "Medium", help = "High, Medium or Low.")]
    pub priority: String,
    #[arg(long, help = "Due date as YYYY-MM-DD.")]
    pub deadline: String,
    #[arg(long, help = "Category id.")]
    pub category: String,
}

#[derive(Debug, Args)]
pub struct TaskIdArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct AddCategoryArgs {
    pub name: String,
}

#[derive(Debug, Args)]
pub struct RemindArgs {
    pub message: String,
    #[arg(long, help = "Due time as YYYY-MM-DDTHH:MM (UTC), RFC 3339, or YYYY-MM-DD.")]
    pub at: String,
}

#[derive(Debug, Args)]
pub struct NotificationIdArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[arg(help = "Also fetch the server history of this task.")]
    pub task_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_add_parses() {
        let cli = parse(&[
            "tasktrack",
            "add",
            "--title",
            "Write report",
            "--deadline",
            "2024-03-10",
            "--category",
            "2",
        ]);
        match cli.command {
            Command::Add(args) => {
                assert_eq!(args.title, "Write report");
                assert_eq!(args.priority, "Medium");
                assert_eq!(args.category, "2");
            }
            other => panic!("expected Add, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["tasktrack", "complete", "7", "--api-url", "http://localhost:9000"]);
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000"));
        assert!(matches!(cli.command, Command::Complete(ref args) if args.id == "7"));
    }

    #[test]
    fn test_history_task_is_optional() {
        let cli = parse(&["tasktrack", "history"]);
        assert!(matches!(cli.command, Command::History(HistoryArgs { task_id: None })));
    }

    #[test]
    fn test_kebab_case_commands() {
        assert!(matches!(parse(&["tasktrack", "clear-history"]).command, Command::ClearHistory));
        assert!(matches!(
            parse(&["tasktrack", "add-category", "Family"]).command,
            Command::AddCategory(_)
        ));
        assert!(matches!(
            parse(&["tasktrack", "mark-read", "4"]).command,
            Command::MarkRead(ref args) if args.id == "4"
        ));
    }

    #[test]
    fn test_remind_parses() {
        let cli = parse(&["tasktrack", "remind", "Call the bank", "--at", "2024-03-01T09:30"]);
        match cli.command {
            Command::Remind(args) => {
                assert_eq!(args.message, "Call the bank");
                assert_eq!(args.at, "2024-03-01T09:30");
            }
            other => panic!("expected Remind, got {:?}", other),
        }
    }
}

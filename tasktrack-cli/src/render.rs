/// Plain-text rendering of the dashboard projection

use std::io::{self, Write};
use tasktrack_shared::models::{Category, Notification, TrackingEntry};
use tasktrack_sync::synchronizer::{Notice, RefreshReport};
use tasktrack_sync::view::{CategoryRow, DashboardView, StatusCounts, TaskRow};

pub fn counts(out: &mut dyn Write, counts: &StatusCounts) -> io::Result<()> {
    write!(
        out,
        "Tasks: {} total, {} upcoming, {} in progress, {} completed",
        counts.total(),
        counts.upcoming,
        counts.in_progress,
        counts.completed
    )?;
    if counts.overdue > 0 {
        write!(out, " ({} overdue)", counts.overdue)?;
    }
    writeln!(out)
}

pub fn tasks(out: &mut dyn Write, rows: &[TaskRow]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "No tasks.");
    }
    writeln!(
        out,
        "{:<6} {:<13} {:<8} {:<11} {:<18} TITLE",
        "ID", "STATUS", "PRIORITY", "DUE", "CATEGORY"
    )?;
    for row in rows {
        // Pending rows are awaiting the server.
        let status = if row.pending {
            format!("{}*", row.status)
        } else {
            row.status.to_string()
        };
        writeln!(
            out,
            "{:<6} {:<13} {:<8} {:<11} {:<18} {}",
            row.id.to_string(),
            status,
            row.priority.to_string(),
            row.due.to_string(),
            row.category,
            row.title
        )?;
    }
    Ok(())
}

pub fn category_rows(out: &mut dyn Write, rows: &[CategoryRow]) -> io::Result<()> {
    for row in rows {
        writeln!(
            out,
            "  {} {} ({} tasks, {} open)",
            row.id, row.name, row.task_count, row.open_count
        )?;
    }
    Ok(())
}

pub fn categories(out: &mut dyn Write, categories: &[Category]) -> io::Result<()> {
    if categories.is_empty() {
        return writeln!(out, "No categories.");
    }
    for category in categories {
        writeln!(out, "{:<6} {}", category.id.to_string(), category.name)?;
    }
    Ok(())
}

pub fn history<'a, I>(out: &mut dyn Write, entries: I) -> io::Result<()>
where
    I: IntoIterator<Item = &'a TrackingEntry>,
{
    let mut any = false;
    for entry in entries {
        any = true;
        let title = if entry.task_title.is_empty() {
            format!("task {}", entry.task_id)
        } else {
            entry.task_title.clone()
        };
        writeln!(
            out,
            "  {}  {}: {} -> {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            title,
            entry.from,
            entry.to
        )?;
    }
    if !any {
        writeln!(out, "  No history yet.")?;
    }
    Ok(())
}

/// Reminders with an unread marker, in server order
pub fn notifications(out: &mut dyn Write, notifications: &[Notification]) -> io::Result<()> {
    if notifications.is_empty() {
        return writeln!(out, "No notifications.");
    }
    for notification in notifications {
        writeln!(
            out,
            "{:<6} {} {}  {}",
            notification.id.to_string(),
            if notification.read { " " } else { "*" },
            notification.timestamp.format("%Y-%m-%d %H:%M"),
            notification.message
        )?;
    }
    Ok(())
}

pub fn dashboard(out: &mut dyn Write, view: &DashboardView) -> io::Result<()> {
    counts(out, &view.counts)?;
    writeln!(out)?;
    tasks(out, &view.tasks)?;
    writeln!(out)?;
    writeln!(out, "Categories:")?;
    category_rows(out, &view.categories)?;
    writeln!(out)?;
    writeln!(out, "Recent activity:")?;
    history(out, &view.recent_history)
}

/// One warning line per collection that could not be refreshed
pub fn refresh_warnings(out: &mut dyn Write, report: &RefreshReport) -> io::Result<()> {
    if report.is_offline() {
        return writeln!(out, "warning: server unreachable, showing cached data");
    }
    if let Err(e) = &report.tasks {
        writeln!(out, "warning: tasks not refreshed: {}", e)?;
    }
    if let Err(e) = &report.categories {
        writeln!(out, "warning: categories not refreshed: {}", e)?;
    }
    Ok(())
}

pub fn notice(out: &mut dyn Write, notice: &Notice) -> io::Result<()> {
    writeln!(out, "{}", notice)
}

/// Dashboard projection
///
/// Read-only summary of a [`SyncState`] for rendering. Projection is a pure
/// function of the state and the current date, so views can recompute it on
/// every state change.

use crate::state::SyncState;
use chrono::NaiveDate;
use std::fmt;
use tasktrack_shared::models::category::category_name;
use tasktrack_shared::models::{EntityId, Priority, TaskStatus, TrackingEntry};
use tasktrack_shared::models::task::DEADLINE_FORMAT;

/// Number of tasks per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub upcoming: usize,
    pub in_progress: usize,
    pub completed: usize,

    /// Open tasks whose deadline has passed
    pub overdue: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.upcoming + self.in_progress + self.completed
    }
}

/// When a task is due, relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueLabel {
    Overdue,
    Today,
    Tomorrow,
    On(NaiveDate),
}

impl DueLabel {
    /// Labels a deadline; completed tasks are never overdue
    pub fn for_deadline(deadline: NaiveDate, status: TaskStatus, today: NaiveDate) -> Self {
        let days = (deadline - today).num_days();
        match days {
            d if d < 0 && !status.is_completed() => DueLabel::Overdue,
            0 => DueLabel::Today,
            1 => DueLabel::Tomorrow,
            _ => DueLabel::On(deadline),
        }
    }
}

impl fmt::Display for DueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueLabel::Overdue => f.write_str("Overdue"),
            DueLabel::Today => f.write_str("Today"),
            DueLabel::Tomorrow => f.write_str("Tomorrow"),
            DueLabel::On(date) => write!(f, "{}", date.format(DEADLINE_FORMAT)),
        }
    }
}

/// One task line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: EntityId,
    pub title: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub deadline: NaiveDate,
    pub due: DueLabel,

    /// Resolved category name, or the unknown-category placeholder
    pub category: String,

    /// An optimistic change to this task is awaiting the server
    pub pending: bool,
}

/// One category line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub id: EntityId,
    pub name: String,
    pub task_count: usize,
    pub open_count: usize,
}

/// Everything the dashboard shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub counts: StatusCounts,
    pub tasks: Vec<TaskRow>,
    pub categories: Vec<CategoryRow>,

    /// Newest history entries, at most the requested number
    pub recent_history: Vec<TrackingEntry>,
}

impl DashboardView {
    /// Projects a state as of `today`
    pub fn project(state: &SyncState, today: NaiveDate, history_limit: usize) -> Self {
        let mut counts = StatusCounts::default();
        for task in &state.tasks {
            match task.status {
                TaskStatus::Upcoming => counts.upcoming += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Completed => counts.completed += 1,
            }
            if task.is_overdue(today) {
                counts.overdue += 1;
            }
        }

        let tasks = state
            .tasks
            .iter()
            .map(|task| TaskRow {
                id: task.id.clone(),
                title: task.title.clone(),
                priority: task.priority,
                status: task.status,
                deadline: task.deadline,
                due: DueLabel::for_deadline(task.deadline, task.status, today),
                category: category_name(&state.categories, task.category_id.as_ref()).to_string(),
                pending: state.has_pending(&task.id),
            })
            .collect();

        let categories = state
            .categories
            .iter()
            .map(|category| {
                let in_category = state
                    .tasks
                    .iter()
                    .filter(|t| t.category_id.as_ref() == Some(&category.id));
                let (task_count, open_count) = in_category.fold((0, 0), |(all, open), t| {
                    (all + 1, open + usize::from(!t.status.is_completed()))
                });
                CategoryRow {
                    id: category.id.clone(),
                    name: category.name.clone(),
                    task_count,
                    open_count,
                }
            })
            .collect();

        DashboardView {
            counts,
            tasks,
            categories,
            recent_history: state.history.iter().take(history_limit).cloned().collect(),
        }
    }
}

/// Status-change history
///
/// Tracking entries form an append-only log ordered newest first. Each entry
/// denormalizes the task title so that history can be shown after the task
/// itself is gone; deleting a task never removes its history.
///
/// The backend reports history inconsistently, so the client merges what the
/// server returns with what it synthesized and cached itself. [`merge_history`]
/// is the only way entries enter a history vector: it de-duplicates and keeps
/// the ordering, and it never removes anything.

use crate::models::id::EntityId;
use crate::models::task::{Task, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One status transition of one task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingEntry {
    /// When the transition happened
    #[serde(alias = "changed_at", alias = "created_at")]
    pub timestamp: DateTime<Utc>,

    /// Status before the transition
    #[serde(alias = "old_status")]
    pub from: TaskStatus,

    /// Status after the transition
    #[serde(alias = "new_status")]
    pub to: TaskStatus,

    /// Task the transition applies to
    pub task_id: EntityId,

    /// Task title at the time of the transition
    #[serde(default, alias = "title")]
    pub task_title: String,
}

impl TrackingEntry {
    /// Synthesizes an entry for a transition observed by the client
    pub fn transition(task: &Task, from: TaskStatus, to: TaskStatus, at: DateTime<Utc>) -> Self {
        TrackingEntry {
            timestamp: at,
            from,
            to,
            task_id: task.id.clone(),
            task_title: task.title.clone(),
        }
    }
}

/// Merges `incoming` into `history`
///
/// Entries already present (all fields equal) are skipped. The result is
/// sorted newest first; entries with equal timestamps keep their relative
/// order. Returns the number of entries added.
pub fn merge_history<I>(history: &mut Vec<TrackingEntry>, incoming: I) -> usize
where
    I: IntoIterator<Item = TrackingEntry>,
{
    let before = history.len();
    for entry in incoming {
        if !history.contains(&entry) {
            history.push(entry);
        }
    }
    let added = history.len() - before;
    if added > 0 {
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }
    added
}

/// Entries for a single task, newest first
pub fn history_for<'a>(history: &'a [TrackingEntry], task_id: &EntityId) -> Vec<&'a TrackingEntry> {
    history.iter().filter(|e| &e.task_id == task_id).collect()
}

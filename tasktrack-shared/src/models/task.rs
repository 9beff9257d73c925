/// Task model
///
/// A task is created by the server (which assigns its identifier) and then
/// observed and mutated by the client through completion and deletion.
///
/// # Status flow
///
/// ```text
/// Upcoming ──┐
///            ├──> Completed
/// In Progress┘
/// ```
///
/// The client only ever moves a task towards `Completed`, but the server is
/// free to report any status and the model does not reject regressions.
///
/// # Wire format
///
/// ```json
/// {
///   "id": 12,
///   "title": "Contract signing",
///   "priority": "High",
///   "deadline": "2024-03-03",
///   "category_id": 2,
///   "status": "In Progress"
/// }
/// ```

use crate::error::{StoreError, StoreResult};
use crate::models::category::Category;
use crate::models::id::EntityId;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// Date format used for deadlines on the wire and in user input
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(StoreError::Invalid(format!(
                "priority: '{}' is not one of High, Medium, Low",
                other
            ))),
        }
    }
}

/// Task status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not started yet
    #[default]
    Upcoming,

    /// Being worked on
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,

    /// Done
    Completed,
}

impl TaskStatus {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Upcoming => "Upcoming",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Checks if the task is done
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// Checks if the UI may move this status forward to `target`
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        match (self, target) {
            (TaskStatus::Upcoming, TaskStatus::InProgress) => true,
            (TaskStatus::Upcoming, TaskStatus::Completed) => true,
            (TaskStatus::InProgress, TaskStatus::Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task as held by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier
    pub id: EntityId,

    /// Non-empty title
    pub title: String,

    #[serde(default)]
    pub priority: Priority,

    /// Due date
    #[serde(with = "deadline_format")]
    pub deadline: NaiveDate,

    /// Weak reference to a category; may dangle
    #[serde(default)]
    pub category_id: Option<EntityId>,

    /// Servers that omit the status are creating a fresh task
    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    /// Checks if the deadline has passed without the task being completed
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_completed() && self.deadline < today
    }
}

/// Body of a create-task request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub priority: Priority,
    #[serde(with = "deadline_format")]
    pub deadline: NaiveDate,
    pub category_id: EntityId,
}

/// Raw task input as typed by a user
///
/// All fields are text so that validation can report every problem with the
/// input instead of failing at the first type conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TaskDraft {
    #[validate(custom(function = "validate_not_blank"))]
    pub title: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub priority: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub deadline: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub category_id: String,
}

impl TaskDraft {
    /// Validates the draft against the known categories
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if:
    /// - any field is blank
    /// - the priority is not High, Medium or Low
    /// - the deadline is not a `YYYY-MM-DD` date
    /// - the category is not among `categories`
    ///
    /// # Example
    ///
    /// ```
    /// use tasktrack_shared::models::{Category, EntityId, Priority, TaskDraft};
    ///
    /// let categories = vec![Category {
    ///     id: EntityId::from(1),
    ///     name: "Work".to_string(),
    ///     user_id: None,
    /// }];
    /// let draft = TaskDraft {
    ///     title: "Market overview keynote".to_string(),
    ///     priority: "low".to_string(),
    ///     deadline: "2024-03-04".to_string(),
    ///     category_id: "1".to_string(),
    /// };
    /// let task = draft.into_new_task(&categories).unwrap();
    /// assert_eq!(task.priority, Priority::Low);
    /// ```
    pub fn into_new_task(self, categories: &[Category]) -> StoreResult<NewTask> {
        self.validate()?;

        let priority = self.priority.parse::<Priority>()?;

        let deadline = NaiveDate::parse_from_str(self.deadline.trim(), DEADLINE_FORMAT)
            .map_err(|_| {
                StoreError::Invalid(format!(
                    "deadline: '{}' is not a YYYY-MM-DD date",
                    self.deadline.trim()
                ))
            })?;

        let category_id = EntityId::new(self.category_id);
        if !categories.iter().any(|c| c.id == category_id) {
            return Err(StoreError::Invalid(format!(
                "category_id: unknown category {}",
                category_id
            )));
        }

        Ok(NewTask {
            title: self.title.trim().to_string(),
            priority,
            deadline,
            category_id,
        })
    }
}

/// Rejects empty and whitespace-only text
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed("must not be blank")));
    }
    Ok(())
}

/// Serde adapter for deadlines
///
/// Writes `YYYY-MM-DD`. Reads that, or a full RFC 3339 / RFC 2822 timestamp
/// truncated to its date, since backends differ in how they render dates.
pub mod deadline_format {
    use super::*;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(DEADLINE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_deadline(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid deadline '{}'", raw))
        })
    }

    /// Parses any of the accepted deadline renderings
    pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, DEADLINE_FORMAT) {
            return Some(date);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.date_naive());
        }
        if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
            return Some(ts.date_naive());
        }
        // "2024-03-01T00:00:00" without an offset
        raw.get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, DEADLINE_FORMAT).ok())
    }
}

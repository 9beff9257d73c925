/// Notification model
///
/// Notifications are reminders the user schedules for themselves. The server
/// stores them with a message and the time they are due, and tracks whether
/// they have been read.
///
/// # Wire format
///
/// ```json
/// { "id": 4, "message": "Call the bank", "timestamp": "2024-03-01T09:30:00Z", "read": false }
/// ```

use crate::error::{StoreError, StoreResult};
use crate::models::id::EntityId;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A reminder as stored by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: EntityId,

    pub message: String,

    /// When the reminder is due
    #[serde(deserialize_with = "deserialize_when")]
    pub timestamp: DateTime<Utc>,

    #[serde(default, alias = "is_read")]
    pub read: bool,
}

/// Body of an add-reminder request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReminder {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl NewReminder {
    /// Validates reminder input as typed by a user
    ///
    /// `when` may be an RFC 3339 timestamp, a `YYYY-MM-DDTHH:MM[:SS]` time
    /// taken as UTC, or a bare `YYYY-MM-DD` date meaning midnight UTC.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if the message is blank or the time
    /// cannot be parsed.
    ///
    /// # Example
    ///
    /// ```
    /// use tasktrack_shared::models::NewReminder;
    ///
    /// let reminder = NewReminder::parse(" Call the bank ", "2024-03-01T09:30").unwrap();
    /// assert_eq!(reminder.message, "Call the bank");
    /// assert_eq!(reminder.timestamp.to_rfc3339(), "2024-03-01T09:30:00+00:00");
    /// ```
    pub fn parse(message: &str, when: &str) -> StoreResult<Self> {
        let message = message.trim();
        if message.is_empty() {
            return Err(StoreError::Invalid("message: must not be blank".to_string()));
        }
        let timestamp = parse_when(when).ok_or_else(|| {
            StoreError::Invalid(format!("timestamp: '{}' is not a date or time", when.trim()))
        })?;
        Ok(NewReminder {
            message: message.to_string(),
            timestamp,
        })
    }
}

/// Parses the accepted reminder time renderings
pub fn parse_when(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(at.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

fn deserialize_when<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_when(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

/// Error taxonomy for remote store operations
///
/// Every operation against the task API resolves to either a payload or one
/// of five error kinds. Transport and status-code details never leave the
/// client boundary; callers only ever see a [`StoreError`].
///
/// # Mapping
///
/// | Source | Kind |
/// |---|---|
/// | missing credential, 401, 403 | `Unauthorized` |
/// | 404 | `NotFound` |
/// | local validation, 400, 409, 422 | `Invalid` |
/// | 5xx, unexpected status, malformed body | `ServerError` |
/// | no response, timeout | `NetworkUnavailable` |
///
/// # Example
///
/// ```
/// use tasktrack_shared::error::{ErrorKind, StoreError};
///
/// let err = StoreError::from_status(404, Some("Task not found".to_string()));
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert_eq!(err.to_string(), "Not found: Task not found");
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidationErrors;

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the remote task store and the synchronizer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Missing or rejected credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input, rejected locally or by the server
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Server failed to handle the request
    #[error("Server error: {0}")]
    ServerError(String),

    /// No response from the server
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),
}

/// Payload-free discriminant of [`StoreError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    Invalid,
    ServerError,
    NetworkUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Invalid => "invalid",
            ErrorKind::ServerError => "server_error",
            ErrorKind::NetworkUnavailable => "network_unavailable",
        };
        f.write_str(s)
    }
}

impl StoreError {
    /// Returns the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unauthorized(_) => ErrorKind::Unauthorized,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Invalid(_) => ErrorKind::Invalid,
            StoreError::ServerError(_) => ErrorKind::ServerError,
            StoreError::NetworkUnavailable(_) => ErrorKind::NetworkUnavailable,
        }
    }

    /// Returns the message carried by this error
    pub fn message(&self) -> &str {
        match self {
            StoreError::Unauthorized(msg)
            | StoreError::NotFound(msg)
            | StoreError::Invalid(msg)
            | StoreError::ServerError(msg)
            | StoreError::NetworkUnavailable(msg) => msg,
        }
    }

    /// True when the server could not be reached at all
    pub fn is_network(&self) -> bool {
        matches!(self, StoreError::NetworkUnavailable(_))
    }

    /// Translates a non-success HTTP status into the taxonomy
    ///
    /// `message` is the server-provided explanation, if the body carried one.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let msg = message.unwrap_or_else(|| format!("HTTP {}", status));
        match status {
            401 | 403 => StoreError::Unauthorized(msg),
            404 => StoreError::NotFound(msg),
            400 | 409 | 422 => StoreError::Invalid(msg),
            _ => StoreError::ServerError(msg),
        }
    }

    /// Credential missing from the session
    pub fn missing_credential() -> Self {
        StoreError::Unauthorized("Not logged in".to_string())
    }
}

impl From<ValidationErrors> for StoreError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        messages.sort();
        StoreError::Invalid(messages.join("; "))
    }
}

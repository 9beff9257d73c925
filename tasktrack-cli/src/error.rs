/// Error handling for the command-line client
///
/// Every command returns `CliResult<T>`. Each error maps to a process exit
/// code so scripts can tell a rejected login from an unreachable server.
///
/// | Error | Exit code |
/// |---|---|
/// | Invalid input, bad configuration | 2 |
/// | Not logged in, rejected credential | 3 |
/// | Unknown task or category | 4 |
/// | Server unreachable or timed out | 5 |
/// | Server-side failure | 6 |
/// | Anything else | 1 |

use tasktrack_shared::error::{ErrorKind, StoreError};

/// CLI result type alias
pub type CliResult<T> = Result<T, CliError>;

/// Unified CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// No session is established
    #[error("Not logged in; run `tasktrack login` first")]
    NotLoggedIn,

    /// Invalid configuration or arguments
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote store or validation failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Writing output failed
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::NotLoggedIn => 3,
            CliError::Config(_) => 2,
            CliError::Store(e) => match e.kind() {
                ErrorKind::Invalid => 2,
                ErrorKind::Unauthorized => 3,
                ErrorKind::NotFound => 4,
                ErrorKind::NetworkUnavailable => 5,
                ErrorKind::ServerError => 6,
            },
            CliError::Io(_) => 1,
        }
    }
}

/// Exit code for any error reaching `main`
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CliError>()
        .map(CliError::exit_code)
        .unwrap_or(1)
}

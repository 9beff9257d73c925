/// Request deadlines
///
/// Every call to the remote store is bounded. A call that does not resolve
/// within its deadline fails with [`StoreError::NetworkUnavailable`]; there is
/// no automatic retry and the caller decides whether to re-issue the intent.
///
/// # Defaults
///
/// - No timeout configured: 10 seconds
/// - Minimum timeout: 1 second
/// - Maximum timeout: 120 seconds
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tasktrack_sync::timeout::{RequestTimeout, DEFAULT_TIMEOUT};
///
/// assert_eq!(RequestTimeout::from_secs(None).duration(), DEFAULT_TIMEOUT);
/// assert_eq!(RequestTimeout::from_secs(Some(0)).duration(), Duration::from_secs(1));
/// ```

use std::future::Future;
use std::time::Duration;
use tasktrack_shared::error::{StoreError, StoreResult};

/// Default request timeout (10 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum allowed timeout (1 second)
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Maximum allowed timeout (2 minutes)
pub const MAX_TIMEOUT: Duration = Duration::from_secs(120);

/// A clamped request deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeout(Duration);

impl RequestTimeout {
    /// Uses `duration` as given, without clamping
    ///
    /// Intended for tests that need sub-second deadlines.
    pub fn exact(duration: Duration) -> Self {
        RequestTimeout(duration)
    }

    /// Creates a timeout from configured seconds (None = default)
    pub fn from_secs(secs: Option<u64>) -> Self {
        let timeout = match secs {
            Some(secs) => Duration::from_secs(secs).clamp(MIN_TIMEOUT, MAX_TIMEOUT),
            None => DEFAULT_TIMEOUT,
        };
        RequestTimeout(timeout)
    }

    /// Gets the timeout duration
    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Runs `call`, failing with `NetworkUnavailable` if it overruns
    pub async fn run<T, F>(&self, operation: &'static str, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.0, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.0.as_millis() as u64,
                    "Request deadline exceeded"
                );
                Err(StoreError::NetworkUnavailable(format!(
                    "{} timed out after {:?}",
                    operation, self.0
                )))
            }
        }
    }
}

impl Default for RequestTimeout {
    fn default() -> Self {
        RequestTimeout(DEFAULT_TIMEOUT)
    }
}

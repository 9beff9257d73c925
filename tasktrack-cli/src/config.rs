/// Configuration management for the command-line client
///
/// This module loads configuration from environment variables (and a `.env`
/// file, if present) and lets command-line flags override it.
///
/// # Environment Variables
///
/// - `TASKTRACK_API_URL`: Base URL of the task API (default: http://127.0.0.1:8000)
/// - `TASKTRACK_TIMEOUT_SECS`: Per-request timeout, clamped to 1..=120 (default: 10)
/// - `TASKTRACK_DATA_DIR`: Where the session and history cache live
///   (default: `<platform data dir>/tasktrack`)
/// - `TASKTRACK_REFRESH_SECS`: Interval of `watch` refreshes, 0 disables (default: 30)
/// - `RUST_LOG`: Log filter (default: warn)
///
/// # Example
///
/// ```no_run
/// use tasktrack_cli::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Talking to {}", config.api_url);
/// # Ok(())
/// # }
/// ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tasktrack_sync::remote::http::DEFAULT_BASE_URL;
use tasktrack_sync::timeout::RequestTimeout;

/// Default interval between `watch` refreshes
pub const DEFAULT_REFRESH_SECS: u64 = 30;

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the task API
    pub api_url: String,

    /// Deadline for each remote call
    pub timeout: RequestTimeout,

    /// Directory of the local cache
    pub data_dir: PathBuf,

    /// Interval of periodic refreshes; zero disables them
    pub refresh_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse, or if no data
    /// directory is configured and the platform has none.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("TASKTRACK_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = parse_secs(&lookup, "TASKTRACK_TIMEOUT_SECS")?;
        let refresh_secs = parse_secs(&lookup, "TASKTRACK_REFRESH_SECS")?;

        let data_dir = match lookup("TASKTRACK_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        Ok(Self {
            api_url,
            timeout: RequestTimeout::from_secs(timeout_secs),
            data_dir,
            refresh_interval: Duration::from_secs(refresh_secs.unwrap_or(DEFAULT_REFRESH_SECS)),
        })
    }

    /// Applies command-line overrides
    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        data_dir: Option<PathBuf>,
        timeout_secs: Option<u64>,
    ) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if timeout_secs.is_some() {
            self.timeout = RequestTimeout::from_secs(timeout_secs);
        }
        self
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> anyhow::Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds, got '{}'", key, raw)),
        _ => Ok(None),
    }
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("tasktrack"))
        .ok_or_else(|| anyhow::anyhow!("No data directory found; set TASKTRACK_DATA_DIR"))
}

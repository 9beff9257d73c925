/// Application wiring
///
/// Builds the session context, the cache, the HTTP store and the
/// synchronizer from configuration. Everything downstream receives these
/// explicitly; nothing reads global state.

use crate::config::Config;
use crate::error::{CliError, CliResult};
use std::sync::Arc;
use tasktrack_shared::auth::SessionContext;
use tasktrack_sync::cache::{FileStore, LocalCache};
use tasktrack_sync::remote::{HttpConfig, HttpTaskStore};
use tasktrack_sync::synchronizer::{SyncConfig, Synchronizer};

/// Shared application state
pub struct App {
    pub config: Config,
    session: SessionContext,
    cache: LocalCache,
    http: HttpTaskStore,
    sync: Synchronizer,
}

impl App {
    /// Opens the local cache, restores any saved session and hydrates the
    /// history
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is unusable.
    pub fn open(config: Config) -> CliResult<Self> {
        let cache = LocalCache::new(Arc::new(FileStore::new(&config.data_dir)));
        let session = SessionContext::restored(cache.load_cached_session());

        let http = HttpTaskStore::new(
            HttpConfig {
                base_url: config.api_url.clone(),
                timeout: config.timeout,
            },
            session.handle(),
        )
        .map_err(|e| CliError::Config(e.message().to_string()))?;

        let sync = Synchronizer::new(
            Arc::new(http.clone()),
            cache.clone(),
            SyncConfig {
                request_timeout: config.timeout,
                ..SyncConfig::default()
            },
        );
        let restored = sync.hydrate();

        tracing::debug!(
            api_url = %http.base_url(),
            data_dir = %config.data_dir.display(),
            logged_in = session.current().is_some(),
            history = restored,
            "Application opened"
        );

        Ok(App {
            config,
            session,
            cache,
            http,
            sync,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn http(&self) -> &HttpTaskStore {
        &self.http
    }

    pub fn sync(&self) -> &Synchronizer {
        &self.sync
    }

    /// Fails unless a session is established
    pub fn require_login(&self) -> CliResult<()> {
        if self.session.current().is_some() {
            Ok(())
        } else {
            Err(CliError::NotLoggedIn)
        }
    }
}

/// Session context with an explicit lifecycle
///
/// ```text
/// (none) ──establish──> Active(credential) ──clear──> (none)
///            ^                                  │
///            └───────────── establish ──────────┘
/// ```
///
/// The context is created empty, populated on login success (or when a
/// cached session is restored at startup) and cleared on logout. Readers hold
/// a [`SessionHandle`] and always see the current credential.
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::SessionContext;
/// use tasktrack_shared::models::{EntityId, SessionCredential, UserProfile};
///
/// let context = SessionContext::new();
/// let handle = context.handle();
/// assert!(handle.current().is_none());
///
/// context.establish(SessionCredential {
///     token: "t0k3n".to_string(),
///     user: UserProfile {
///         id: EntityId::from(1),
///         name: "Ada".to_string(),
///         email: "ada@example.com".to_string(),
///     },
/// });
/// assert_eq!(handle.current().map(|c| c.token).as_deref(), Some("t0k3n"));
///
/// context.clear();
/// assert!(handle.current().is_none());
/// ```

use crate::models::session::SessionCredential;
use tokio::sync::watch;

/// Writable side of the session, owned by the authentication boundary
#[derive(Debug)]
pub struct SessionContext {
    tx: watch::Sender<Option<SessionCredential>>,
}

impl SessionContext {
    /// Creates an empty session context
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        SessionContext { tx }
    }

    /// Creates a context that starts with a restored credential
    pub fn restored(credential: Option<SessionCredential>) -> Self {
        let (tx, _rx) = watch::channel(credential);
        SessionContext { tx }
    }

    /// Starts a session after a successful login
    pub fn establish(&self, credential: SessionCredential) {
        tracing::info!(user_id = %credential.user.id, "Session established");
        self.tx.send_replace(Some(credential));
    }

    /// Ends the session
    pub fn clear(&self) {
        if self.tx.send_replace(None).is_some() {
            tracing::info!("Session cleared");
        }
    }

    /// Hands out a read-only view of this session
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Current credential, if any
    pub fn current(&self) -> Option<SessionCredential> {
        self.tx.borrow().clone()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    rx: watch::Receiver<Option<SessionCredential>>,
}

impl SessionHandle {
    /// A handle that is never authenticated
    pub fn anonymous() -> Self {
        let (_tx, rx) = watch::channel(None);
        SessionHandle { rx }
    }

    /// Current credential, if any
    pub fn current(&self) -> Option<SessionCredential> {
        self.rx.borrow().clone()
    }

}

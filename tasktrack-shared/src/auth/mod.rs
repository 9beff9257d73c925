/// Authentication state
///
/// # Modules
///
/// - [`session`]: The session context and its read-only handle
///
/// The authentication boundary owns a [`SessionContext`] and is the only
/// component allowed to establish or clear a session. Everything else
/// receives a [`SessionHandle`].

pub mod session;

pub use session::{SessionContext, SessionHandle};

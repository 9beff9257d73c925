/// Local cache layer
///
/// A durability shim for the data the server does not reliably return:
/// tracking history and the session credential. Everything here is
/// best-effort. Reads of absent or corrupt data come back empty, and write
/// failures are logged and reported as `false`, never as errors.
///
/// # Modules
///
/// - [`kv`]: The key-value substrate and its file and memory backends
/// - [`local`]: [`LocalCache`], the typed operations on top of it

pub mod kv;
pub mod local;

pub use kv::{CacheError, FileStore, KeyValueStore, MemoryStore};
pub use local::{LocalCache, HISTORY_KEY, TOKEN_KEY, USER_KEY};

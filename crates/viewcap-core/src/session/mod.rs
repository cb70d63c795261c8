//! Session-scoped "already viewed" markers.
//!
//! The recorder only needs `get`/`put` on a per-visitor key-value store. The
//! store decides how long markers live: [`MemorySession`] and
//! [`SessionRegistry`] apply an [`ExpiryPolicy`] (the dedup window) whenever
//! a session is handed out or pruned.
//!
//! Markers live under `viewed_posts.<content id>` and hold the Unix second
//! at which the view was recorded.

mod key;
mod memory;
mod persist;
mod registry;

pub use key::{content_id_from_key, viewed_key, VIEWED_NAMESPACE};
pub use memory::{ExpiryPolicy, MemorySession};
pub use persist::{PersistedSessions, SessionFileLock};
pub use registry::SessionRegistry;

/// Mutable key-value state scoped to one visitor session.
///
/// Implementations own expiry. A marker returned by `get` is treated as fresh.
pub trait SessionState {
    fn get(&self, key: &str) -> Option<i64>;

    fn put(&mut self, key: String, value: i64);
}

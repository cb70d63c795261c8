//! Sessions keyed by session id, sharing one expiry policy.

use std::collections::HashMap;

use super::memory::{ExpiryPolicy, MemorySession};

/// Process-local set of visitor sessions.
///
/// The registry is the session store as far as the recorder is concerned: it
/// owns the expiry policy and applies it before handing a session out.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    pub(super) sessions: HashMap<String, MemorySession>,
    pub(super) policy: ExpiryPolicy,
}

impl SessionRegistry {
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self {
            sessions: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    pub fn get(&self, session_id: &str) -> Option<&MemorySession> {
        self.sessions.get(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Session for `session_id`, created empty if unknown, with stale markers pruned at `now`.
    pub fn session_mut(&mut self, session_id: &str, now: i64) -> &mut MemorySession {
        let policy = self.policy;
        let session = self.sessions.entry(session_id.to_string()).or_default();
        let pruned = session.prune(&policy, now);
        if pruned > 0 {
            tracing::debug!(session_id, pruned, "expired view markers dropped");
        }
        session
    }

    /// Settles a session after the recorder is done with it: re-applies the
    /// policy so a fresh marker cannot push it past `max_markers`, and forgets
    /// the session if it holds nothing. Returns markers removed.
    pub fn release(&mut self, session_id: &str, now: i64) -> usize {
        let policy = self.policy;
        let Some(session) = self.sessions.get_mut(session_id) else {
            return 0;
        };
        let removed = session.prune(&policy, now);
        if session.is_empty() {
            self.sessions.remove(session_id);
        }
        removed
    }

    /// Prunes every session and drops the ones left empty. Returns markers removed.
    pub fn prune_all(&mut self, now: i64) -> usize {
        let policy = self.policy;
        let removed: usize = self
            .sessions
            .values_mut()
            .map(|s| s.prune(&policy, now))
            .sum();
        self.sessions.retain(|_, s| !s.is_empty());
        removed
    }
}

//! In-memory session state and the expiry policy applied to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ViewcapConfig;
use crate::recorder::ContentId;

use super::key::{content_id_from_key, VIEWED_NAMESPACE};
use super::SessionState;

/// How long dedup markers live and how many a session may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpiryPolicy {
    /// Markers at least this old are dropped. `None` keeps them until the session ends.
    pub window_secs: Option<u64>,
    /// Keep at most this many markers, dropping the oldest first.
    pub max_markers: Option<usize>,
}

impl ExpiryPolicy {
    pub fn from_config(cfg: &ViewcapConfig) -> Self {
        Self {
            window_secs: Some(cfg.dedup_window_secs),
            max_markers: cfg.max_markers_per_session,
        }
    }

    /// Whether a marker written at `viewed_at` is still fresh at `now`.
    pub fn is_fresh(&self, viewed_at: i64, now: i64) -> bool {
        match self.window_secs {
            // Windows beyond i64::MAX seconds never expire.
            Some(window) => {
                i64::try_from(window).map_or(true, |w| now.saturating_sub(viewed_at) < w)
            }
            None => true,
        }
    }
}

/// Key-value session state held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemorySession {
    values: BTreeMap<String, i64>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dedup markers currently held, as `(content id, viewed at)`.
    pub fn markers(&self) -> impl Iterator<Item = (ContentId, i64)> + '_ {
        self.values
            .iter()
            .filter_map(|(k, v)| content_id_from_key(k).map(|id| (id, *v)))
    }

    /// Drops stale markers under `policy`, then trims to `max_markers`.
    /// Keys outside the `viewed_posts` namespace are left alone.
    /// Returns the number of markers removed.
    pub fn prune(&mut self, policy: &ExpiryPolicy, now: i64) -> usize {
        let before = self.values.len();

        self.values
            .retain(|k, viewed_at| !is_marker_key(k) || policy.is_fresh(*viewed_at, now));

        if let Some(max) = policy.max_markers {
            let mut markers: Vec<(i64, String)> = self
                .values
                .iter()
                .filter(|(k, _)| is_marker_key(k))
                .map(|(k, v)| (*v, k.clone()))
                .collect();
            if markers.len() > max {
                markers.sort();
                let excess = markers.len() - max;
                for (_, key) in markers.into_iter().take(excess) {
                    self.values.remove(&key);
                }
            }
        }

        before - self.values.len()
    }
}

/// Any key under `viewed_posts.`, including the one for an empty content id.
fn is_marker_key(key: &str) -> bool {
    key.strip_prefix(VIEWED_NAMESPACE)
        .is_some_and(|rest| rest.starts_with('.'))
}

impl SessionState for MemorySession {
    fn get(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn put(&mut self, key: String, value: i64) {
        self.values.insert(key, value);
    }
}

//! Persist sessions to disk (JSON under XDG state dir) so markers survive across CLI runs.
//!
//! Saves go through a temp file and a rename; cross-process writers serialise
//! on a `fs2` lock next to the file.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use super::memory::{ExpiryPolicy, MemorySession};
use super::registry::SessionRegistry;

/// Snapshot of a [`SessionRegistry`] for JSON serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSessions {
    #[serde(default = "default_version")]
    pub version: u8,
    pub sessions: BTreeMap<String, MemorySession>,
}

fn default_version() -> u8 {
    1
}

/// Temp file used while saving: `sessions.json` → `sessions.json.part`.
fn temp_path(path: &Path) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(".part");
    PathBuf::from(o)
}

/// Lock file guarding a session file: `sessions.json` → `sessions.json.lock`.
fn lock_path(path: &Path) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(".lock");
    PathBuf::from(o)
}

/// Exclusive advisory lock on a session file, released on drop.
///
/// Hold it from `load_from_path` until `save_to_path` returns so that
/// processes sharing one file see each other's markers. The lock file is
/// left in place; unlinking it would let a waiter lock a stale inode.
#[derive(Debug)]
pub struct SessionFileLock {
    file: File,
}

impl SessionFileLock {
    /// Blocks until the lock on `path` is acquired. Creates parent dirs if needed.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_path = lock_path(path);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("open session lock: {}", lock_path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("lock sessions: {}", lock_path.display()))?;
        Ok(Self { file })
    }

    /// Same as [`acquire`](Self::acquire), waiting on the blocking pool so the
    /// async runtime keeps driving other tasks.
    pub async fn acquire_async(path: &Path) -> Result<Self> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::acquire(&path))
            .await
            .context("session lock task panicked")?
    }
}

impl Drop for SessionFileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl SessionRegistry {
    /// Default path for the session file: `~/.local/state/viewcap/sessions.json`.
    pub fn default_path() -> Result<PathBuf> {
        Ok(crate::config::state_dir()?.join("sessions.json"))
    }

    pub fn to_snapshot(&self) -> PersistedSessions {
        PersistedSessions {
            version: 1,
            sessions: self
                .sessions
                .iter()
                .map(|(id, s)| (id.clone(), s.clone()))
                .collect(),
        }
    }

    /// Rebuild from a snapshot. The policy comes from the caller so config always wins.
    pub fn from_snapshot(snapshot: PersistedSessions, policy: ExpiryPolicy) -> Self {
        Self {
            sessions: snapshot.sessions.into_iter().collect(),
            policy,
        }
    }

    /// Save all sessions to the given path (creates parent dir if needed).
    ///
    /// Concurrent writers must hold a [`SessionFileLock`] across load and save,
    /// otherwise the last writer drops the other's markers.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json =
            serde_json::to_string_pretty(&self.to_snapshot()).context("serialize sessions")?;

        // Readers never see a half-written file: write beside it, then rename over.
        let tmp = temp_path(path);
        std::fs::write(&tmp, json).with_context(|| format!("write sessions: {}", tmp.display()))?;
        std::fs::rename(&tmp, path).with_context(|| {
            format!("failed to rename {} to {}", tmp.display(), path.display())
        })?;
        Ok(())
    }

    /// Load sessions from the given path. A missing file yields `None` so the
    /// caller can start from `SessionRegistry::new`.
    pub fn load_from_path(path: &Path, policy: ExpiryPolicy) -> Result<Option<Self>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read sessions: {}", path.display()))
            }
        };
        let snapshot: PersistedSessions = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse sessions: {}", path.display()))?;
        Ok(Some(Self::from_snapshot(snapshot, policy)))
    }
}

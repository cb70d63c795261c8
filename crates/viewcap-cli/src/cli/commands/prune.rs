//! `viewcap prune` – drop expired markers from the session file.

use anyhow::Result;
use viewcap_core::config::ViewcapConfig;
use viewcap_core::recorder::{Clock, SystemClock};
use viewcap_core::session::{ExpiryPolicy, SessionFileLock, SessionRegistry};

pub fn run_prune(cfg: &ViewcapConfig) -> Result<()> {
    match prune_once(cfg, SystemClock.now_epoch_secs())? {
        None => println!("No sessions stored."),
        Some((removed, remaining)) => {
            println!("Removed {removed} expired markers; {remaining} sessions remain.")
        }
    }
    Ok(())
}

/// Prunes the session file under its lock. `None` when there is no file yet;
/// otherwise (markers removed, sessions remaining).
fn prune_once(cfg: &ViewcapConfig, now: i64) -> Result<Option<(usize, usize)>> {
    let path = cfg.resolved_sessions_path()?;
    let _lock = SessionFileLock::acquire(&path)?;

    let policy = ExpiryPolicy::from_config(cfg);
    let Some(mut registry) = SessionRegistry::load_from_path(&path, policy)? else {
        return Ok(None);
    };

    let removed = registry.prune_all(now);
    registry.save_to_path(&path)?;
    tracing::info!(removed, sessions = registry.len(), "pruned session file");
    Ok(Some((removed, registry.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewcap_core::recorder::ContentId;
    use viewcap_core::session::{viewed_key, SessionState};

    const NOW: i64 = 1_700_000_000;

    fn cfg_in(dir: &std::path::Path) -> ViewcapConfig {
        ViewcapConfig {
            sessions_path: Some(dir.join("sessions.json")),
            ..Default::default()
        }
    }

    #[test]
    fn prune_without_session_file_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cfg_in(dir.path());

        assert_eq!(prune_once(&cfg, NOW).unwrap(), None);
        assert!(!dir.path().join("sessions.json").exists());
    }

    #[test]
    fn prune_saves_the_file_without_expired_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cfg_in(dir.path());
        let path = dir.path().join("sessions.json");

        // Saved with no window so both markers survive until the prune run.
        let mut registry = SessionRegistry::new(ExpiryPolicy::default());
        registry
            .session_mut("stale", 0)
            .put(viewed_key(&ContentId::from(1u64)), 0);
        registry
            .session_mut("fresh", NOW)
            .put(viewed_key(&ContentId::from(1u64)), NOW - 10);
        registry.save_to_path(&path).unwrap();

        assert_eq!(prune_once(&cfg, NOW).unwrap(), Some((1, 1)));

        let reloaded = SessionRegistry::load_from_path(&path, ExpiryPolicy::default())
            .unwrap()
            .expect("file kept");
        assert!(reloaded.get("stale").is_none());
        assert_eq!(
            reloaded
                .get("fresh")
                .and_then(|s| s.get(&viewed_key(&ContentId::from(1u64)))),
            Some(NOW - 10)
        );
    }
}

//! `viewcap record <content-id> --session <id>` – record a view once per session.

use anyhow::{Context, Result};
use viewcap_core::config::ViewcapConfig;
use viewcap_core::recorder::{Clock, ContentId, RequestMeta, ViewOutcome, ViewRecorder};
use viewcap_core::session::{ExpiryPolicy, SessionFileLock, SessionRegistry};
use viewcap_core::view_db::ViewDb;

/// Arguments of the `record` subcommand.
#[derive(Debug, Clone)]
pub struct RecordArgs {
    pub content_id: String,
    pub session: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl RecordArgs {
    fn request_meta(&self) -> RequestMeta {
        RequestMeta {
            client_ip: self.ip.clone(),
            user_agent: self.user_agent.clone(),
            referer: self.referer.clone(),
        }
    }
}

pub async fn run_record(cfg: &ViewcapConfig, args: RecordArgs) -> Result<()> {
    let outcome = record_once(cfg, &args).await?;
    println!("{}", outcome.as_str());
    Ok(())
}

/// Loads sessions and the view DB from the configured paths, records, and saves sessions.
///
/// The session file lock is held from load to save so concurrent runs for
/// other sessions cannot overwrite this run's marker.
async fn record_once(cfg: &ViewcapConfig, args: &RecordArgs) -> Result<ViewOutcome> {
    let sessions_path = cfg.resolved_sessions_path()?;
    let _lock = SessionFileLock::acquire_async(&sessions_path).await?;

    let db = ViewDb::open_at(cfg.resolved_db_path()?)
        .await
        .context("open view database")?
        .with_max_user_agent_len(cfg.max_user_agent_len);

    let policy = ExpiryPolicy::from_config(cfg);
    let mut registry = SessionRegistry::load_from_path(&sessions_path, policy)?
        .unwrap_or_else(|| SessionRegistry::new(policy));

    let recorder = ViewRecorder::new(db);
    let now = recorder.clock().now_epoch_secs();
    let content_id = ContentId::from(args.content_id.as_str());

    let outcome = recorder
        .record_view(
            &content_id,
            registry.session_mut(&args.session, now),
            &args.request_meta(),
        )
        .await
        .with_context(|| format!("record view of {content_id}"))?;

    registry.release(&args.session, now);
    registry.save_to_path(&sessions_path)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg_in(dir: &std::path::Path) -> ViewcapConfig {
        ViewcapConfig {
            db_path: Some(dir.join("views.db")),
            sessions_path: Some(dir.join("sessions.json")),
            ..Default::default()
        }
    }

    fn args(content_id: &str, session: &str) -> RecordArgs {
        RecordArgs {
            content_id: content_id.to_string(),
            session: session.to_string(),
            ip: Some("127.0.0.1".to_string()),
            user_agent: None,
            referer: Some("https://example.com/a?b=c".to_string()),
        }
    }

    #[tokio::test]
    async fn record_twice_is_duplicate_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cfg_in(dir.path());

        assert_eq!(
            record_once(&cfg, &args("42", "s1")).await.unwrap(),
            ViewOutcome::Recorded
        );
        assert_eq!(
            record_once(&cfg, &args("42", "s1")).await.unwrap(),
            ViewOutcome::Duplicate
        );
        assert_eq!(
            record_once(&cfg, &args("42", "s2")).await.unwrap(),
            ViewOutcome::Recorded
        );

        let db = ViewDb::open_at(dir.path().join("views.db")).await.unwrap();
        assert_eq!(db.count_for(&ContentId::from(42u64)).await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_records_for_different_sessions_keep_both_markers() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cfg_in(dir.path());

        let (alice, bob) = (args("42", "alice"), args("42", "bob"));
        let (a, b) = tokio::join!(record_once(&cfg, &alice), record_once(&cfg, &bob));
        assert_eq!(a.unwrap(), ViewOutcome::Recorded);
        assert_eq!(b.unwrap(), ViewOutcome::Recorded);

        let (alice, bob) = (args("42", "alice"), args("42", "bob"));
        let (a, b) = tokio::join!(record_once(&cfg, &alice), record_once(&cfg, &bob));
        assert_eq!(a.unwrap(), ViewOutcome::Duplicate);
        assert_eq!(b.unwrap(), ViewOutcome::Duplicate);

        let db = ViewDb::open_at(dir.path().join("views.db")).await.unwrap();
        assert_eq!(db.count_for(&ContentId::from(42u64)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn marker_cap_holds_after_recording() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ViewcapConfig {
            max_markers_per_session: Some(1),
            ..cfg_in(dir.path())
        };

        record_once(&cfg, &args("1", "s1")).await.unwrap();
        record_once(&cfg, &args("2", "s1")).await.unwrap();

        let path = dir.path().join("sessions.json");
        let registry = SessionRegistry::load_from_path(&path, ExpiryPolicy::default())
            .unwrap()
            .expect("sessions saved");
        assert_eq!(registry.get("s1").map(|s| s.markers().count()), Some(1));
    }

    #[tokio::test]
    async fn rejected_view_does_not_touch_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cfg_in(dir.path());

        assert!(record_once(&cfg, &args("", "s1")).await.is_err());
        assert!(!dir.path().join("sessions.json").exists());
    }
}

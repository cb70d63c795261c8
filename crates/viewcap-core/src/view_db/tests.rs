//! Tests for view_db (use in-memory DB helper from db).

use crate::recorder::{ContentId, FixedClock, RequestMeta, ViewOutcome, ViewRecord, ViewRecorder};
use crate::session::{viewed_key, MemorySession, SessionState};
use crate::view_db::db::open_memory;
use crate::view_db::ViewStoreError;

#[tokio::test]
async fn insert_and_get_view_roundtrip() {
    let db = open_memory().await.unwrap();
    let record = ViewRecord {
        content_id: ContentId::from(42u64),
        client_ip: "203.0.113.1".to_string(),
        user_agent: "Mozilla/5.0".to_string(),
        referer_origin: Some("https://example.com".to_string()),
    };

    let id = db.insert_view(&record).await.unwrap();
    let stored = db.get_view(id).await.unwrap().expect("row exists");
    assert_eq!(stored.content_id, record.content_id);
    assert_eq!(stored.ip, "203.0.113.1");
    assert_eq!(stored.agent, "Mozilla/5.0");
    assert_eq!(stored.referer.as_deref(), Some("https://example.com"));
    assert!(stored.created_at > 0);
}

#[tokio::test]
async fn absent_referer_is_stored_as_null() {
    let db = open_memory().await.unwrap();
    let record = ViewRecord::from_request(
        &ContentId::from(7u64),
        &RequestMeta::new().referer("/relative/path"),
    );
    let id = db.insert_view(&record).await.unwrap();
    let stored = db.get_view(id).await.unwrap().unwrap();
    assert_eq!(stored.referer, None);
    assert_eq!(stored.ip, "");
}

#[tokio::test]
async fn empty_content_id_is_rejected() {
    let db = open_memory().await.unwrap();
    let record = ViewRecord::from_request(&ContentId::from(""), &RequestMeta::default());
    let err = db.insert_view(&record).await.unwrap_err();
    assert!(matches!(err, ViewStoreError::Rejected { .. }));
}

#[tokio::test]
async fn long_user_agent_is_truncated() {
    let db = open_memory().await.unwrap().with_max_user_agent_len(8);
    let record = ViewRecord::from_request(
        &ContentId::from(1u64),
        &RequestMeta::new().user_agent("Mozilla/5.0 (X11; Linux x86_64)"),
    );
    let id = db.insert_view(&record).await.unwrap();
    assert_eq!(db.get_view(id).await.unwrap().unwrap().agent, "Mozilla/");
}

#[tokio::test]
async fn missing_view_is_none() {
    let db = open_memory().await.unwrap();
    assert!(db.get_view(999).await.unwrap().is_none());
    assert_eq!(db.count_for(&ContentId::from(1u64)).await.unwrap(), 0);
}

#[tokio::test]
async fn recorder_writes_one_row_per_session() {
    let db = open_memory().await.unwrap();
    let recorder = ViewRecorder::with_clock(db.clone(), FixedClock(1_700_000_000));
    let id = ContentId::from(42u64);
    let meta = RequestMeta::new().referer("https://example.com/articles/42?ref=tw");

    let mut session = MemorySession::new();
    assert_eq!(
        recorder.record_view(&id, &mut session, &meta).await.unwrap(),
        ViewOutcome::Recorded
    );
    assert_eq!(
        recorder.record_view(&id, &mut session, &meta).await.unwrap(),
        ViewOutcome::Duplicate
    );
    assert_eq!(db.count_for(&id).await.unwrap(), 1);

    let mut other = MemorySession::new();
    recorder.record_view(&id, &mut other, &meta).await.unwrap();
    assert_eq!(db.count_for(&id).await.unwrap(), 2);
}

#[tokio::test]
async fn rejected_record_leaves_session_unmarked() {
    let db = open_memory().await.unwrap();
    let recorder = ViewRecorder::new(db);
    let id = ContentId::from("");
    let mut session = MemorySession::new();

    let err = recorder
        .record_view(&id, &mut session, &RequestMeta::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ViewStoreError::Rejected { .. }));
    assert!(session.get(&viewed_key(&id)).is_none());
}

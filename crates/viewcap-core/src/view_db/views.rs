//! View row operations: insert (the sink hand-off) and lookups.

use sqlx::Row;

use crate::recorder::{Clock, ContentId, SystemClock, ViewRecord, ViewSink};

use super::db::ViewDb;
use super::error::ViewStoreError;

/// A view row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredView {
    pub id: i64,
    pub content_id: ContentId,
    pub ip: String,
    pub agent: String,
    pub referer: Option<String>,
    pub created_at: i64,
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut take = max;
    while take > 0 && !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}

impl ViewDb {
    /// Insert one view and return its row id.
    pub async fn insert_view(&self, record: &ViewRecord) -> Result<i64, ViewStoreError> {
        if record.content_id.as_str().is_empty() {
            return Err(ViewStoreError::Rejected {
                reason: "empty content id".to_string(),
            });
        }

        let agent = truncate_on_char_boundary(&record.user_agent, self.max_user_agent_len);
        let now = SystemClock.now_epoch_secs();

        let row_id = sqlx::query(
            r#"
            INSERT INTO views (content_id, ip, agent, referer, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(record.content_id.as_str())
        .bind(&record.client_ip)
        .bind(agent)
        .bind(record.referer_origin.as_deref())
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(row_id)
    }

    /// Number of stored views for a content item.
    pub async fn count_for(&self, content_id: &ContentId) -> Result<i64, ViewStoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM views WHERE content_id = ?1")
            .bind(content_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Fetch a single view by row id.
    pub async fn get_view(&self, id: i64) -> Result<Option<StoredView>, ViewStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, content_id, ip, agent, referer, created_at
            FROM views
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let content_id: String = row.get("content_id");
            StoredView {
                id: row.get("id"),
                content_id: ContentId::from(content_id),
                ip: row.get("ip"),
                agent: row.get("agent"),
                referer: row.get("referer"),
                created_at: row.get("created_at"),
            }
        }))
    }
}

impl ViewSink for ViewDb {
    type Error = ViewStoreError;

    async fn store(&self, record: ViewRecord) -> Result<(), ViewStoreError> {
        let id = self.insert_view(&record).await?;
        tracing::trace!(id, content_id = %record.content_id, "view row inserted");
        Ok(())
    }
}

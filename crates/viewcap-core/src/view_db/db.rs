//! SQLite-backed view database: connection and migrations. Row access lives in `views`.

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// Default cap on stored user-agent length, matching `ViewcapConfig::default()`.
const DEFAULT_MAX_USER_AGENT_LEN: usize = 512;

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Handle to the SQLite view database.
///
/// The default file lives under the XDG state directory:
/// `~/.local/state/viewcap/views.db` on Debian.
#[derive(Clone, Debug)]
pub struct ViewDb {
    pub(crate) pool: Pool<Sqlite>,
    pub(crate) max_user_agent_len: usize,
}

impl ViewDb {
    /// Open (or create) the default view database and run migrations.
    pub async fn open_default() -> Result<Self> {
        let state_dir = crate::config::state_dir()?;
        Self::open_at(state_dir.join("views.db")).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&uri)
            .await?;
        let db = ViewDb {
            pool,
            max_user_agent_len: DEFAULT_MAX_USER_AGENT_LEN,
        };
        db.migrate().await?;
        Ok(db)
    }

    /// Truncate stored user agents to `max` bytes (on a char boundary).
    pub fn with_max_user_agent_len(mut self, max: usize) -> Self {
        self.max_user_agent_len = max;
        self
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS views (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_id TEXT NOT NULL,
                ip TEXT NOT NULL DEFAULT '',
                agent TEXT NOT NULL DEFAULT '',
                referer TEXT,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS views_content_id ON views (content_id);")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
/// Open an in-memory database for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<ViewDb> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let db = ViewDb {
        pool,
        max_user_agent_len: DEFAULT_MAX_USER_AGENT_LEN,
    };
    db.migrate().await?;
    Ok(db)
}

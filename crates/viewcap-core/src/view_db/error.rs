//! Errors returned by the SQLite view store.

/// Failure to persist or read a view.
#[derive(Debug, thiserror::Error)]
pub enum ViewStoreError {
    /// SQLite rejected the statement or the connection failed.
    #[error("view database: {0}")]
    Database(#[from] sqlx::Error),
    /// The record failed validation before reaching the database.
    #[error("view rejected: {reason}")]
    Rejected { reason: String },
}

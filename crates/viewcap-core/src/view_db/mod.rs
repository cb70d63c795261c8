//! Persistent view store (SQLite via sqlx).
//!
//! One row per recorded view: content id, client address, user agent and
//! the sanitized referer origin (NULL when the referer was absent or invalid).

mod db;
mod error;
mod views;

pub use db::ViewDb;
pub use error::ViewStoreError;
pub use views::StoredView;

#[cfg(test)]
mod tests;

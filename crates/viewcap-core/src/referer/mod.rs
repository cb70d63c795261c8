//! Referer header validation and origin extraction.
//!
//! The referer header is untrusted input. It is either reduced to a
//! `scheme://host` origin or dropped entirely; a raw header value never
//! reaches the view store.

mod sanitize;
mod validate;

pub use sanitize::sanitize;
pub use validate::{validate, RefererUrl};

/// Reduces an optional referer header to its origin.
///
/// Returns `None` when the header is missing, empty, relative or malformed.
///
/// # Examples
///
/// - `referer_origin(Some("https://example.com/articles/42?ref=tw"))` → `Some("https://example.com")`
/// - `referer_origin(Some("/relative/path"))` → `None`
pub fn referer_origin(header: Option<&str>) -> Option<String> {
    header.and_then(RefererUrl::parse).map(|url| url.origin())
}

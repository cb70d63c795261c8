//! Origin extraction for validated referers.

use super::RefererUrl;

/// Reduces a referer to `scheme://host`.
///
/// # Panics
///
/// Panics if `raw` does not pass [`validate`](super::validate). Callers must
/// validate first; prefer [`RefererUrl::parse`] when the check and the
/// reduction happen in the same place.
pub fn sanitize(raw: &str) -> String {
    match RefererUrl::parse(raw) {
        Some(url) => url.origin(),
        None => panic!("referer must be validated before it is sanitized"),
    }
}

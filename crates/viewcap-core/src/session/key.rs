use crate::recorder::ContentId;

/// Namespace for dedup markers inside a session.
pub const VIEWED_NAMESPACE: &str = "viewed_posts";

/// Session key holding the marker for `content_id`: `viewed_posts.<id>`.
pub fn viewed_key(content_id: &ContentId) -> String {
    format!("{}.{}", VIEWED_NAMESPACE, content_id)
}

/// Inverse of [`viewed_key`]. `None` for keys outside the namespace.
pub fn content_id_from_key(key: &str) -> Option<ContentId> {
    let id = key.strip_prefix(VIEWED_NAMESPACE)?.strip_prefix('.')?;
    if id.is_empty() {
        return None;
    }
    Some(ContentId::from(id))
}

//! Value types passed into and out of the recorder.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::referer;

/// Opaque identifier of a content item (post, article, ...).
///
/// The recorder never checks that the item exists; resolving it is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ContentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for ContentId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

/// Request metadata for the current view. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl RequestMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = Some(ip.into());
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }
}

/// A single accepted view, handed to a [`ViewSink`](super::ViewSink).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub content_id: ContentId,
    /// Empty when the request carried no client address.
    pub client_ip: String,
    /// Empty when the request carried no user agent.
    pub user_agent: String,
    /// `scheme://host` of a valid referer, otherwise `None`.
    pub referer_origin: Option<String>,
}

impl ViewRecord {
    /// Builds a record from request metadata, reducing the referer to its origin.
    pub fn from_request(content_id: &ContentId, meta: &RequestMeta) -> Self {
        Self {
            content_id: content_id.clone(),
            client_ip: meta.client_ip.clone().unwrap_or_default(),
            user_agent: meta.user_agent.clone().unwrap_or_default(),
            referer_origin: referer::referer_origin(meta.referer.as_deref()),
        }
    }
}

/// Result of a single `record_view` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOutcome {
    /// A record was stored and the session marked.
    Recorded,
    /// The session already held a marker for this content; nothing was done.
    Duplicate,
}

impl ViewOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewOutcome::Recorded => "recorded",
            ViewOutcome::Duplicate => "duplicate",
        }
    }
}

//! View recording with per-session deduplication.
//!
//! A view is recorded the first time a session loads a content item. The
//! content id is then marked in the session and later loads are skipped
//! until the session store expires the marker.

mod clock;
mod sink;
mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use sink::{MemorySink, MemorySinkError, ViewSink};
pub use types::{ContentId, RequestMeta, ViewOutcome, ViewRecord};

use crate::session::{viewed_key, SessionState};

/// Records views into a sink, using session state to suppress repeats.
#[derive(Debug)]
pub struct ViewRecorder<S, C = SystemClock> {
    sink: S,
    clock: C,
}

impl<S: ViewSink> ViewRecorder<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            clock: SystemClock,
        }
    }
}

impl<S: ViewSink, C: Clock> ViewRecorder<S, C> {
    pub fn with_clock(sink: S, clock: C) -> Self {
        Self { sink, clock }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Records a view of `content_id` unless `session` already holds a marker for it.
    ///
    /// The check and the marker write are not atomic; two concurrent calls on
    /// the same session can both record. The session is only marked after the
    /// sink accepted the record, so a sink error leaves the session untouched
    /// and is returned as-is.
    pub async fn record_view<T>(
        &self,
        content_id: &ContentId,
        session: &mut T,
        meta: &RequestMeta,
    ) -> Result<ViewOutcome, S::Error>
    where
        T: SessionState + ?Sized,
    {
        let key = viewed_key(content_id);
        if session.get(&key).is_some() {
            tracing::debug!(%content_id, "view already counted in this session");
            return Ok(ViewOutcome::Duplicate);
        }

        let record = ViewRecord::from_request(content_id, meta);
        let has_referer = record.referer_origin.is_some();

        if let Err(e) = self.sink.store(record).await {
            tracing::warn!(%content_id, error = %e, "view sink rejected record");
            return Err(e);
        }

        session.put(key, self.clock.now_epoch_secs());
        tracing::debug!(%content_id, has_referer, "view recorded");
        Ok(ViewOutcome::Recorded)
    }
}

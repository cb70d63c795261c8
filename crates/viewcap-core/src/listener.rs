//! Channel-driven recording: consume "content viewed" events and record them.
//!
//! Use this when views arrive as messages rather than as direct calls from a
//! request handler. Each event names its session; the listener owns the
//! [`SessionRegistry`] so sessions are only touched from this task.

use tokio::sync::mpsc;

use crate::recorder::{Clock, ContentId, RequestMeta, ViewOutcome, ViewRecorder, ViewSink};
use crate::session::SessionRegistry;

/// A visitor loaded a content item.
#[derive(Debug, Clone)]
pub struct ContentViewed {
    pub content_id: ContentId,
    pub session_id: String,
    pub meta: RequestMeta,
}

/// Events between full sweeps of the registry in [`run_view_listener`].
pub const DEFAULT_PRUNE_EVERY: u64 = 1024;

/// Counters reported when the listener stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub recorded: u64,
    pub duplicates: u64,
    pub failed: u64,
    /// Markers dropped by expiry or the per-session cap.
    pub pruned: u64,
}

/// Records every event from `rx` until the channel closes, sweeping the
/// registry every [`DEFAULT_PRUNE_EVERY`] events.
pub async fn run_view_listener<S, C>(
    rx: mpsc::Receiver<ContentViewed>,
    recorder: ViewRecorder<S, C>,
    registry: SessionRegistry,
) -> (SessionRegistry, ListenerStats)
where
    S: ViewSink,
    C: Clock,
{
    run_view_listener_with(rx, recorder, registry, DEFAULT_PRUNE_EVERY).await
}

/// Like [`run_view_listener`], sweeping every `prune_every` events (0 is treated as 1).
///
/// A sink failure is logged and counted; the event's session stays unmarked
/// and the loop moves on. Each session is settled right after use, and the
/// periodic sweep drops sessions whose visitors never came back. Returns the
/// registry (for persistence) and stats.
pub async fn run_view_listener_with<S, C>(
    mut rx: mpsc::Receiver<ContentViewed>,
    recorder: ViewRecorder<S, C>,
    mut registry: SessionRegistry,
    prune_every: u64,
) -> (SessionRegistry, ListenerStats)
where
    S: ViewSink,
    C: Clock,
{
    let prune_every = prune_every.max(1);
    let mut stats = ListenerStats::default();
    let mut seen: u64 = 0;
    let mut now = recorder.clock().now_epoch_secs();

    while let Some(event) = rx.recv().await {
        now = recorder.clock().now_epoch_secs();
        let session = registry.session_mut(&event.session_id, now);
        match recorder
            .record_view(&event.content_id, session, &event.meta)
            .await
        {
            Ok(ViewOutcome::Recorded) => stats.recorded += 1,
            Ok(ViewOutcome::Duplicate) => stats.duplicates += 1,
            Err(e) => {
                stats.failed += 1;
                tracing::warn!(
                    content_id = %event.content_id,
                    session_id = %event.session_id,
                    error = %e,
                    "view not recorded"
                );
            }
        }
        stats.pruned += registry.release(&event.session_id, now) as u64;

        seen += 1;
        if seen % prune_every == 0 {
            let removed = registry.prune_all(now);
            stats.pruned += removed as u64;
            tracing::debug!(removed, sessions = registry.len(), "session sweep");
        }
    }

    stats.pruned += registry.prune_all(now) as u64;

    tracing::info!(
        recorded = stats.recorded,
        duplicates = stats.duplicates,
        failed = stats.failed,
        pruned = stats.pruned,
        sessions = registry.len(),
        "view listener stopped"
    );
    (registry, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{FixedClock, MemorySink};
    use crate::session::{viewed_key, ExpiryPolicy, SessionState};
    use std::sync::atomic::{AtomicI64, Ordering};

    fn event(content: u64, session: &str) -> ContentViewed {
        ContentViewed {
            content_id: ContentId::from(content),
            session_id: session.to_string(),
            meta: RequestMeta::new().referer("https://ref.example.com/x"),
        }
    }

    #[tokio::test]
    async fn listener_dedups_per_session() {
        let (tx, rx) = mpsc::channel(16);
        let recorder = ViewRecorder::with_clock(MemorySink::new(), FixedClock(1_000));
        let registry = SessionRegistry::new(ExpiryPolicy::default());
        let handle = tokio::spawn(run_view_listener(rx, recorder, registry));

        for ev in [event(1, "a"), event(1, "a"), event(2, "a"), event(1, "b")] {
            tx.send(ev).await.unwrap();
        }
        drop(tx);

        let (registry, stats) = handle.await.unwrap();
        assert_eq!(
            stats,
            ListenerStats {
                recorded: 3,
                duplicates: 1,
                failed: 0,
                pruned: 0,
            }
        );
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry
                .get("a")
                .and_then(|s| s.get(&viewed_key(&ContentId::from(2u64)))),
            Some(1_000)
        );
    }

    #[tokio::test]
    async fn listener_counts_failures_and_keeps_going() {
        let (tx, rx) = mpsc::channel(4);
        let recorder = ViewRecorder::with_clock(MemorySink::failing(), FixedClock(1_000));
        let registry = SessionRegistry::new(ExpiryPolicy::default());

        tx.send(event(1, "a")).await.unwrap();
        tx.send(event(1, "a")).await.unwrap();
        drop(tx);

        let (registry, stats) = run_view_listener(rx, recorder, registry).await;
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.recorded, 0);
        // The unmarked session is not kept around.
        assert!(registry.get("a").is_none());
        assert!(registry.is_empty());
    }

    /// Clock that advances by `step` seconds on every read.
    struct SteppingClock {
        now: AtomicI64,
        step: i64,
    }

    impl Clock for SteppingClock {
        fn now_epoch_secs(&self) -> i64 {
            self.now.fetch_add(self.step, Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn listener_sweeps_sessions_of_visitors_who_never_return() {
        let (tx, rx) = mpsc::channel(8);
        // Each event reads the clock twice (listener, then the marker write), so
        // markers land at 200, 400, 600 and 800 and the sweep after the fourth runs at 700.
        let clock = SteppingClock {
            now: AtomicI64::new(0),
            step: 100,
        };
        let recorder = ViewRecorder::with_clock(MemorySink::new(), clock);
        let registry = SessionRegistry::new(ExpiryPolicy {
            window_secs: Some(150),
            max_markers: None,
        });

        for session in ["a", "b", "c", "d"] {
            tx.send(event(1, session)).await.unwrap();
        }
        drop(tx);

        let (registry, stats) = run_view_listener_with(rx, recorder, registry, 4).await;
        assert_eq!(stats.recorded, 4);
        // "a" and "b" are past the 150s window; "c" and "d" are not.
        assert_eq!(stats.pruned, 2);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("a").is_none());
        assert!(registry.get("b").is_none());
        assert!(registry.get("c").is_some());
        assert!(registry.get("d").is_some());
    }

    #[tokio::test]
    async fn listener_keeps_sessions_within_the_marker_cap() {
        let (tx, rx) = mpsc::channel(8);
        let recorder = ViewRecorder::with_clock(MemorySink::new(), FixedClock(1_000));
        let registry = SessionRegistry::new(ExpiryPolicy {
            window_secs: None,
            max_markers: Some(2),
        });

        for content in [1, 2, 3] {
            tx.send(event(content, "a")).await.unwrap();
        }
        drop(tx);

        let (registry, stats) = run_view_listener(rx, recorder, registry).await;
        assert_eq!(stats.recorded, 3);
        assert_eq!(registry.get("a").map(|s| s.markers().count()), Some(2));
    }
}

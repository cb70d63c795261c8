//! Persistence hand-off for accepted views.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::types::ViewRecord;

/// Destination for accepted views.
///
/// The recorder takes no position on durability or retries: whatever the
/// sink returns is passed straight back to the caller.
pub trait ViewSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn store(&self, record: ViewRecord) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<S: ViewSink + Sync + ?Sized> ViewSink for &S {
    type Error = S::Error;

    fn store(&self, record: ViewRecord) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).store(record)
    }
}

/// Error returned by [`MemorySink`] while it is set to fail.
#[derive(Debug, thiserror::Error)]
#[error("memory sink rejected view of {content_id}")]
pub struct MemorySinkError {
    pub content_id: String,
}

/// Process-local sink that keeps every stored record in a `Vec`.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ViewRecord>>,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every record until `set_failing(false)`.
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Copies of all stored records, oldest first.
    pub fn records(&self) -> Vec<ViewRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .map(|r| r.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ViewSink for MemorySink {
    type Error = MemorySinkError;

    async fn store(&self, record: ViewRecord) -> Result<(), MemorySinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MemorySinkError {
                content_id: record.content_id.to_string(),
            });
        }
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.push(record);
        Ok(())
    }
}

//! Process-wide analytics accumulator.
//!
//! Dispatch paths call [`AnalyticsBuffer::record`] with an event name; an
//! external reporter periodically calls [`AnalyticsBuffer::drain_all`] and
//! ships the result somewhere. There is no eviction: events stay until they
//! are drained.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsEvent {
    /// Event name.
    pub name: String,
    /// When it was recorded.
    pub recorded_at: SystemTime,
}

/// Cheaply clonable, concurrency-safe event buffer.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsBuffer {
    events: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl AnalyticsBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event. Never waits on I/O; the lock is held only for the push.
    pub fn record(&self, name: impl Into<String>) {
        let event = AnalyticsEvent {
            name: name.into(),
            recorded_at: SystemTime::now(),
        };
        self.events.lock().push(event);
    }

    /// Atomically removes and returns everything recorded so far, oldest first.
    pub fn drain_all(&self) -> Vec<AnalyticsEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Drains the buffer and folds it into per-name counts.
    pub fn drain_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for event in self.drain_all() {
            *counts.entry(event.name).or_insert(0) += 1;
        }
        counts
    }

    /// Number of events waiting to be drained.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if nothing is waiting to be drained.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

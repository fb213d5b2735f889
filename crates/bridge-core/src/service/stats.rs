//! Session throughput and error counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a bridge session.
///
/// Per-message failures on the sync paths are logged and counted here
/// rather than propagated, so the continue-on-error behavior stays
/// observable instead of silent.
#[derive(Debug, Default)]
pub struct SyncStats {
    messages_received: AtomicU64,
    records_inserted: AtomicU64,
    records_updated: AtomicU64,
    records_evicted: AtomicU64,
    records_published: AtomicU64,
    sync_errors: AtomicU64,
}

impl SyncStats {
    /// Fresh zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_message(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.records_inserted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_update(&self) {
        self.records_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        self.records_evicted.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_publish(&self) {
        self.records_published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.sync_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Bus messages handed to the inbound engine.
    #[must_use]
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Records created in insert mode.
    #[must_use]
    pub fn records_inserted(&self) -> u64 {
        self.records_inserted.load(Ordering::Relaxed)
    }

    /// Records written in upsert mode.
    #[must_use]
    pub fn records_updated(&self) -> u64 {
        self.records_updated.load(Ordering::Relaxed)
    }

    /// Records evicted by retention enforcement.
    #[must_use]
    pub fn records_evicted(&self) -> u64 {
        self.records_evicted.load(Ordering::Relaxed)
    }

    /// Broadcast records published to the bus.
    #[must_use]
    pub fn records_published(&self) -> u64 {
        self.records_published.load(Ordering::Relaxed)
    }

    /// Failures caught on the sync paths.
    #[must_use]
    pub fn sync_errors(&self) -> u64 {
        self.sync_errors.load(Ordering::Relaxed)
    }
}

//! Outbound dispatch watcher.
//!
//! Watches the store change feed for records flagged for broadcast,
//! publishes them to the bus, and removes them. Records replayed from
//! the initial state of the feed are never published; only additions
//! after the watch began are eligible.

use crate::ports::outbound::{BusClient, ChangeEvent, ChangeFeed, DocumentStore};
use crate::service::stats::SyncStats;
use bridge_types::{DispatchPolicy, Record};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Publishes broadcast-flagged records and deletes them afterwards.
pub struct DispatchWatcher {
    store: Arc<dyn DocumentStore>,
    client: Arc<dyn BusClient>,
    policy: DispatchPolicy,
    stats: Arc<SyncStats>,
}

impl DispatchWatcher {
    /// Build a watcher bound to one session's bus client.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        client: Arc<dyn BusClient>,
        policy: DispatchPolicy,
        stats: Arc<SyncStats>,
    ) -> Self {
        Self {
            store,
            client,
            policy,
            stats,
        }
    }

    /// Run the watcher on a background task until `shutdown` flips or
    /// the feed closes.
    pub fn spawn(self, feed: ChangeFeed, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(feed, shutdown))
    }

    async fn run(self, mut feed: ChangeFeed, mut shutdown: watch::Receiver<bool>) {
        // Replayed pre-existing records arrive before the CaughtUp
        // marker and must never trigger a publish.
        let mut live = false;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Dispatch watcher stopping");
                        return;
                    }
                }
                event = feed.recv() => match event {
                    None => {
                        debug!("Change feed closed, dispatch watcher stopping");
                        return;
                    }
                    Some(ChangeEvent::CaughtUp) => {
                        live = true;
                        debug!("Initial batch discarded, dispatch watcher live");
                    }
                    Some(ChangeEvent::Added(record)) => {
                        if live && record.is_outbound() {
                            self.dispatch(record).await;
                        }
                    }
                },
            }
        }
    }

    /// Publish one record and remove it from the store, in the order
    /// the configured policy dictates.
    async fn dispatch(&self, record: Record) {
        let payload = record.message.to_wire();

        match self.policy {
            DispatchPolicy::DeleteThenPublish => {
                // Removing first guarantees a record is never published
                // twice; a crash between the steps loses the message.
                match self.store.remove(record.id).await {
                    Ok(true) => {}
                    Ok(false) => {
                        // Someone else removed it; do not publish.
                        debug!(id = %record.id, "Broadcast record already gone, skipping");
                        return;
                    }
                    Err(error) => {
                        warn!(id = %record.id, %error, "Failed to remove broadcast record");
                        self.stats.record_error();
                        return;
                    }
                }
                self.publish(&record, &payload).await;
            }
            DispatchPolicy::PublishThenDelete => {
                // Publishing first never loses the message; a crash
                // between the steps can republish it on the next watch.
                if !self.publish(&record, &payload).await {
                    return;
                }
                match self.store.remove(record.id).await {
                    Ok(_) => {}
                    Err(error) => {
                        warn!(id = %record.id, %error, "Failed to remove published record");
                        self.stats.record_error();
                    }
                }
            }
        }
    }

    async fn publish(&self, record: &Record, payload: &str) -> bool {
        match self.client.publish(&record.topic, payload).await {
            Ok(()) => {
                self.stats.record_publish();
                debug!(topic = %record.topic, "Broadcast record published");
                true
            }
            Err(error) => {
                // A torn-down session makes this a guarded no-op.
                warn!(topic = %record.topic, %error, "Failed to publish broadcast record");
                self.stats.record_error();
                false
            }
        }
    }
}

//! Inbound synchronization engine.
//!
//! Consumes `(topic, payload)` pairs from the bus, decodes them, and
//! persists them under one of two policies: append-with-limit or
//! upsert-latest. A failure while persisting one message is logged and
//! counted; it never stops processing of subsequent messages.

use crate::domain::decoder::decode_payload;
use crate::domain::errors::StoreError;
use crate::ports::outbound::DocumentStore;
use crate::service::retention;
use crate::service::stats::SyncStats;
use bridge_types::{NewRecord, SyncOptions};
use std::sync::Arc;
use tracing::{debug, warn};

/// Materializes inbound bus messages as records.
pub struct InboundSync {
    store: Arc<dyn DocumentStore>,
    options: SyncOptions,
    /// Resolved retention cap; `None` when no valid limit applies.
    limit: Option<u64>,
    stats: Arc<SyncStats>,
}

impl InboundSync {
    /// Build an engine for one session. The retention limit is resolved
    /// once here; an invalid limit disables retention rather than
    /// erroring.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, options: SyncOptions, stats: Arc<SyncStats>) -> Self {
        let limit = options.effective_limit();
        Self {
            store,
            options,
            limit,
            stats,
        }
    }

    /// Process one received message.
    ///
    /// Store failures are reported through the log and the error
    /// counter; this method itself never fails.
    pub async fn handle_message(&self, topic: &str, payload: &[u8]) {
        self.stats.record_message();
        let message = decode_payload(payload, self.options.raw);

        let outcome = if self.options.insert {
            self.append(topic, message).await
        } else {
            self.upsert(topic, message).await
        };

        if let Err(error) = outcome {
            warn!(%topic, %error, "Inbound sync failed, continuing with next message");
            self.stats.record_error();
        }
    }

    /// Insert mode: one new record per message, then trim the topic to
    /// the retention limit if one applies.
    async fn append(&self, topic: &str, message: bridge_types::Message) -> Result<(), StoreError> {
        self.store
            .insert(NewRecord::inbound(topic, message))
            .await?;
        self.stats.record_insert();

        if let Some(limit) = self.limit {
            let evicted = retention::enforce_limit(self.store.as_ref(), topic, limit).await?;
            if evicted > 0 {
                self.stats.record_evictions(evicted);
                debug!(%topic, evicted, limit, "Retention trimmed topic");
            }
        }
        Ok(())
    }

    /// Upsert mode (default): at most one record per topic, holding the
    /// most recently received message.
    async fn upsert(&self, topic: &str, message: bridge_types::Message) -> Result<(), StoreError> {
        self.store.upsert_by_topic(topic, message).await?;
        self.stats.record_update();
        Ok(())
    }
}

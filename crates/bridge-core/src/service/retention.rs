//! Per-topic retention enforcement.
//!
//! Trims a topic's record set down to a configured maximum, oldest
//! first. The loop re-checks the count on every pass instead of
//! assuming a fixed overshoot, so it converges under concurrent inserts
//! to the same topic.

use crate::domain::errors::StoreError;
use crate::ports::outbound::DocumentStore;
use tracing::debug;

/// Delete the oldest records for `topic` until at most `limit` remain.
///
/// Returns the number of records evicted. A missing "oldest" record
/// (e.g. a concurrent deletion got there first) means the topic has
/// already converged; the loop exits cleanly rather than erroring.
pub async fn enforce_limit(
    store: &dyn DocumentStore,
    topic: &str,
    limit: u64,
) -> Result<u64, StoreError> {
    let mut evicted = 0u64;

    while store.count(topic).await? as u64 > limit {
        let Some(oldest) = store.oldest(topic).await? else {
            // Converged concurrently; nothing left to trim.
            break;
        };

        if store.remove(oldest.id).await? {
            evicted += 1;
            debug!(%topic, id = %oldest.id, "Evicted oldest record");
        }
    }

    Ok(evicted)
}

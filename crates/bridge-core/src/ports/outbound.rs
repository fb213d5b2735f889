//! Outbound (driven) ports for the bridge.
//!
//! These traits define the two external collaborators — the message bus
//! and the document store — plus a time source. The session controller
//! receives implementations by injection, which is also the seam for
//! fakes in tests.

use crate::domain::errors::{BusError, StoreError};
use async_trait::async_trait;
use bridge_types::{Message, NewRecord, Record, RecordId, Timestamp, TransportOptions};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;

/// Events delivered by an established bus session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// The transport finished connecting; subscriptions may be issued.
    Connected,
    /// A message arrived on a subscribed topic.
    Message {
        /// Source topic.
        topic: String,
        /// Raw payload bytes.
        payload: Vec<u8>,
    },
}

/// Handle to a live bus connection.
///
/// Owned exclusively by the session controller; other components act on
/// the bus only through callbacks the session wires up.
#[async_trait]
pub trait BusClient: Send + Sync {
    /// Subscribe to a topic.
    async fn subscribe(&self, topic: &str) -> Result<(), BusError>;

    /// Publish a text payload to a topic.
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), BusError>;

    /// Tear the connection down. Idempotent.
    async fn end(&self);
}

/// An established session: the client handle plus its event stream.
///
/// The event channel closes when the client ends, which is how consumer
/// loops learn the session is gone.
pub struct BusSession {
    /// The connection handle.
    pub client: Arc<dyn BusClient>,
    /// Connection and message events, in delivery order.
    pub events: mpsc::UnboundedReceiver<BusEvent>,
}

/// Dials the bus transport.
#[async_trait]
pub trait BusConnector: Send + Sync {
    /// Establish a session against `uri`.
    async fn connect(
        &self,
        uri: &str,
        transport: &TransportOptions,
    ) -> Result<BusSession, BusError>;
}

/// Events on a store change feed.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// A record is present in the collection. Before [`ChangeEvent::CaughtUp`]
    /// these are replays of pre-existing state; after it, genuine additions.
    Added(Record),
    /// Marks the end of the initial replay batch. Everything from here
    /// on was created after the watch began.
    CaughtUp,
}

/// A live feed of additions to the collection.
///
/// The feed replays the records that existed when the watch was
/// established, then emits [`ChangeEvent::CaughtUp`], then streams
/// genuinely new additions. Consumers that must never act on
/// pre-existing state discard everything before the marker.
pub struct ChangeFeed {
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl ChangeFeed {
    /// Wrap a channel of change events.
    #[must_use]
    pub fn new(receiver: mpsc::UnboundedReceiver<ChangeEvent>) -> Self {
        Self { receiver }
    }

    /// Receive the next change event.
    ///
    /// Returns `None` once the store side of the feed is dropped.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }
}

impl Stream for ChangeFeed {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// The persistent document store collaborator.
///
/// All operations are potentially blocking I/O from the caller's view
/// and are therefore async. `oldest` ordering is by creation timestamp
/// with the store-assigned sequence as a deterministic tie-break.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document; the store assigns id, timestamp, and
    /// sequence.
    async fn insert(&self, doc: NewRecord) -> Result<Record, StoreError>;

    /// Upsert keyed by topic: update the message of the existing record
    /// for `topic`, or create one. At most one record per topic survives
    /// this path.
    async fn upsert_by_topic(&self, topic: &str, message: Message) -> Result<Record, StoreError>;

    /// Remove a document by id. Returns whether a document was removed.
    async fn remove(&self, id: RecordId) -> Result<bool, StoreError>;

    /// Count documents for a topic.
    async fn count(&self, topic: &str) -> Result<usize, StoreError>;

    /// The oldest document for a topic, if any.
    async fn oldest(&self, topic: &str) -> Result<Option<Record>, StoreError>;

    /// Fetch documents, optionally filtered by topic, in creation order.
    async fn find(&self, topic: Option<&str>) -> Result<Vec<Record>, StoreError>;

    /// Open a change feed over the whole collection.
    fn watch(&self) -> ChangeFeed;
}

/// Time source for record timestamps.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Mock time source for testing.
#[cfg(test)]
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MockTimeSource {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}

//! In-memory document store.
//!
//! Implements the [`DocumentStore`] port over a locked vector. The
//! change feed replays the current contents as `Added` events, marks
//! the boundary with `CaughtUp`, and then streams live additions in
//! write order — the notification is sent while the write lock is held,
//! so feed order matches store order.
//!
//! Production deployments back the same port with a real database and
//! its native change stream.

use crate::domain::errors::StoreError;
use crate::ports::outbound::{ChangeEvent, ChangeFeed, DocumentStore, SystemTimeSource, TimeSource};
use async_trait::async_trait;
use bridge_types::{Message, NewRecord, Record, RecordId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

struct StoreInner {
    records: Vec<Record>,
    next_seq: u64,
    watchers: Vec<mpsc::UnboundedSender<ChangeEvent>>,
}

/// Shared in-memory collection with a live change feed.
pub struct InMemoryDocumentStore {
    inner: Mutex<StoreInner>,
    time_source: Arc<dyn TimeSource>,
    fail_next_write: AtomicBool,
}

impl InMemoryDocumentStore {
    /// Create an empty store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_time_source(Arc::new(SystemTimeSource))
    }

    /// Create an empty store with an injected time source.
    #[must_use]
    pub fn with_time_source(time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                records: Vec::new(),
                next_seq: 0,
                watchers: Vec::new(),
            }),
            time_source,
            fail_next_write: AtomicBool::new(false),
        }
    }

    /// Make the next write operation fail. Fault injection for tests.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn check_write_fault(&self) -> Result<(), StoreError> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("injected failure".into()));
        }
        Ok(())
    }

    fn create_record(inner: &mut StoreInner, doc: NewRecord, created_at: u64) -> Record {
        inner.next_seq += 1;
        let record = Record {
            id: RecordId::generate(),
            topic: doc.topic,
            message: doc.message,
            broadcast: doc.broadcast,
            created_at,
            seq: inner.next_seq,
        };
        inner.records.push(record.clone());
        notify(inner, ChangeEvent::Added(record.clone()));
        record
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Send an event to every watcher, dropping the ones that went away.
fn notify(inner: &mut StoreInner, event: ChangeEvent) {
    inner
        .watchers
        .retain(|watcher| watcher.send(event.clone()).is_ok());
}

fn creation_order(record: &Record) -> (u64, u64) {
    (record.created_at, record.seq)
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, doc: NewRecord) -> Result<Record, StoreError> {
        self.check_write_fault()?;
        let created_at = self.time_source.now();
        let mut inner = self.lock()?;
        Ok(Self::create_record(&mut inner, doc, created_at))
    }

    async fn upsert_by_topic(&self, topic: &str, message: Message) -> Result<Record, StoreError> {
        self.check_write_fault()?;
        let created_at = self.time_source.now();
        let mut inner = self.lock()?;

        if let Some(existing) = inner.records.iter_mut().find(|r| r.topic == topic) {
            existing.message = message;
            return Ok(existing.clone());
        }
        Ok(Self::create_record(
            &mut inner,
            NewRecord::inbound(topic, message),
            created_at,
        ))
    }

    async fn remove(&self, id: RecordId) -> Result<bool, StoreError> {
        self.check_write_fault()?;
        let mut inner = self.lock()?;
        let before = inner.records.len();
        inner.records.retain(|record| record.id != id);
        Ok(inner.records.len() < before)
    }

    async fn count(&self, topic: &str) -> Result<usize, StoreError> {
        let inner = self.lock()?;
        Ok(inner.records.iter().filter(|r| r.topic == topic).count())
    }

    async fn oldest(&self, topic: &str) -> Result<Option<Record>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .records
            .iter()
            .filter(|r| r.topic == topic)
            .min_by_key(|r| creation_order(r))
            .cloned())
    }

    async fn find(&self, topic: Option<&str>) -> Result<Vec<Record>, StoreError> {
        let inner = self.lock()?;
        let mut records: Vec<Record> = inner
            .records
            .iter()
            .filter(|r| topic.map_or(true, |t| r.topic == t))
            .cloned()
            .collect();
        records.sort_by_key(creation_order);
        Ok(records)
    }

    fn watch(&self) -> ChangeFeed {
        let (sender, receiver) = mpsc::unbounded_channel();
        if let Ok(mut inner) = self.inner.lock() {
            let mut snapshot = inner.records.clone();
            snapshot.sort_by_key(creation_order);
            for record in snapshot {
                let _ = sender.send(ChangeEvent::Added(record));
            }
            let _ = sender.send(ChangeEvent::CaughtUp);
            inner.watchers.push(sender);
        }
        ChangeFeed::new(receiver)
    }
}

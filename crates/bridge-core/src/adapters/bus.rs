//! Loopback message bus.
//!
//! An in-process bus implementing the [`BusConnector`] and [`BusClient`]
//! ports. Clients see a `Connected` event immediately after dialing;
//! publishes are recorded broker-side and delivered to other clients
//! with a matching subscription. Topic matching is exact (no wildcard
//! expansion).
//!
//! Besides serving single-node setups, this is the fake bus for tests:
//! it records subscriptions, publishes, and `end` calls, can deliver
//! broker-originated messages on demand, and supports publish fault
//! injection.

use crate::domain::errors::BusError;
use crate::ports::outbound::{BusClient, BusConnector, BusEvent, BusSession};
use async_trait::async_trait;
use bridge_types::TransportOptions;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;

/// A publish observed by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Destination topic.
    pub topic: String,
    /// Text payload as handed to `publish`.
    pub payload: String,
}

/// Per-client state shared between the broker and the client handle.
struct ClientShared {
    subscriptions: Mutex<Vec<String>>,
    sender: Mutex<Option<mpsc::UnboundedSender<BusEvent>>>,
    ended: AtomicBool,
}

impl ClientShared {
    fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions
            .lock()
            .map(|subs| subs.iter().any(|t| t == topic))
            .unwrap_or(false)
    }

    fn deliver(&self, topic: &str, payload: &[u8]) {
        if self.ended.load(Ordering::SeqCst) {
            return;
        }
        if let Ok(sender) = self.sender.lock() {
            if let Some(sender) = sender.as_ref() {
                let _ = sender.send(BusEvent::Message {
                    topic: topic.to_owned(),
                    payload: payload.to_vec(),
                });
            }
        }
    }
}

struct BusInner {
    clients: Vec<Arc<ClientShared>>,
    published: Vec<PublishedMessage>,
}

/// In-process broker handing out loopback clients.
pub struct InMemoryBus {
    inner: Arc<Mutex<BusInner>>,
    fail_next_publish: Arc<AtomicBool>,
}

impl InMemoryBus {
    /// Create an empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                clients: Vec::new(),
                published: Vec::new(),
            })),
            fail_next_publish: Arc::new(AtomicBool::new(false)),
        }
    }

    /// All publishes observed so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.inner
            .lock()
            .map(|inner| inner.published.clone())
            .unwrap_or_default()
    }

    /// All topics subscribed by live clients, in subscribe order.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<String> {
        let Ok(inner) = self.inner.lock() else {
            return Vec::new();
        };
        inner
            .clients
            .iter()
            .filter(|client| !client.ended.load(Ordering::SeqCst))
            .flat_map(|client| {
                client
                    .subscriptions
                    .lock()
                    .map(|subs| subs.clone())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Number of clients handed out (ended clients included).
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.clients.len())
            .unwrap_or(0)
    }

    /// Whether the client at `index` (in connect order) has ended.
    #[must_use]
    pub fn client_ended(&self, index: usize) -> bool {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| {
                inner
                    .clients
                    .get(index)
                    .map(|client| client.ended.load(Ordering::SeqCst))
            })
            .unwrap_or(false)
    }

    /// Deliver a broker-originated message to every live client
    /// subscribed to `topic`.
    pub fn deliver(&self, topic: &str, payload: &[u8]) {
        let Ok(inner) = self.inner.lock() else {
            return;
        };
        for client in &inner.clients {
            if client.is_subscribed(topic) {
                client.deliver(topic, payload);
            }
        }
    }

    /// Make the next `publish` call fail. Fault injection for tests.
    pub fn fail_next_publish(&self) {
        self.fail_next_publish.store(true, Ordering::SeqCst);
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusConnector for InMemoryBus {
    async fn connect(
        &self,
        uri: &str,
        _transport: &TransportOptions,
    ) -> Result<BusSession, BusError> {
        let (sender, events) = mpsc::unbounded_channel();
        let shared = Arc::new(ClientShared {
            subscriptions: Mutex::new(Vec::new()),
            sender: Mutex::new(Some(sender.clone())),
            ended: AtomicBool::new(false),
        });

        self.inner
            .lock()
            .map_err(|_| BusError::ConnectionFailed("bus state lock poisoned".into()))?
            .clients
            .push(shared.clone());

        // The loopback transport is connected as soon as it is dialed.
        let _ = sender.send(BusEvent::Connected);
        debug!(%uri, "Loopback bus client connected");

        Ok(BusSession {
            client: Arc::new(InMemoryBusClient {
                shared,
                inner: self.inner.clone(),
                fail_next_publish: self.fail_next_publish.clone(),
            }),
            events,
        })
    }
}

/// Client handle produced by [`InMemoryBus`].
pub struct InMemoryBusClient {
    shared: Arc<ClientShared>,
    inner: Arc<Mutex<BusInner>>,
    fail_next_publish: Arc<AtomicBool>,
}

#[async_trait]
impl BusClient for InMemoryBusClient {
    async fn subscribe(&self, topic: &str) -> Result<(), BusError> {
        if self.shared.ended.load(Ordering::SeqCst) {
            return Err(BusError::SessionClosed);
        }
        self.shared
            .subscriptions
            .lock()
            .map_err(|_| BusError::SubscribeFailed {
                topic: topic.to_owned(),
                reason: "bus state lock poisoned".into(),
            })?
            .push(topic.to_owned());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), BusError> {
        if self.shared.ended.load(Ordering::SeqCst) {
            return Err(BusError::SessionClosed);
        }
        if self.fail_next_publish.swap(false, Ordering::SeqCst) {
            return Err(BusError::PublishFailed {
                topic: topic.to_owned(),
                reason: "injected failure".into(),
            });
        }

        let mut inner = self.inner.lock().map_err(|_| BusError::PublishFailed {
            topic: topic.to_owned(),
            reason: "bus state lock poisoned".into(),
        })?;
        inner.published.push(PublishedMessage {
            topic: topic.to_owned(),
            payload: payload.to_owned(),
        });

        // Loop the message back to other subscribed clients.
        for client in &inner.clients {
            if !Arc::ptr_eq(client, &self.shared) && client.is_subscribed(topic) {
                client.deliver(topic, payload.as_bytes());
            }
        }
        Ok(())
    }

    async fn end(&self) {
        self.shared.ended.store(true, Ordering::SeqCst);
        // Dropping the sender closes the session's event channel.
        if let Ok(mut sender) = self.shared.sender.lock() {
            sender.take();
        }
    }
}

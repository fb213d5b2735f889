//! Session controller.
//!
//! Owns the bus client handle and the session lifecycle: dialing the
//! transport, subscribing topics when the transport reports itself
//! connected, feeding received messages to the inbound engine, and
//! arming the outbound dispatch watcher against the store change feed.

use crate::domain::errors::{BridgeError, BusError};
use crate::ports::outbound::{BusClient, BusConnector, BusEvent, DocumentStore};
use crate::service::dispatch::DispatchWatcher;
use crate::service::inbound::InboundSync;
use crate::service::stats::SyncStats;
use bridge_types::{DispatchPolicy, SyncOptions, TopicSelection, TransportOptions};
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Lifecycle state of the bridge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No bus session is established.
    Disconnected,
    /// The transport is being dialed.
    Connecting,
    /// The session is established and both sync paths are armed.
    Connected,
}

/// A live session's moving parts, torn down together.
struct ActiveSession {
    client: Arc<dyn BusClient>,
    shutdown: watch::Sender<bool>,
    inbound_task: JoinHandle<()>,
    dispatch_task: JoinHandle<()>,
}

/// The bridge between one bus connection and one store collection.
///
/// Collaborators are injected as trait objects; the bus client handle
/// created at connect time is owned exclusively here. `connect` while
/// connected tears the prior session down first, and `disconnect` is
/// idempotent.
pub struct CollectionBridge {
    connector: Arc<dyn BusConnector>,
    store: Arc<dyn DocumentStore>,
    policy: DispatchPolicy,
    stats: Arc<SyncStats>,
    state: RwLock<SessionState>,
    active: Mutex<Option<ActiveSession>>,
}

impl CollectionBridge {
    /// Build a bridge over the given collaborators with the default
    /// delete-then-publish dispatch policy.
    #[must_use]
    pub fn new(connector: Arc<dyn BusConnector>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            connector,
            store,
            policy: DispatchPolicy::default(),
            stats: Arc::new(SyncStats::new()),
            state: RwLock::new(SessionState::Disconnected),
            active: Mutex::new(None),
        }
    }

    /// Override the outbound dispatch ordering.
    #[must_use]
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Session counters.
    #[must_use]
    pub fn stats(&self) -> Arc<SyncStats> {
        self.stats.clone()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .map(|state| *state)
            .unwrap_or(SessionState::Disconnected)
    }

    fn set_state(&self, state: SessionState) {
        if let Ok(mut slot) = self.state.write() {
            *slot = state;
        }
    }

    /// Establish a session: dial the bus, subscribe `topics` once the
    /// transport reports connected, and arm both sync paths.
    ///
    /// Calling this while already connected force-disconnects the prior
    /// session first.
    pub async fn connect(
        &self,
        uri: &str,
        topics: impl Into<TopicSelection>,
        options: SyncOptions,
        transport: TransportOptions,
    ) -> Result<(), BridgeError> {
        self.disconnect().await;
        self.set_state(SessionState::Connecting);

        let session = match self.connector.connect(uri, &transport).await {
            Ok(session) => session,
            Err(error) => {
                self.set_state(SessionState::Disconnected);
                return Err(error.into());
            }
        };
        let client = session.client.clone();

        // The watch opens before anything else can write, so every
        // record that predates this session lands in the discarded
        // initial batch.
        let feed = self.store.watch();

        let (shutdown, shutdown_rx) = watch::channel(false);
        let engine = InboundSync::new(self.store.clone(), options, self.stats.clone());
        let topics = topics.into();

        let inbound_task = tokio::spawn(run_inbound_loop(
            session.events,
            client.clone(),
            topics,
            engine,
            shutdown_rx.clone(),
        ));

        let watcher = DispatchWatcher::new(
            self.store.clone(),
            client.clone(),
            self.policy,
            self.stats.clone(),
        );
        let dispatch_task = watcher.spawn(feed, shutdown_rx);

        let replaced = self.active.lock().await.replace(ActiveSession {
            client,
            shutdown,
            inbound_task,
            dispatch_task,
        });
        // A racing connect() can slip a session in between our
        // disconnect above and this store; tear the loser down.
        if let Some(prev) = replaced {
            teardown(prev).await;
        }

        self.set_state(SessionState::Connected);
        debug!(%uri, "Bridge session established");
        Ok(())
    }

    /// Tear the session down. Safe to call repeatedly or while already
    /// disconnected.
    pub async fn disconnect(&self) {
        let Some(active) = self.active.lock().await.take() else {
            self.set_state(SessionState::Disconnected);
            return;
        };
        teardown(active).await;
        self.set_state(SessionState::Disconnected);
        debug!("Bridge session torn down");
    }

    /// Subscribe additional topics on the live session.
    ///
    /// A no-op without an active session or with an empty selection.
    pub async fn subscribe(&self, topics: impl Into<TopicSelection>) -> Result<(), BridgeError> {
        let topics = topics.into();
        if topics.is_empty() {
            return Ok(());
        }
        let client = {
            let active = self.active.lock().await;
            match active.as_ref() {
                Some(session) => session.client.clone(),
                None => return Ok(()),
            }
        };
        subscribe_all(client.as_ref(), &topics).await?;
        Ok(())
    }
}

/// Stop a session's tasks and end its client.
async fn teardown(session: ActiveSession) {
    let _ = session.shutdown.send(true);
    // Ending the client closes its event channel, which also unblocks
    // the inbound loop.
    session.client.end().await;
    let _ = session.inbound_task.await;
    let _ = session.dispatch_task.await;
}

/// Subscribe every topic in the selection, in order.
async fn subscribe_all(client: &dyn BusClient, topics: &TopicSelection) -> Result<(), BusError> {
    for topic in topics.iter() {
        client.subscribe(topic).await?;
    }
    Ok(())
}

/// Drain bus events until shutdown or channel close.
async fn run_inbound_loop(
    mut events: mpsc::UnboundedReceiver<BusEvent>,
    client: Arc<dyn BusClient>,
    topics: TopicSelection,
    engine: InboundSync,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!("Inbound loop stopping");
                    return;
                }
            }
            event = events.recv() => match event {
                None => {
                    debug!("Bus event channel closed, inbound loop stopping");
                    return;
                }
                Some(BusEvent::Connected) => {
                    if let Err(error) = subscribe_all(client.as_ref(), &topics).await {
                        warn!(%error, "Subscription on connect failed");
                    }
                }
                Some(BusEvent::Message { topic, payload }) => {
                    engine.handle_message(&topic, &payload).await;
                }
            },
        }
    }
}

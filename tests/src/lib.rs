//! # collection-bridge Test Suite
//!
//! Unified test crate containing cross-component flows:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── inbound.rs   # bus message → record materialization
//!     ├── outbound.rs  # broadcast record → publish + delete
//!     └── session.rs   # connect/disconnect/subscribe lifecycle
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bridge-tests
//! cargo test -p bridge-tests integration::inbound::
//! ```

#![allow(dead_code)]


use bridge_core::{
    CollectionBridge, InMemoryBus, InMemoryDocumentStore, SyncOptions, TopicSelection,
    TransportOptions,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Install a fmt subscriber once per process; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Poll an async condition until it holds, panicking after one second.
pub async fn eventually<F, Fut>(description: &str, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    loop {
        if condition().await {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for: {description}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// A bridge wired to the in-memory bus and store.
pub struct BridgeFixture {
    pub bus: Arc<InMemoryBus>,
    pub store: Arc<InMemoryDocumentStore>,
    pub bridge: CollectionBridge,
}

impl BridgeFixture {
    /// Fresh fixture with the default dispatch policy.
    pub fn new() -> Self {
        init_tracing();
        let bus = Arc::new(InMemoryBus::new());
        let store = Arc::new(InMemoryDocumentStore::new());
        let bridge = CollectionBridge::new(bus.clone(), store.clone());
        Self { bus, store, bridge }
    }

    /// Connect and wait until every requested topic is subscribed, so
    /// tests can deliver immediately afterwards.
    pub async fn connect(&self, topics: impl Into<TopicSelection>, options: SyncOptions) {
        // Only live clients count, so a reconnect starts from zero.
        let topics = topics.into();
        let expected = topics.iter().count();
        self.bridge
            .connect("mem://broker", topics, options, TransportOptions::default())
            .await
            .expect("connect failed");

        let bus = self.bus.clone();
        eventually("initial subscriptions to register", move || {
            let bus = bus.clone();
            async move { bus.subscriptions().len() >= expected }
        })
        .await;
    }

    /// Give the background loops a moment to drain.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(30)).await;
    }
}

impl Default for BridgeFixture {
    fn default() -> Self {
        Self::new()
    }
}

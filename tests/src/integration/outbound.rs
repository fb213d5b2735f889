//! # Outbound Flow Tests
//!
//! Records inserted with the broadcast flag travel: store insert →
//! change feed → dispatch watcher → bus publish → store delete. Records
//! that existed before the session are initial-batch state and must
//! never be published.

#[cfg(test)]
mod tests {
    use crate::{eventually, BridgeFixture};
    use bridge_core::{
        CollectionBridge, DocumentStore, InMemoryBus, InMemoryDocumentStore, NewRecord,
        SyncOptions, TransportOptions,
    };
    use bridge_types::DispatchPolicy;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn broadcast_insert_publishes_and_removes() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::upsert()).await;

        let record = fx
            .store
            .insert(NewRecord::broadcast(
                "outgoing/topic",
                json!({"data": "broadcast this"}),
            ))
            .await
            .unwrap();

        let bus = fx.bus.clone();
        eventually("broadcast to be published", move || {
            let bus = bus.clone();
            async move { bus.published().len() == 1 }
        })
        .await;

        let published = fx.bus.published();
        assert_eq!(published[0].topic, "outgoing/topic");
        assert_eq!(published[0].payload, r#"{"data":"broadcast this"}"#);

        // The record is gone once published.
        assert!(!fx.store.remove(record.id).await.unwrap());
        assert!(fx.store.find(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn broadcast_text_message_is_published_verbatim() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::upsert()).await;

        fx.store
            .insert(NewRecord::broadcast("outgoing/topic", "simple string"))
            .await
            .unwrap();

        let bus = fx.bus.clone();
        eventually("text broadcast to be published", move || {
            let bus = bus.clone();
            async move { bus.published().len() == 1 }
        })
        .await;

        assert_eq!(fx.bus.published()[0].payload, "simple string");
    }

    #[tokio::test]
    async fn preexisting_records_are_never_published() {
        let fx = BridgeFixture::new();

        // Written while no session exists: initial batch for any later
        // watch.
        fx.store
            .insert(NewRecord::broadcast("stale/topic", "left over"))
            .await
            .unwrap();

        fx.connect("test/topic", SyncOptions::upsert()).await;
        fx.settle().await;

        assert!(fx.bus.published().is_empty());
        assert_eq!(fx.store.find(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn preexisting_records_survive_reconnect_without_publish() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::upsert()).await;
        fx.bridge.disconnect().await;

        // Written between sessions.
        fx.store
            .insert(NewRecord::broadcast("stale/topic", "between sessions"))
            .await
            .unwrap();

        fx.connect("test/topic", SyncOptions::upsert()).await;
        fx.settle().await;

        assert!(fx.bus.published().is_empty());
    }

    #[tokio::test]
    async fn broadcast_while_disconnected_is_not_dispatched() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::upsert()).await;
        fx.bridge.disconnect().await;

        fx.store
            .insert(NewRecord::broadcast("outgoing/topic", "nobody listens"))
            .await
            .unwrap();
        fx.settle().await;

        assert!(fx.bus.published().is_empty());
        assert_eq!(fx.store.find(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn publish_then_delete_policy_works_end_to_end() {
        let bus = Arc::new(InMemoryBus::new());
        let store = Arc::new(InMemoryDocumentStore::new());
        let bridge = CollectionBridge::new(bus.clone(), store.clone())
            .with_policy(DispatchPolicy::PublishThenDelete);

        bridge
            .connect(
                "mem://broker",
                "test/topic",
                SyncOptions::upsert(),
                TransportOptions::default(),
            )
            .await
            .unwrap();

        store
            .insert(NewRecord::broadcast("outgoing/topic", "ordered"))
            .await
            .unwrap();

        let probe = bus.clone();
        eventually("publish-first broadcast to be published", move || {
            let probe = probe.clone();
            async move { probe.published().len() == 1 }
        })
        .await;

        let store_probe = store.clone();
        eventually("published record to be removed", move || {
            let store_probe = store_probe.clone();
            async move { store_probe.find(None).await.unwrap().is_empty() }
        })
        .await;
    }

    #[tokio::test]
    async fn each_broadcast_publishes_exactly_once() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::upsert()).await;

        for i in 0..3 {
            fx.store
                .insert(NewRecord::broadcast("outgoing/topic", json!({"n": i})))
                .await
                .unwrap();
        }

        let bus = fx.bus.clone();
        eventually("all broadcasts to be published", move || {
            let bus = bus.clone();
            async move { bus.published().len() == 3 }
        })
        .await;
        fx.settle().await;

        assert_eq!(fx.bus.published().len(), 3);
        assert!(fx.store.find(None).await.unwrap().is_empty());
        assert_eq!(fx.bridge.stats().records_published(), 3);
    }
}

//! # Inbound Flow Tests
//!
//! Bus messages travel: broker delivery → session event loop → payload
//! decoder → inbound sync engine → store write, under each sync mode.

#[cfg(test)]
mod tests {
    use crate::{eventually, BridgeFixture};
    use bridge_core::{DocumentStore, Message, SyncOptions};
    use serde_json::json;

    async fn deliver_values(fx: &BridgeFixture, topic: &str, count: usize) {
        for i in 0..count {
            fx.bus.deliver(topic, format!(r#"{{"id": {i}}}"#).as_bytes());
        }
    }

    #[tokio::test]
    async fn insert_mode_creates_one_record_per_message() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::insert()).await;

        fx.bus
            .deliver("test/topic", br#"{"data": "test value"}"#);

        let store = fx.store.clone();
        eventually("record to be inserted", move || {
            let store = store.clone();
            async move { store.count("test/topic").await.unwrap() == 1 }
        })
        .await;

        let docs = fx.store.find(Some("test/topic")).await.unwrap();
        assert_eq!(docs[0].topic, "test/topic");
        assert_eq!(
            docs[0].message,
            Message::Structured(json!({"data": "test value"}))
        );
        assert!(!docs[0].broadcast);
    }

    #[tokio::test]
    async fn insert_mode_accumulates_multiple_messages() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::insert()).await;

        deliver_values(&fx, "test/topic", 3).await;

        let store = fx.store.clone();
        eventually("all records to be inserted", move || {
            let store = store.clone();
            async move { store.count("test/topic").await.unwrap() == 3 }
        })
        .await;
    }

    #[tokio::test]
    async fn insert_limit_evicts_oldest_records() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::insert_with_limit(2))
            .await;

        deliver_values(&fx, "test/topic", 3).await;
        fx.settle().await;

        let docs = fx.store.find(Some("test/topic")).await.unwrap();
        assert_eq!(docs.len(), 2);

        // The first message is gone; 1 and 2 survive in order.
        let ids: Vec<_> = docs
            .iter()
            .map(|d| match &d.message {
                Message::Structured(v) => v["id"].as_i64().unwrap(),
                Message::Text(_) => panic!("expected structured message"),
            })
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn insert_limit_accepts_text_form() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::insert_with_limit("2"))
            .await;

        deliver_values(&fx, "test/topic", 5).await;
        fx.settle().await;

        assert_eq!(fx.store.count("test/topic").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn insert_limit_tracks_topics_independently() {
        let fx = BridgeFixture::new();
        fx.connect(
            vec!["room/a", "room/b"],
            SyncOptions::insert_with_limit(2),
        )
        .await;

        // Interleave the two topics.
        for i in 0..4 {
            let topic = if i % 2 == 0 { "room/a" } else { "room/b" };
            fx.bus.deliver(topic, format!(r#"{{"id": {i}}}"#).as_bytes());
        }
        fx.settle().await;

        assert_eq!(fx.store.count("room/a").await.unwrap(), 2);
        assert_eq!(fx.store.count("room/b").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn raw_mode_stores_literal_text() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::insert().raw(true))
            .await;

        fx.bus.deliver("test/topic", b"plain text message");

        let store = fx.store.clone();
        eventually("raw record to be inserted", move || {
            let store = store.clone();
            async move { store.count("test/topic").await.unwrap() == 1 }
        })
        .await;

        let docs = fx.store.find(Some("test/topic")).await.unwrap();
        assert_eq!(docs[0].message, Message::Text("plain text message".into()));
    }

    #[tokio::test]
    async fn invalid_json_degrades_to_text_without_dropping() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::insert()).await;

        fx.bus.deliver("test/topic", b"{invalid json}");

        let store = fx.store.clone();
        eventually("degraded record to be inserted", move || {
            let store = store.clone();
            async move { store.count("test/topic").await.unwrap() == 1 }
        })
        .await;

        let docs = fx.store.find(Some("test/topic")).await.unwrap();
        assert_eq!(docs[0].message, Message::Text("{invalid json}".into()));
    }

    #[tokio::test]
    async fn upsert_mode_keeps_latest_value_per_topic() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::upsert()).await;

        for value in 1..=3 {
            fx.bus
                .deliver("test/topic", format!(r#"{{"value": {value}}}"#).as_bytes());
        }

        let store = fx.store.clone();
        eventually("latest value to land", move || {
            let store = store.clone();
            async move {
                let docs = store.find(Some("test/topic")).await.unwrap();
                docs.len() == 1
                    && docs[0].message == Message::Structured(json!({"value": 3}))
            }
        })
        .await;
    }

    #[tokio::test]
    async fn upsert_mode_separates_topics() {
        let fx = BridgeFixture::new();
        fx.connect(vec!["topic1", "topic2"], SyncOptions::upsert())
            .await;

        fx.bus.deliver("topic1", br#"{"source": "topic1"}"#);
        fx.bus.deliver("topic2", br#"{"source": "topic2"}"#);

        let store = fx.store.clone();
        eventually("both topics to land", move || {
            let store = store.clone();
            async move { store.find(None).await.unwrap().len() == 2 }
        })
        .await;

        let one = fx.store.find(Some("topic1")).await.unwrap();
        assert_eq!(one[0].message, Message::Structured(json!({"source": "topic1"})));
        let two = fx.store.find(Some("topic2")).await.unwrap();
        assert_eq!(two[0].message, Message::Structured(json!({"source": "topic2"})));
    }

    #[tokio::test]
    async fn stats_reflect_inbound_activity() {
        let fx = BridgeFixture::new();
        fx.connect("test/topic", SyncOptions::insert_with_limit(1))
            .await;

        deliver_values(&fx, "test/topic", 3).await;
        fx.settle().await;

        let stats = fx.bridge.stats();
        assert_eq!(stats.messages_received(), 3);
        assert_eq!(stats.records_inserted(), 3);
        assert_eq!(stats.records_evicted(), 2);
        assert_eq!(stats.sync_errors(), 0);
    }
}

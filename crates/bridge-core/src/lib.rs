//! # Collection Bridge Core
//!
//! Bidirectional synchronization between a publish/subscribe message bus
//! and a persistent document store.
//!
//! ## Purpose
//!
//! Inbound bus messages are materialized as records — appended per
//! message or upserted as the latest value per topic, with optional
//! oldest-first retention. Records inserted with a broadcast flag travel
//! the other way: a dispatch watcher publishes them to the bus and
//! removes them from the store.
//!
//! ## Data Flow
//!
//! ```text
//! bus message ──→ decoder ──→ inbound sync ──→ store write
//!                                              (insert / upsert / trim)
//!
//! store insert (broadcast) ──→ dispatch watcher ──→ bus publish
//!                                                   + store delete
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  adapters/ - in-memory bus and document-store implementations  │
//! └────────────────────────────────────────────────────────────────┘
//!                        ↑ implements ↑
//! ┌────────────────────────────────────────────────────────────────┐
//! │  ports/outbound.rs - BusConnector, BusClient, DocumentStore,   │
//! │                      ChangeFeed, TimeSource                    │
//! └────────────────────────────────────────────────────────────────┘
//!                        ↑ uses ↑
//! ┌────────────────────────────────────────────────────────────────┐
//! │  service/session.rs   - CollectionBridge (public API)          │
//! │  service/inbound.rs   - InboundSync                            │
//! │  service/retention.rs - per-topic oldest-first eviction        │
//! │  service/dispatch.rs  - DispatchWatcher                        │
//! │  domain/decoder.rs    - payload decoding                       │
//! │  domain/errors.rs     - BusError, StoreError, BridgeError      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The bus client handle is owned exclusively by the session; the
//! inbound engine and the dispatch watcher reach the bus only through
//! handles the session wires up. Collaborators are injected as trait
//! objects, so a fake bus or store drops in for tests.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryBus, InMemoryDocumentStore};
pub use domain::decoder::decode_payload;
pub use domain::errors::{BridgeError, BusError, StoreError};
pub use ports::outbound::{
    BusClient, BusConnector, BusEvent, BusSession, ChangeEvent, ChangeFeed, DocumentStore,
    SystemTimeSource, TimeSource,
};
pub use service::session::{CollectionBridge, SessionState};
pub use service::stats::SyncStats;

// Re-export the shared entity types at the crate root.
pub use bridge_types::{
    DispatchPolicy, InsertLimit, Message, NewRecord, Record, RecordId, SyncOptions, Timestamp,
    TopicSelection, TransportOptions,
};

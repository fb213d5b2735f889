//! In-memory implementations of the collaborator ports.
//!
//! Suitable for single-node operation and tests; production deployments
//! plug broker-backed and database-backed implementations into the same
//! ports.

pub mod bus;
pub mod store;

pub use bus::{InMemoryBus, InMemoryBusClient, PublishedMessage};
pub use store::InMemoryDocumentStore;

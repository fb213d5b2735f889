//! Synchronization services: the inbound engine, retention enforcement,
//! the outbound dispatch watcher, and the session controller that wires
//! them to the collaborators.

pub mod dispatch;
pub mod inbound;
pub mod retention;
pub mod session;
pub mod stats;

pub use dispatch::DispatchWatcher;
pub use inbound::InboundSync;
pub use session::{CollectionBridge, SessionState};
pub use stats::SyncStats;

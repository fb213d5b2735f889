//! Bridge error types.
//!
//! Split by collaborator: bus transport failures, document store
//! failures, and the session-level umbrella over both. Per-message
//! failures on the sync paths are logged and counted rather than
//! propagated; these types surface from the session API and the ports.

use thiserror::Error;

/// Errors from the bus collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Establishing the session failed.
    #[error("bus connection failed: {0}")]
    ConnectionFailed(String),

    /// A subscribe call was rejected by the transport.
    #[error("subscribe to {topic:?} failed: {reason}")]
    SubscribeFailed {
        /// Topic that could not be subscribed.
        topic: String,
        /// Transport-reported reason.
        reason: String,
    },

    /// A publish call was rejected by the transport.
    #[error("publish to {topic:?} failed: {reason}")]
    PublishFailed {
        /// Topic that could not be published to.
        topic: String,
        /// Transport-reported reason.
        reason: String,
    },

    /// The client handle was already torn down.
    #[error("bus session is closed")]
    SessionClosed,
}

/// Errors from the document store collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A write (insert/upsert/remove) was rejected.
    #[error("store write failed: {0}")]
    WriteFailed(String),

    /// A read (count/oldest/find) failed.
    #[error("store read failed: {0}")]
    ReadFailed(String),

    /// The store is no longer available.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Session-level errors surfaced by the public API.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bus collaborator failed.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// The document store collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

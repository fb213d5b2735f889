//! # Bridge Types Crate
//!
//! Shared entities and value objects for the collection bridge.
//!
//! - `record`: the persisted `Record` entity and its `Message` payload
//!   variant (structured JSON or plain text).
//! - `options`: session configuration — sync mode, retention limit,
//!   topic selection, transport options, dispatch policy.

pub mod options;
pub mod record;

pub use options::{DispatchPolicy, InsertLimit, SyncOptions, TopicSelection, TransportOptions};
pub use record::{Message, NewRecord, Record, RecordId, Timestamp};

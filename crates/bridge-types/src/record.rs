//! # Record Entities
//!
//! The persisted document shape shared by the inbound and outbound
//! synchronization paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Store-assigned unique identifier for a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A message payload, resolved once at decode time.
///
/// Inbound payloads are either parsed JSON or plain text; the variant is
/// fixed when the message enters the system and carried typed from then
/// on. The untagged serde representation keeps stored documents shaped
/// like the raw value (a JSON value or a bare string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// A decoded JSON value.
    Structured(serde_json::Value),
    /// Raw text, either by configuration or as a decode fallback.
    Text(String),
}

impl Message {
    /// Serialize for outbound publishing.
    ///
    /// Structured values are encoded as compact JSON text; text values
    /// pass through unchanged.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::Structured(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }

    /// Whether this is the structured (JSON) variant.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

impl From<serde_json::Value> for Message {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// A persisted document in the bridged collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// Bus topic: source topic for inbound records, destination topic
    /// for outbound-pending records.
    pub topic: String,
    /// The message payload.
    pub message: Message,
    /// Marks the record as outbound-pending. Such records are transient:
    /// they exist only until the dispatch watcher publishes and removes
    /// them.
    #[serde(default, skip_serializing_if = "is_false")]
    pub broadcast: bool,
    /// Creation timestamp, establishing insertion order for retention.
    pub created_at: Timestamp,
    /// Store-assigned monotonic sequence; breaks `created_at` ties so
    /// "oldest" selection is deterministic.
    pub seq: u64,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Record {
    /// Whether this record should trigger an outbound publish: a topic
    /// is present and the broadcast flag is set.
    #[must_use]
    pub fn is_outbound(&self) -> bool {
        self.broadcast && !self.topic.is_empty()
    }
}

/// A document as handed to the store, before an identifier, timestamp,
/// and sequence are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    /// Bus topic for the record.
    pub topic: String,
    /// The message payload.
    pub message: Message,
    /// Outbound-pending marker.
    #[serde(default, skip_serializing_if = "is_false")]
    pub broadcast: bool,
}

impl NewRecord {
    /// An inbound capture: topic plus message, not flagged for
    /// broadcast.
    pub fn inbound(topic: impl Into<String>, message: Message) -> Self {
        Self {
            topic: topic.into(),
            message,
            broadcast: false,
        }
    }

    /// An outbound-pending document: inserting this into the store asks
    /// the bridge to publish `message` on `topic` and delete the record.
    pub fn broadcast(topic: impl Into<String>, message: impl Into<Message>) -> Self {
        Self {
            topic: topic.into(),
            message: message.into(),
            broadcast: true,
        }
    }
}

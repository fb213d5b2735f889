//! # Session Configuration
//!
//! Value objects configuring a bridge session: how inbound messages are
//! materialized, which topics to subscribe, and how outbound dispatch
//! orders its delete/publish steps.

use serde::{Deserialize, Serialize};

/// How inbound messages become records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// `true`: append a new record per message (insert mode).
    /// `false` (default): keep the latest value per topic (upsert mode).
    #[serde(default)]
    pub insert: bool,
    /// Per-topic retention cap for insert mode. Ignored in upsert mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_limit: Option<InsertLimit>,
    /// `true`: store payloads as raw text, skipping JSON decoding.
    #[serde(default)]
    pub raw: bool,
}

impl SyncOptions {
    /// Upsert mode (the default): one record per topic, latest value.
    #[must_use]
    pub fn upsert() -> Self {
        Self::default()
    }

    /// Insert mode without a retention cap.
    #[must_use]
    pub fn insert() -> Self {
        Self {
            insert: true,
            ..Self::default()
        }
    }

    /// Insert mode with a per-topic retention cap.
    #[must_use]
    pub fn insert_with_limit(limit: impl Into<InsertLimit>) -> Self {
        Self {
            insert: true,
            insert_limit: Some(limit.into()),
            ..Self::default()
        }
    }

    /// Set the raw-text flag.
    #[must_use]
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// The retention cap that actually applies, if any.
    #[must_use]
    pub fn effective_limit(&self) -> Option<u64> {
        if !self.insert {
            return None;
        }
        self.insert_limit.as_ref().and_then(InsertLimit::effective)
    }
}

/// A retention limit, given either as a count or as unparsed text.
///
/// Callers may hand the limit through from loosely-typed configuration;
/// text that does not parse as a positive integer simply disables the
/// limit rather than erroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertLimit {
    /// A numeric limit.
    Count(u64),
    /// A textual limit, parsed lazily.
    Text(String),
}

impl InsertLimit {
    /// Resolve to a usable limit. Zero and unparseable text yield
    /// `None` (no retention applies).
    #[must_use]
    pub fn effective(&self) -> Option<u64> {
        let count = match self {
            Self::Count(count) => *count,
            Self::Text(text) => text.trim().parse::<u64>().ok()?,
        };
        (count > 0).then_some(count)
    }
}

impl From<u64> for InsertLimit {
    fn from(count: u64) -> Self {
        Self::Count(count)
    }
}

impl From<&str> for InsertLimit {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for InsertLimit {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// One topic or an ordered list of topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TopicSelection {
    /// A single topic.
    One(String),
    /// An ordered list of topics.
    Many(Vec<String>),
}

impl TopicSelection {
    /// Whether no topics are selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(topic) => topic.is_empty(),
            Self::Many(topics) => topics.is_empty(),
        }
    }

    /// Iterate the selected topics in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let topics: Vec<&str> = match self {
            Self::One(topic) => vec![topic.as_str()],
            Self::Many(topics) => topics.iter().map(String::as_str).collect(),
        };
        topics.into_iter()
    }
}

impl From<&str> for TopicSelection {
    fn from(topic: &str) -> Self {
        Self::One(topic.to_owned())
    }
}

impl From<String> for TopicSelection {
    fn from(topic: String) -> Self {
        Self::One(topic)
    }
}

impl From<Vec<String>> for TopicSelection {
    fn from(topics: Vec<String>) -> Self {
        Self::Many(topics)
    }
}

impl From<Vec<&str>> for TopicSelection {
    fn from(topics: Vec<&str>) -> Self {
        Self::Many(topics.into_iter().map(str::to_owned).collect())
    }
}

/// Transport-level options passed through to the bus connector.
///
/// The bridge does not interpret these; the connector implementation
/// decides what applies to its transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportOptions {
    /// Client identifier presented to the broker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Keep-alive interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive_secs: Option<u64>,
    /// Username for broker authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for broker authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Whether to request a clean session from the broker.
    #[serde(default)]
    pub clean_session: bool,
}

/// Ordering of the outbound delete and publish steps.
///
/// The failure window between the two steps is a deliberate trade-off;
/// each policy picks a side and the choice is observable behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchPolicy {
    /// Delete the record, then publish. A crash between the steps loses
    /// the message; a message is never published twice.
    #[default]
    DeleteThenPublish,
    /// Publish, then delete the record. A crash between the steps can
    /// republish the message; a message is never lost before publish.
    PublishThenDelete,
}

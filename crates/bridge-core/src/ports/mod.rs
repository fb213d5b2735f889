//! Port definitions for the bridge's external collaborators.

pub mod outbound;

pub use outbound::{
    BusClient, BusConnector, BusEvent, BusSession, ChangeEvent, ChangeFeed, DocumentStore,
    SystemTimeSource, TimeSource,
};

//! Domain logic: payload decoding and error types.

pub mod decoder;
pub mod errors;

pub use decoder::decode_payload;
pub use errors::{BridgeError, BusError, StoreError};

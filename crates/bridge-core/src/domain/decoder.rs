//! Payload decoding.
//!
//! Turns a raw bus payload into a [`Message`], exactly once, at the
//! moment the message enters the system. Decoding never fails: a
//! malformed structured payload silently degrades to text.

use bridge_types::Message;

/// Decode a raw payload into a message value.
///
/// With `raw` set the payload is kept as text, never parsed. Otherwise
/// a JSON parse is attempted; on parse failure the raw text is returned
/// unchanged. Invalid UTF-8 is replaced lossily — the bus hands us
/// bytes, the store holds text or JSON.
#[must_use]
pub fn decode_payload(payload: &[u8], raw: bool) -> Message {
    let text = String::from_utf8_lossy(payload).into_owned();
    if raw {
        return Message::Text(text);
    }

    match serde_json::from_str(&text) {
        Ok(value) => Message::Structured(value),
        Err(_) => Message::Text(text),
    }
}

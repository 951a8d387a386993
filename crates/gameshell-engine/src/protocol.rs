//! JSON frame handling for the engine channel
//!
//! The channel carries one JSON object per frame. Inbound frames come from a
//! foreign runtime and are treated as untrusted: malformed frames are dropped
//! with a warning instead of failing the session.

use serde_json::Value;

use gameshell_core::events::event;
use gameshell_core::prelude::*;
use gameshell_core::{InboundEvent, InboundMessage, OutboundMessage, Payload};

// ─────────────────────────────────────────────────────────
// Outbound
// ─────────────────────────────────────────────────────────

/// Encode an outbound command frame.
///
/// Building the object by hand keeps this infallible; `args` is omitted
/// entirely when absent.
pub fn encode_command(name: &str, args: Option<&Payload>) -> String {
    let mut frame = Payload::new();
    frame.insert("command".into(), Value::String(name.to_string()));
    if let Some(args) = args {
        frame.insert("args".into(), Value::Object(args.clone()));
    }
    Value::Object(frame).to_string()
}

/// Parse an outbound frame (used by engine-side simulators and tests)
pub fn parse_command_frame(frame: &str) -> Option<OutboundMessage> {
    serde_json::from_str(frame.trim()).ok()
}

// ─────────────────────────────────────────────────────────
// Inbound
// ─────────────────────────────────────────────────────────

/// Encode an inbound event frame (used by engine-side simulators and tests)
pub fn encode_event(name: &str, data: Option<&Payload>) -> String {
    let mut frame = Payload::new();
    frame.insert("event".into(), Value::String(name.to_string()));
    if let Some(data) = data {
        frame.insert("data".into(), Value::Object(data.clone()));
    }
    Value::Object(frame).to_string()
}

/// Parses an event frame received from the engine host.
///
/// Normalization rules:
/// - a missing or empty `event` becomes `UNKNOWN`
/// - `data` given as a JSON-encoded string is decoded
/// - `data` that is not an object after decoding is discarded
///
/// # Returns
/// * `Some(InboundEvent)` for any well-formed JSON object frame
/// * `None` if the frame is not a JSON object
pub fn parse_engine_message(frame: &str) -> Option<InboundEvent> {
    let raw: InboundMessage = match serde_json::from_str(frame.trim()) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Dropping malformed engine frame ({}): {}", e, truncate(frame));
            return None;
        }
    };

    let name = raw
        .event
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| event::UNKNOWN.to_string());

    let payload = raw.data.and_then(|data| normalize_data(&name, data));
    Some(InboundEvent::new(name, payload))
}

fn normalize_data(name: &str, data: Value) -> Option<Payload> {
    match data {
        Value::Object(map) => Some(map),
        Value::String(encoded) => match serde_json::from_str::<Value>(&encoded) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => {
                debug!("Discarding non-object data string for {}", name);
                None
            }
            Err(_) => {
                warn!("Failed to parse data string for {}: {}", name, truncate(&encoded));
                None
            }
        },
        Value::Null => None,
        other => {
            debug!("Discarding non-object data for {}: {}", name, other);
            None
        }
    }
}

fn truncate(text: &str) -> &str {
    const MAX: usize = 120;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

//! Wire message definitions for the engine channel
//!
//! Outbound frames are `{"command": ..., "args": {...}}`, inbound frames are
//! `{"event": ..., "data": {...}}`. Both payload fields are optional.

use serde::{Deserialize, Serialize};

use crate::types::Payload;

// ─────────────────────────────────────────────────────────
// Reserved Names
// ─────────────────────────────────────────────────────────

/// Command names the bridge itself issues. Anything else is passed through.
pub mod command {
    pub const BOOTSTRAP: &str = "BOOTSTRAP";
    pub const REQUEST_SCENE: &str = "REQUEST_SCENE";
    pub const PAUSE: &str = "PAUSE";
    pub const RESUME: &str = "RESUME";
    pub const TEARDOWN: &str = "TEARDOWN";
    pub const POST_MESSAGE: &str = "POST_MESSAGE";
    pub const SET_RENDER_MODE: &str = "SET_RENDER_MODE";
    pub const SET_EFFECTS_QUALITY: &str = "SET_EFFECTS_QUALITY";

    /// Whether `name` is one of the bridge-owned command names
    pub fn is_reserved(name: &str) -> bool {
        matches!(
            name,
            BOOTSTRAP
                | REQUEST_SCENE
                | PAUSE
                | RESUME
                | TEARDOWN
                | POST_MESSAGE
                | SET_RENDER_MODE
                | SET_EFFECTS_QUALITY
        )
    }
}

/// Event names with meaning to the bridge. Anything else is gameplay data.
pub mod event {
    pub const READY: &str = "READY";
    pub const ERROR: &str = "ERROR";
    pub const SCENE_READY: &str = "SCENE_READY";
    pub const PERF_METRIC: &str = "PERF_METRIC";
    pub const FPS_UPDATE: &str = "FPS_UPDATE";
    /// Substituted when a frame carries no event name
    pub const UNKNOWN: &str = "UNKNOWN";
}

// ─────────────────────────────────────────────────────────
// Frames
// ─────────────────────────────────────────────────────────

/// A command frame sent to the engine host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Payload>,
}

impl OutboundMessage {
    pub fn new(command: impl Into<String>, args: Option<Payload>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

/// An event frame received from the engine host, before normalization.
///
/// `data` is kept as a raw value: hosts sometimes double-encode it as a JSON
/// string, and some send scalars that the bridge discards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

//! Core domain types for the engine bridge

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured key/value data carried by commands and events.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Scene loaded when a caller does not name one
pub const DEFAULT_SCENE: &str = "PlaceholderScene";

/// Lifecycle of the connection to the engine host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeStatus {
    /// No session; nothing attached
    #[default]
    Idle,
    /// Attach in progress, waiting for the engine's readiness signal
    Booting,
    /// Engine accepted the session and can take commands
    Ready,
    /// Bootstrap failed or the channel dropped; retryable
    Error,
}

impl BridgeStatus {
    /// Whether `bootstrap` starts a new attach from this state.
    pub fn can_bootstrap(&self) -> bool {
        matches!(self, BridgeStatus::Idle | BridgeStatus::Error)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BridgeStatus::Ready)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeStatus::Idle => "idle",
            BridgeStatus::Booting => "booting",
            BridgeStatus::Ready => "ready",
            BridgeStatus::Error => "error",
        }
    }
}

impl fmt::Display for BridgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Faults raised by the bridge.
///
/// Only [`EngineUnavailable`](Self::EngineUnavailable),
/// [`BootstrapTimeout`](Self::BootstrapTimeout),
/// [`ChannelDisconnected`](Self::ChannelDisconnected) and
/// [`EngineReported`](Self::EngineReported) are meant for the UI. Queue
/// faults are bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeFault {
    #[error("engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    #[error("engine did not signal readiness within {timeout:?}")]
    BootstrapTimeout { timeout: Duration },

    #[error("engine reported an error: {message}")]
    EngineReported { message: String },

    #[error("engine channel disconnected")]
    ChannelDisconnected,

    #[error("command queue full, dropped oldest command {dropped}")]
    QueueOverflow { dropped: String },

    #[error("dropped stale command {name} after {age:?} in queue")]
    StaleCommandDropped { name: String, age: Duration },
}

impl BridgeFault {
    /// Stable identifier for UI mapping and logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::EngineUnavailable { .. } => "EngineUnavailable",
            Self::BootstrapTimeout { .. } => "BootstrapTimeout",
            Self::EngineReported { .. } => "EngineReported",
            Self::ChannelDisconnected => "ChannelDisconnected",
            Self::QueueOverflow { .. } => "QueueOverflow",
            Self::StaleCommandDropped { .. } => "StaleCommandDropped",
        }
    }

    /// Whether the UI should render an error/retry overlay for this fault.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::EngineUnavailable { .. }
                | Self::BootstrapTimeout { .. }
                | Self::ChannelDisconnected
                | Self::EngineReported { .. }
        )
    }

    /// Non-fatal faults that never change [`BridgeStatus`].
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::QueueOverflow { .. } | Self::StaleCommandDropped { .. }
        )
    }
}

/// An event received from the engine host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboundEvent {
    pub name: String,
    pub payload: Option<Payload>,
    pub received_at: DateTime<Local>,
}

impl InboundEvent {
    pub fn new(name: impl Into<String>, payload: Option<Payload>) -> Self {
        Self {
            name: name.into(),
            payload,
            received_at: Local::now(),
        }
    }

    /// Look up a string field in the payload
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.as_ref()?.get(key)?.as_str()
    }

    /// Look up a numeric field in the payload, accepting numeric strings
    pub fn f64_field(&self, key: &str) -> Option<f64> {
        match self.payload.as_ref()?.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

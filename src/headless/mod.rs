//! Headless mode - JSON event output for scripted runs
//!
//! Drives an [`EngineBridge`](gameshell_app::EngineBridge) without a host UI
//! and reports what happens as structured JSON on stdout, so scripts and CI
//! can assert on bridge behavior without a rendering surface.
//!
//! # Event Format
//!
//! Events are output as NDJSON (newline-delimited JSON), one event per line.
//! Each event has an "event" field indicating its type, along with event-specific data.
//!
//! # Example Output
//!
//! ```json
//! {"event":"bridge_started","host":"loopback","scene":"TrialsArena","timestamp":1704700001000}
//! {"event":"command_dispatched","command":"START_COMBAT","outcome":"queued","timestamp":1704700001002}
//! {"event":"status_changed","status":"booting","generation":1,"scene":null,"timestamp":1704700001003}
//! {"event":"status_changed","status":"ready","generation":1,"scene":"TrialsArena","timestamp":1704700001160}
//! {"event":"engine_message","name":"READY","data":{"sceneName":"TrialsArena"},"timestamp":1704700001160}
//! ```
//!
//! Status and message events are derived from bridge snapshots, so rapid
//! successive changes may be coalesced into the latest one.

pub mod runner;

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use gameshell_app::{BridgeSnapshot, Dispatch};
use gameshell_core::{BridgeFault, Payload};

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Bridge created against an engine host
    BridgeStarted {
        host: String,
        scene: String,
        timestamp: i64,
    },

    /// Bridge status or session generation changed
    StatusChanged {
        status: String,
        generation: u64,
        scene: Option<String>,
        timestamp: i64,
    },

    /// Latest event received from the engine
    EngineMessage {
        name: String,
        data: Option<Payload>,
        timestamp: i64,
    },

    /// A scripted command was handed to the bridge
    CommandDispatched {
        command: String,
        outcome: String,
        timestamp: i64,
    },

    /// Bridge fault recorded on the session
    Fault {
        code: String,
        message: String,
        user_visible: bool,
        timestamp: i64,
    },

    /// Error
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },

    /// Run finished and the session was torn down
    Finished {
        status: String,
        queued: usize,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn bridge_started(host: &str, scene: &str) -> Self {
        Self::BridgeStarted {
            host: host.to_string(),
            scene: scene.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn status_changed(snapshot: &BridgeSnapshot) -> Self {
        Self::StatusChanged {
            status: snapshot.status.to_string(),
            generation: snapshot.generation,
            scene: snapshot.scene.clone(),
            timestamp: Self::now(),
        }
    }

    pub fn engine_message(name: &str, data: Option<Payload>) -> Self {
        Self::EngineMessage {
            name: name.to_string(),
            data,
            timestamp: Self::now(),
        }
    }

    pub fn command_dispatched(command: &str, outcome: Dispatch) -> Self {
        let outcome = match outcome {
            Dispatch::Sent => "sent",
            Dispatch::Queued { .. } => "queued",
            Dispatch::Skipped => "skipped",
            Dispatch::Rejected => "rejected",
        };
        Self::CommandDispatched {
            command: command.to_string(),
            outcome: outcome.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn fault(fault: &BridgeFault) -> Self {
        Self::Fault {
            code: fault.code().to_string(),
            message: fault.to_string(),
            user_visible: fault.is_user_visible(),
            timestamp: Self::now(),
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }

    pub fn finished(snapshot: &BridgeSnapshot) -> Self {
        Self::Finished {
            status: snapshot.status.to_string(),
            queued: snapshot.queued,
            timestamp: Self::now(),
        }
    }

    /// Events describing the difference between two snapshots
    pub fn from_snapshots(previous: &BridgeSnapshot, current: &BridgeSnapshot) -> Vec<Self> {
        let mut events = Vec::new();

        if previous.status != current.status
            || previous.generation != current.generation
            || previous.scene != current.scene
        {
            events.push(Self::status_changed(current));
        }

        if previous.last_message != current.last_message {
            if let Some(message) = &current.last_message {
                events.push(Self::engine_message(&message.name, message.payload.clone()));
            }
        }

        if previous.last_error != current.last_error {
            if let Some(fault) = &current.last_error {
                events.push(Self::fault(fault));
            }
        }

        events
    }
}

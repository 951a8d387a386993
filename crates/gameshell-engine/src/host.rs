//! Engine host boundary
//!
//! An [`EngineHost`] is whatever embeds the native engine: the platform
//! runtime on a device, the loopback simulator in headless runs, or a
//! scripted host in tests. Attaching yields an [`EngineChannel`] carrying
//! JSON frames in both directions.

use tokio::sync::mpsc;

use gameshell_core::prelude::*;
use gameshell_core::Payload;

use crate::availability::{engine_availability, EngineAvailability};
use crate::commands::EngineCommand;
use crate::loopback::LoopbackEngineHost;
use crate::protocol::encode_command;

/// Attaches the bridge to a native engine.
///
/// Implement [`EngineHost`] (the `Send` variant); the bridge spawns the attach
/// future onto the runtime.
#[trait_variant::make(EngineHost: Send)]
pub trait LocalEngineHost {
    /// Open a fresh channel to the engine.
    ///
    /// Fails with [`BridgeFault::EngineUnavailable`](gameshell_core::BridgeFault)
    /// when no engine is embedded.
    async fn attach(&self) -> Result<EngineChannel>;

    /// Short name for logs
    fn name(&self) -> &str;
}

// ─────────────────────────────────────────────────────────
// Channel
// ─────────────────────────────────────────────────────────

/// Bridge side of an attached engine session
#[derive(Debug)]
pub struct EngineChannel {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
}

/// Engine side of an attached session, held by host implementations
#[derive(Debug)]
pub struct HostEndpoint {
    /// Command frames written by the bridge
    pub commands: mpsc::UnboundedReceiver<String>,
    /// Event frames delivered to the bridge
    pub events: mpsc::UnboundedSender<String>,
}

impl EngineChannel {
    /// Create a connected channel/endpoint pair
    pub fn pair() -> (EngineChannel, HostEndpoint) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (evt_tx, evt_rx) = mpsc::unbounded_channel();
        (
            EngineChannel {
                outbound: cmd_tx,
                inbound: evt_rx,
            },
            HostEndpoint {
                commands: cmd_rx,
                events: evt_tx,
            },
        )
    }

    /// Split into a cloneable sender and the inbound frame stream
    pub fn split(self) -> (EngineSender, mpsc::UnboundedReceiver<String>) {
        (
            EngineSender {
                tx: self.outbound,
            },
            self.inbound,
        )
    }
}

/// Writes command frames to an attached engine
#[derive(Debug, Clone)]
pub struct EngineSender {
    tx: mpsc::UnboundedSender<String>,
}

impl EngineSender {
    /// Send a raw `(name, args)` command.
    ///
    /// Returns [`Error::ChannelClosed`] if the engine side has gone away.
    pub fn send(&self, name: &str, args: Option<&Payload>) -> Result<()> {
        let frame = encode_command(name, args);
        trace!("-> engine: {}", frame);
        self.tx.send(frame).map_err(|_| Error::ChannelClosed)
    }

    /// Send a typed command
    pub fn send_command(&self, command: &EngineCommand) -> Result<()> {
        self.send(command.name(), command.args().as_ref())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ─────────────────────────────────────────────────────────
// Hosts
// ─────────────────────────────────────────────────────────

/// Host used when no engine is embedded in the build or the platform.
#[derive(Debug, Clone)]
pub struct UnavailableEngineHost {
    reason: String,
}

impl UnavailableEngineHost {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl EngineHost for UnavailableEngineHost {
    async fn attach(&self) -> Result<EngineChannel> {
        Err(Error::engine_unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Host picked from the process-wide engine availability
#[derive(Debug, Clone)]
pub enum PlatformEngineHost {
    Loopback(LoopbackEngineHost),
    Unavailable(UnavailableEngineHost),
}

impl PlatformEngineHost {
    /// Choose a host from [`engine_availability()`]
    pub fn detect() -> Self {
        Self::for_availability(engine_availability())
    }

    pub fn for_availability(availability: &EngineAvailability) -> Self {
        match availability {
            EngineAvailability::Available => {
                PlatformEngineHost::Loopback(LoopbackEngineHost::default())
            }
            EngineAvailability::Unavailable { reason } => {
                PlatformEngineHost::Unavailable(UnavailableEngineHost::new(reason.clone()))
            }
        }
    }
}

impl EngineHost for PlatformEngineHost {
    async fn attach(&self) -> Result<EngineChannel> {
        match self {
            PlatformEngineHost::Loopback(host) => EngineHost::attach(host).await,
            PlatformEngineHost::Unavailable(host) => EngineHost::attach(host).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            PlatformEngineHost::Loopback(host) => EngineHost::name(host),
            PlatformEngineHost::Unavailable(host) => EngineHost::name(host),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gameshell_core::BridgeFault;
    use serde_json::json;

    #[tokio::test]
    async fn test_sender_writes_frames() {
        let (channel, mut endpoint) = EngineChannel::pair();
        let (sender, _inbound) = channel.split();

        sender
            .send_command(&EngineCommand::RequestScene {
                scene: "ExploreHub".into(),
            })
            .unwrap();

        let frame = endpoint.commands.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!({ "command": "REQUEST_SCENE", "args": { "sceneName": "ExploreHub" } })
        );
    }

    #[tokio::test]
    async fn test_sender_fails_when_engine_side_dropped() {
        let (channel, endpoint) = EngineChannel::pair();
        let (sender, _inbound) = channel.split();
        drop(endpoint);

        assert!(sender.is_closed());
        let err = sender.send("PAUSE", None).unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
    }

    #[tokio::test]
    async fn test_endpoint_events_reach_bridge() {
        let (channel, endpoint) = EngineChannel::pair();
        let (_sender, mut inbound) = channel.split();

        endpoint.events.send(r#"{"event":"READY"}"#.into()).unwrap();
        assert_eq!(inbound.recv().await.unwrap(), r#"{"event":"READY"}"#);
    }

    #[tokio::test]
    async fn test_unavailable_host_fails_attach() {
        let host = UnavailableEngineHost::new("no engine in this build");
        let err = EngineHost::attach(&host).await.unwrap_err();
        assert_eq!(
            err.bridge_fault(),
            Some(&BridgeFault::EngineUnavailable {
                reason: "no engine in this build".into()
            })
        );
    }

    #[test]
    fn test_platform_host_from_availability() {
        let host = PlatformEngineHost::for_availability(&EngineAvailability::Available);
        assert!(matches!(host, PlatformEngineHost::Loopback(_)));
        assert_eq!(EngineHost::name(&host), "loopback");

        let host = PlatformEngineHost::for_availability(&EngineAvailability::Unavailable {
            reason: "disabled".into(),
        });
        assert!(matches!(host, PlatformEngineHost::Unavailable(_)));
        assert_eq!(EngineHost::name(&host), "unavailable");
    }
}

//! In-process engine simulator
//!
//! [`LoopbackEngineHost`] stands in for the native engine in headless runs.
//! It speaks the same frames as a real engine: it signals readiness after a
//! bootstrap, confirms scene loads, and acknowledges gameplay commands with
//! their result events.

use std::time::Duration;

use serde_json::Value;

use gameshell_core::events::{command, event};
use gameshell_core::prelude::*;
use gameshell_core::{Payload, DEFAULT_SCENE};

use crate::host::{EngineChannel, EngineHost, HostEndpoint};
use crate::protocol::{encode_event, parse_command_frame};

/// Delay between BOOTSTRAP and READY when none is configured
pub const DEFAULT_READY_DELAY: Duration = Duration::from_millis(150);

/// Gameplay commands the simulator acknowledges, with the reply event
const ACKNOWLEDGEMENTS: &[(&str, &str)] = &[
    ("START_COMBAT", "COMBAT_STARTED"),
    ("LOAD_MAP", "MAP_LOADED"),
    ("SCAN_RESOURCES", "RESOURCES_SCANNED"),
    ("WARP_TO_EVENT", "EVENT_WARPED"),
    ("SHOW_BLINDBOX", "BLINDBOX_PRESENTED"),
];

/// Engine host that runs a simulated engine on the tokio runtime
#[derive(Debug, Clone)]
pub struct LoopbackEngineHost {
    ready_delay: Duration,
    reported_fps: Option<f64>,
}

impl Default for LoopbackEngineHost {
    fn default() -> Self {
        Self {
            ready_delay: DEFAULT_READY_DELAY,
            reported_fps: None,
        }
    }
}

impl LoopbackEngineHost {
    pub fn new(ready_delay: Duration) -> Self {
        Self {
            ready_delay,
            ..Default::default()
        }
    }

    /// Report a `PERF_METRIC` with this frame rate after each scene load
    pub fn with_reported_fps(mut self, fps: f64) -> Self {
        self.reported_fps = Some(fps);
        self
    }
}

impl EngineHost for LoopbackEngineHost {
    async fn attach(&self) -> Result<EngineChannel> {
        let (channel, endpoint) = EngineChannel::pair();
        let engine = SimulatedEngine {
            endpoint,
            ready_delay: self.ready_delay,
            reported_fps: self.reported_fps,
        };
        tokio::spawn(engine.run());
        debug!("Loopback engine attached");
        Ok(channel)
    }

    fn name(&self) -> &str {
        "loopback"
    }
}

struct SimulatedEngine {
    endpoint: HostEndpoint,
    ready_delay: Duration,
    reported_fps: Option<f64>,
}

impl SimulatedEngine {
    async fn run(mut self) {
        while let Some(frame) = self.endpoint.commands.recv().await {
            let Some(msg) = parse_command_frame(&frame) else {
                warn!("Loopback engine ignoring malformed frame: {}", frame);
                continue;
            };

            if msg.command == command::TEARDOWN {
                debug!("Loopback engine torn down");
                break;
            }

            if !self.handle(&msg.command, msg.args).await {
                break;
            }
        }
        debug!("Loopback engine stopped");
    }

    /// Returns false once the bridge side is gone
    async fn handle(&self, name: &str, args: Option<Payload>) -> bool {
        match name {
            command::BOOTSTRAP => {
                let scene = scene_name(args.as_ref());
                tokio::time::sleep(self.ready_delay).await;
                self.emit(event::READY, Some(scene_payload(&scene)))
                    && self.report_fps()
            }
            command::REQUEST_SCENE => {
                let scene = scene_name(args.as_ref());
                self.emit(event::SCENE_READY, Some(scene_payload(&scene))) && self.report_fps()
            }
            command::PAUSE => self.emit("COMBAT_PAUSED", Some(Payload::new())),
            command::RESUME
            | command::SET_RENDER_MODE
            | command::SET_EFFECTS_QUALITY
            | command::POST_MESSAGE => {
                debug!("Loopback engine applied {} {:?}", name, args);
                true
            }
            other => match ACKNOWLEDGEMENTS.iter().find(|(cmd, _)| *cmd == other) {
                Some((_, reply)) => self.emit(reply, args),
                None => {
                    warn!("Loopback engine: unhandled command {}", other);
                    true
                }
            },
        }
    }

    fn report_fps(&self) -> bool {
        match self.reported_fps {
            Some(fps) => {
                let mut data = Payload::new();
                data.insert("fps".into(), Value::from(fps));
                self.emit(event::PERF_METRIC, Some(data))
            }
            None => true,
        }
    }

    fn emit(&self, name: &str, data: Option<Payload>) -> bool {
        self.endpoint
            .events
            .send(encode_event(name, data.as_ref()))
            .is_ok()
    }
}

fn scene_name(args: Option<&Payload>) -> String {
    args.and_then(|a| a.get("sceneName"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SCENE)
        .to_string()
}

fn scene_payload(scene: &str) -> Payload {
    let mut data = Payload::new();
    data.insert("sceneName".into(), Value::String(scene.to_string()));
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::EngineCommand;
    use crate::protocol::parse_engine_message;
    use gameshell_core::InboundEvent;
    use serde_json::json;
    use tokio::sync::mpsc;

    async fn next_event(inbound: &mut mpsc::UnboundedReceiver<String>) -> InboundEvent {
        let frame = tokio::time::timeout(Duration::from_secs(1), inbound.recv())
            .await
            .expect("timed out waiting for engine event")
            .expect("engine channel closed");
        parse_engine_message(&frame).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_signals_ready_after_delay() {
        let host = LoopbackEngineHost::new(Duration::from_millis(200));
        let (sender, mut inbound) = host.attach().await.unwrap().split();

        sender
            .send_command(&EngineCommand::Bootstrap {
                scene: "TrialsArena".into(),
            })
            .unwrap();

        let event = next_event(&mut inbound).await;
        assert_eq!(event.name, "READY");
        assert_eq!(event.str_field("sceneName"), Some("TrialsArena"));
    }

    #[tokio::test]
    async fn test_bootstrap_without_scene_uses_default() {
        let host = LoopbackEngineHost::new(Duration::ZERO);
        let (sender, mut inbound) = host.attach().await.unwrap().split();

        sender.send("BOOTSTRAP", None).unwrap();
        let event = next_event(&mut inbound).await;
        assert_eq!(event.str_field("sceneName"), Some(DEFAULT_SCENE));
    }

    #[tokio::test]
    async fn test_request_scene_confirms_with_scene_ready() {
        let host = LoopbackEngineHost::new(Duration::ZERO);
        let (sender, mut inbound) = host.attach().await.unwrap().split();

        sender
            .send_command(&EngineCommand::RequestScene {
                scene: "ExploreHub".into(),
            })
            .unwrap();
        let event = next_event(&mut inbound).await;
        assert_eq!(event.name, "SCENE_READY");
        assert_eq!(event.str_field("sceneName"), Some("ExploreHub"));
    }

    #[tokio::test]
    async fn test_gameplay_commands_echo_args() {
        let host = LoopbackEngineHost::new(Duration::ZERO);
        let (sender, mut inbound) = host.attach().await.unwrap().split();

        let args = json!({ "loadout": "default" }).as_object().cloned();
        sender.send("START_COMBAT", args.as_ref()).unwrap();

        let event = next_event(&mut inbound).await;
        assert_eq!(event.name, "COMBAT_STARTED");
        assert_eq!(event.str_field("loadout"), Some("default"));
    }

    #[tokio::test]
    async fn test_pause_acknowledged() {
        let host = LoopbackEngineHost::new(Duration::ZERO);
        let (sender, mut inbound) = host.attach().await.unwrap().split();

        sender.send_command(&EngineCommand::Pause).unwrap();
        let event = next_event(&mut inbound).await;
        assert_eq!(event.name, "COMBAT_PAUSED");
    }

    #[tokio::test]
    async fn test_reported_fps_follows_scene_load() {
        let host = LoopbackEngineHost::new(Duration::ZERO).with_reported_fps(24.0);
        let (sender, mut inbound) = host.attach().await.unwrap().split();

        sender.send("BOOTSTRAP", None).unwrap();
        assert_eq!(next_event(&mut inbound).await.name, "READY");
        let perf = next_event(&mut inbound).await;
        assert_eq!(perf.name, "PERF_METRIC");
        assert_eq!(perf.f64_field("fps"), Some(24.0));
    }

    #[tokio::test]
    async fn test_teardown_closes_channel() {
        let host = LoopbackEngineHost::new(Duration::ZERO);
        let (sender, mut inbound) = host.attach().await.unwrap().split();

        sender.send_command(&EngineCommand::Teardown).unwrap();
        let closed = tokio::time::timeout(Duration::from_secs(1), inbound.recv())
            .await
            .unwrap();
        assert!(closed.is_none());
    }
}

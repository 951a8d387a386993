//! Headless mode runner - scripted bridge session without a host UI
//!
//! Creates a bridge for the project, hands it the scripted commands, boots
//! the engine, optionally cycles focus, then unmounts. Snapshot changes are
//! streamed as [`HeadlessEvent`]s while this happens.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use gameshell_app::{load_settings, BridgeSnapshot, EngineBridge};
use gameshell_core::prelude::*;
use gameshell_core::Payload;
use gameshell_engine::{EngineHost, LoopbackEngineHost, PlatformEngineHost, UnavailableEngineHost};

use super::HeadlessEvent;

/// How long to let engine replies arrive before unmounting
const SETTLE_DELAY: Duration = Duration::from_millis(250);

/// Upper bound on waiting for the snapshot stream to drain at exit
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Which engine host the headless run attaches to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum EngineChoice {
    /// Use the process-wide availability check
    #[default]
    Auto,
    /// Always use the in-process loopback engine
    Loopback,
    /// Run with no engine; every bootstrap fails as unavailable
    #[value(name = "none")]
    Disabled,
}

impl EngineChoice {
    pub fn host(self) -> PlatformEngineHost {
        match self {
            EngineChoice::Auto => PlatformEngineHost::detect(),
            EngineChoice::Loopback => PlatformEngineHost::Loopback(LoopbackEngineHost::default()),
            EngineChoice::Disabled => PlatformEngineHost::Unavailable(UnavailableEngineHost::new(
                "engine disabled on the command line",
            )),
        }
    }
}

/// A command given as `NAME` or `NAME={json object}`
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedCommand {
    pub name: String,
    pub payload: Option<Payload>,
}

impl FromStr for ScriptedCommand {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, payload) = match s.split_once('=') {
            Some((name, json)) => {
                let value: serde_json::Value = serde_json::from_str(json)
                    .map_err(|e| format!("invalid JSON payload for {}: {}", name.trim(), e))?;
                match value {
                    serde_json::Value::Object(map) => (name, Some(map)),
                    _ => return Err(format!("payload for {} must be a JSON object", name.trim())),
                }
            }
            None => (s, None),
        };

        let name = name.trim();
        if name.is_empty() {
            return Err("command name must not be empty".to_string());
        }
        Ok(Self {
            name: name.to_string(),
            payload,
        })
    }
}

/// Options for a headless run
#[derive(Debug, Clone, Default)]
pub struct HeadlessOptions {
    /// Overrides the configured default scene
    pub scene: Option<String>,
    /// Issued before bootstrap, so they exercise the queue
    pub commands: Vec<ScriptedCommand>,
    pub engine: EngineChoice,
    /// Lose and regain focus inside the grace window once ready
    pub focus_cycle: bool,
}

/// Run in headless mode - output JSON events instead of driving a UI.
///
/// Returns the bootstrap error, if any, after the session is torn down.
pub async fn run_headless(project_path: &Path, options: HeadlessOptions) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("Game shell bridge starting in HEADLESS mode");
    info!("Project: {}", project_path.display());
    info!("═══════════════════════════════════════════════════════");

    let mut settings = load_settings(project_path);
    if let Some(scene) = &options.scene {
        settings.bridge.default_scene = scene.clone();
    }
    settings.bridge.validate()?;

    let host = options.engine.host();
    HeadlessEvent::bridge_started(host.name(), &settings.bridge.default_scene).emit();

    let focus_grace = settings.bridge.focus_grace();
    let bridge = EngineBridge::new(host, settings);
    let watcher = spawn_snapshot_watcher(bridge.subscribe());

    for command in &options.commands {
        let outcome = bridge.send_command(&command.name, command.payload.clone());
        HeadlessEvent::command_dispatched(&command.name, outcome).emit();
    }

    let result = bridge.bootstrap_default().await;
    match &result {
        Ok(()) => info!("Engine ready"),
        Err(e) => {
            warn!("Bootstrap failed: {}", e);
            HeadlessEvent::error(e.to_string(), e.is_fatal()).emit();
        }
    }

    if options.focus_cycle && bridge.observe_status().is_ready() {
        info!("Cycling focus within the grace window");
        bridge.focus_lost();
        tokio::time::sleep(focus_grace / 2).await;
        bridge.focus_gained();
    }

    tokio::time::sleep(SETTLE_DELAY).await;

    bridge.screen_unmounted();
    let final_snapshot = bridge.snapshot();
    drop(bridge);

    if tokio::time::timeout(DRAIN_TIMEOUT, watcher).await.is_err() {
        warn!("Snapshot stream did not close after teardown");
    }
    HeadlessEvent::finished(&final_snapshot).emit();

    info!("Game shell headless mode exiting");
    result
}

/// Emit events for every snapshot change until the bridge is dropped
fn spawn_snapshot_watcher(mut rx: watch::Receiver<BridgeSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut previous = rx.borrow_and_update().clone();
        while rx.changed().await.is_ok() {
            let current = rx.borrow_and_update().clone();
            for event in HeadlessEvent::from_snapshots(&previous, &current) {
                event.emit();
            }
            previous = current;
        }
        debug!("Snapshot stream closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gameshell_core::BridgeStatus;
    use serde_json::json;

    #[test]
    fn test_parse_bare_command() {
        let command: ScriptedCommand = "PAUSE".parse().unwrap();
        assert_eq!(command.name, "PAUSE");
        assert!(command.payload.is_none());
    }

    #[test]
    fn test_parse_command_with_payload() {
        let command: ScriptedCommand = r#"START_COMBAT={"loadout":"default","difficulty":3}"#
            .parse()
            .unwrap();
        assert_eq!(command.name, "START_COMBAT");
        let payload = command.payload.unwrap();
        assert_eq!(payload["loadout"], json!("default"));
        assert_eq!(payload["difficulty"], json!(3));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("".parse::<ScriptedCommand>().is_err());
        assert!("=".parse::<ScriptedCommand>().is_err());
        assert!("LOAD_MAP=[1,2]".parse::<ScriptedCommand>().is_err());
        assert!("LOAD_MAP={nope".parse::<ScriptedCommand>().is_err());
    }

    #[test]
    fn test_engine_choice_hosts() {
        assert_eq!(EngineChoice::Loopback.host().name(), "loopback");
        assert_eq!(EngineChoice::Disabled.host().name(), "unavailable");
    }

    #[tokio::test]
    async fn test_watcher_ends_when_bridge_dropped() {
        let (tx, rx) = watch::channel(BridgeSnapshot::default());
        let watcher = spawn_snapshot_watcher(rx);

        tx.send_modify(|snapshot| snapshot.status = BridgeStatus::Booting);
        drop(tx);

        tokio::time::timeout(DRAIN_TIMEOUT, watcher)
            .await
            .expect("watcher should finish")
            .unwrap();
    }
}

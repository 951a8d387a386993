//! Typed commands for the engine channel
//!
//! This module provides:
//! - [`EngineCommand`] - every command the bridge can issue, reserved or free-form
//! - [`RenderMode`], [`EffectsQuality`] - typed arguments for the rendering commands
//! - [`handshake()`] - the frames sent right after a successful attach

use serde::{Deserialize, Serialize};
use serde_json::Value;

use gameshell_core::events::command;
use gameshell_core::Payload;

/// How the engine composites its output into the host view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Surface,
    #[default]
    Texture,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Surface => "surface",
            RenderMode::Texture => "texture",
        }
    }
}

/// Visual effects tier requested from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectsQuality {
    Low,
    Medium,
    High,
}

impl EffectsQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectsQuality::Low => "low",
            EffectsQuality::Medium => "medium",
            EffectsQuality::High => "high",
        }
    }
}

impl std::fmt::Display for EffectsQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands the bridge sends to the engine host
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Load the initial scene of a fresh session
    Bootstrap { scene: String },
    /// Switch to (or resynchronize) a scene
    RequestScene { scene: String },
    Pause,
    Resume,
    /// Release the engine session
    Teardown,
    /// Invoke `method` on a named engine object
    PostMessage {
        object: String,
        method: String,
        payload: String,
    },
    SetRenderMode(RenderMode),
    SetEffectsQuality(EffectsQuality),
    /// Gameplay command opaque to the bridge, passed through unmodified
    Custom { name: String, args: Option<Payload> },
}

impl EngineCommand {
    /// Build a pass-through command
    pub fn custom(name: impl Into<String>, args: Option<Payload>) -> Self {
        EngineCommand::Custom {
            name: name.into(),
            args,
        }
    }

    /// Wire command name
    pub fn name(&self) -> &str {
        match self {
            EngineCommand::Bootstrap { .. } => command::BOOTSTRAP,
            EngineCommand::RequestScene { .. } => command::REQUEST_SCENE,
            EngineCommand::Pause => command::PAUSE,
            EngineCommand::Resume => command::RESUME,
            EngineCommand::Teardown => command::TEARDOWN,
            EngineCommand::PostMessage { .. } => command::POST_MESSAGE,
            EngineCommand::SetRenderMode(_) => command::SET_RENDER_MODE,
            EngineCommand::SetEffectsQuality(_) => command::SET_EFFECTS_QUALITY,
            EngineCommand::Custom { name, .. } => name.as_str(),
        }
    }

    /// Wire arguments
    pub fn args(&self) -> Option<Payload> {
        let mut args = Payload::new();
        match self {
            EngineCommand::Bootstrap { scene } | EngineCommand::RequestScene { scene } => {
                args.insert("sceneName".into(), Value::String(scene.clone()));
            }
            EngineCommand::Pause | EngineCommand::Resume | EngineCommand::Teardown => return None,
            EngineCommand::PostMessage {
                object,
                method,
                payload,
            } => {
                args.insert("objectName".into(), Value::String(object.clone()));
                args.insert("methodName".into(), Value::String(method.clone()));
                args.insert("payload".into(), Value::String(payload.clone()));
            }
            EngineCommand::SetRenderMode(mode) => {
                args.insert("mode".into(), Value::String(mode.as_str().into()));
            }
            EngineCommand::SetEffectsQuality(quality) => {
                args.insert("quality".into(), Value::String(quality.as_str().into()));
            }
            EngineCommand::Custom { args, .. } => return args.clone(),
        }
        Some(args)
    }

    /// Split into the `(name, args)` pair stored by the command queue
    pub fn into_parts(self) -> (String, Option<Payload>) {
        let args = self.args();
        match self {
            EngineCommand::Custom { name, .. } => (name, args),
            other => (other.name().to_string(), args),
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            EngineCommand::Bootstrap { .. } => "bootstrap scene",
            EngineCommand::RequestScene { .. } => "request scene",
            EngineCommand::Pause => "pause engine",
            EngineCommand::Resume => "resume engine",
            EngineCommand::Teardown => "teardown session",
            EngineCommand::PostMessage { .. } => "post object message",
            EngineCommand::SetRenderMode(_) => "set render mode",
            EngineCommand::SetEffectsQuality(_) => "set effects quality",
            EngineCommand::Custom { .. } => "gameplay command",
        }
    }
}

/// Frames sent immediately after attach, before readiness.
///
/// The render mode goes first so the engine composites the initial scene
/// correctly.
pub fn handshake(scene: &str, render_mode: RenderMode) -> [EngineCommand; 2] {
    [
        EngineCommand::SetRenderMode(render_mode),
        EngineCommand::Bootstrap {
            scene: scene.to_string(),
        },
    ]
}

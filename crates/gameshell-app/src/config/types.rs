//! Configuration types for the engine bridge
//!
//! Defines:
//! - `Settings` - Settings file root (`.gameshell/config.toml`)
//! - `BridgeSettings` - Session lifecycle, queue, and timing knobs
//! - `QualitySettings` - Adaptive effects-quality thresholds
//! - `CounterSettings` - Persistent counter storage location

use std::time::Duration;

use serde::{Deserialize, Serialize};

use gameshell_core::prelude::*;
use gameshell_core::DEFAULT_SCENE;
use gameshell_engine::RenderMode;

/// Application settings (.gameshell/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub bridge: BridgeSettings,

    #[serde(default)]
    pub quality: QualitySettings,

    #[serde(default)]
    pub counters: CounterSettings,
}

/// Bridge lifecycle settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BridgeSettings {
    /// Scene loaded on bootstrap and re-requested on focus
    #[serde(default = "default_scene")]
    pub default_scene: String,

    /// How long `bootstrap` waits for READY
    #[serde(default = "default_bootstrap_timeout_ms")]
    pub bootstrap_timeout_ms: u64,

    /// Commands buffered before the oldest is dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Queued commands older than this are dropped at flush time
    #[serde(default = "default_command_ttl_ms")]
    pub command_ttl_ms: u64,

    /// Time after focus loss before the session is torn down
    #[serde(default = "default_focus_grace_ms")]
    pub focus_grace_ms: u64,

    #[serde(default)]
    pub render_mode: RenderMode,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            default_scene: default_scene(),
            bootstrap_timeout_ms: default_bootstrap_timeout_ms(),
            queue_capacity: default_queue_capacity(),
            command_ttl_ms: default_command_ttl_ms(),
            focus_grace_ms: default_focus_grace_ms(),
            render_mode: RenderMode::default(),
        }
    }
}

impl BridgeSettings {
    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_millis(self.bootstrap_timeout_ms)
    }

    pub fn command_ttl(&self) -> Duration {
        Duration::from_millis(self.command_ttl_ms)
    }

    pub fn focus_grace(&self) -> Duration {
        Duration::from_millis(self.focus_grace_ms)
    }

    /// Reject values that would leave the bridge unable to work
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(Error::config_invalid("bridge.queue_capacity must be at least 1"));
        }
        if self.bootstrap_timeout_ms == 0 {
            return Err(Error::config_invalid(
                "bridge.bootstrap_timeout_ms must be greater than 0",
            ));
        }
        if self.default_scene.trim().is_empty() {
            return Err(Error::config_invalid("bridge.default_scene must not be empty"));
        }
        Ok(())
    }
}

fn default_scene() -> String {
    DEFAULT_SCENE.to_string()
}

fn default_bootstrap_timeout_ms() -> u64 {
    10_000
}

fn default_queue_capacity() -> usize {
    50
}

fn default_command_ttl_ms() -> u64 {
    30_000
}

fn default_focus_grace_ms() -> u64 {
    5_000
}

/// Adaptive effects-quality settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QualitySettings {
    /// Below this frame rate, effects drop to `low`
    #[serde(default = "default_low_fps_threshold")]
    pub low_fps_threshold: f64,

    /// Below this frame rate, effects drop to `medium`
    #[serde(default = "default_medium_fps_threshold")]
    pub medium_fps_threshold: f64,

    /// Follow frame-rate reports automatically
    #[serde(default = "default_true")]
    pub adaptive: bool,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            low_fps_threshold: default_low_fps_threshold(),
            medium_fps_threshold: default_medium_fps_threshold(),
            adaptive: true,
        }
    }
}

fn default_low_fps_threshold() -> f64 {
    28.0
}

fn default_medium_fps_threshold() -> f64 {
    45.0
}

fn default_true() -> bool {
    true
}

/// Counter persistence settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CounterSettings {
    /// File name inside `.gameshell/`
    #[serde(default = "default_counter_file")]
    pub file: String,
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            file: default_counter_file(),
        }
    }
}

fn default_counter_file() -> String {
    "counters.toml".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_defaults() {
        let bridge = BridgeSettings::default();
        assert_eq!(bridge.default_scene, "PlaceholderScene");
        assert_eq!(bridge.bootstrap_timeout(), Duration::from_secs(10));
        assert_eq!(bridge.queue_capacity, 50);
        assert_eq!(bridge.command_ttl(), Duration::from_secs(30));
        assert_eq!(bridge.focus_grace(), Duration::from_secs(5));
        assert_eq!(bridge.render_mode, RenderMode::Texture);
        assert!(bridge.validate().is_ok());
    }

    #[test]
    fn test_partial_bridge_section_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[bridge]
default_scene = "TrialsArena"
render_mode = "surface"
"#,
        )
        .unwrap();
        assert_eq!(settings.bridge.default_scene, "TrialsArena");
        assert_eq!(settings.bridge.render_mode, RenderMode::Surface);
        assert_eq!(settings.bridge.queue_capacity, 50);
        assert!(settings.quality.adaptive);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let bridge = BridgeSettings {
            queue_capacity: 0,
            ..Default::default()
        };
        let err = bridge.validate().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let bridge = BridgeSettings {
            bootstrap_timeout_ms: 0,
            ..Default::default()
        };
        assert!(bridge.validate().is_err());
    }

    #[test]
    fn test_quality_defaults() {
        let quality = QualitySettings::default();
        assert_eq!(quality.low_fps_threshold, 28.0);
        assert_eq!(quality.medium_fps_threshold, 45.0);
    }

    #[test]
    fn test_counter_file_default() {
        assert_eq!(CounterSettings::default().file, "counters.toml");
    }
}

//! Settings parser for .gameshell/config.toml

use std::path::{Path, PathBuf};

use super::types::Settings;
use gameshell_core::prelude::*;

pub const CONFIG_FILENAME: &str = "config.toml";
pub const GAMESHELL_DIR: &str = ".gameshell";

/// Directory holding the settings and counter files for a project
pub fn gameshell_dir(project_path: &Path) -> PathBuf {
    project_path.join(GAMESHELL_DIR)
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Load settings from .gameshell/config.toml
///
/// Returns default settings if the file doesn't exist, can't be parsed, or
/// fails validation.
pub fn load_settings(project_path: &Path) -> Settings {
    let config_path = gameshell_dir(project_path).join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    let settings: Settings = match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                return Settings::default();
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            return Settings::default();
        }
    };

    if let Err(e) = settings.bridge.validate() {
        warn!("Ignoring {:?}: {}", config_path, e);
        return Settings::default();
    }

    debug!("Loaded settings from {:?}", config_path);
    settings
}

/// Create a commented default config in .gameshell/
pub fn init_config_dir(project_path: &Path) -> Result<()> {
    let dir = gameshell_dir(project_path);

    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::config(format!("Failed to create .gameshell dir: {}", e)))?;
    }

    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        std::fs::write(&config_path, generate_default_config())
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created {:?}", config_path);
    }

    Ok(())
}

/// Save settings to .gameshell/config.toml
///
/// Uses atomic write (temp file + rename).
pub fn save_settings(project_path: &Path, settings: &Settings) -> Result<()> {
    settings.bridge.validate()?;

    let dir = gameshell_dir(project_path);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::config(format!("Failed to create .gameshell dir: {}", e)))?;
    }

    let config_path = dir.join(CONFIG_FILENAME);
    let temp_path = dir.join(".config.toml.tmp");

    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;
    let full_content = format!("{}{}", generate_config_header(), content);

    std::fs::write(&temp_path, &full_content)
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;
    std::fs::rename(&temp_path, &config_path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    info!("Saved settings to {:?}", config_path);
    Ok(())
}

fn generate_config_header() -> String {
    "# Game Shell Engine Bridge Configuration\n\n".to_string()
}

fn generate_default_config() -> String {
    r#"# Game Shell Engine Bridge Configuration

[bridge]
default_scene = "PlaceholderScene"
bootstrap_timeout_ms = 10000   # Wait this long for READY before failing
queue_capacity = 50            # Oldest command is dropped beyond this
command_ttl_ms = 30000         # Queued commands older than this are discarded
focus_grace_ms = 5000          # Teardown delay after the screen loses focus
render_mode = "texture"        # "texture" or "surface"

[quality]
low_fps_threshold = 28.0
medium_fps_threshold = 45.0
adaptive = true                # Follow PERF_METRIC / FPS_UPDATE reports

[counters]
file = "counters.toml"
"#
    .to_string()
}

//! Configuration file parsing for the engine bridge
//!
//! Supports:
//! - `.gameshell/config.toml` - Bridge, quality, and counter settings

pub mod settings;
pub mod types;

pub use settings::{
    gameshell_dir, init_config_dir, load_settings, save_settings, CONFIG_FILENAME, GAMESHELL_DIR,
};
pub use types::*;

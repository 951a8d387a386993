//! Game shell bridge driver
//!
//! Hosts the headless runner that drives an engine bridge from the command
//! line. The bridge itself lives in the workspace crates.

pub mod headless;

pub use headless::runner::{run_headless, EngineChoice, HeadlessOptions, ScriptedCommand};

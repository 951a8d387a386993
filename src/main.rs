//! Game shell bridge - headless driver
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use gameshell::{run_headless, EngineChoice, HeadlessOptions, ScriptedCommand};
use gameshell_app::config::init_config_dir;

/// Game shell bridge - drive the native engine bridge without a host UI
#[derive(Parser, Debug)]
#[command(name = "gameshell")]
#[command(
    about = "Drive the game shell engine bridge and report events as JSON",
    long_about = None
)]
struct Args {
    /// Project directory holding .gameshell/config.toml
    #[arg(long, value_name = "PATH")]
    project: Option<PathBuf>,

    /// Scene to bootstrap instead of the configured default
    #[arg(long)]
    scene: Option<String>,

    /// Command to send before bootstrap, as NAME or NAME={json}. Repeatable.
    #[arg(long = "command", value_name = "NAME[=JSON]")]
    commands: Vec<ScriptedCommand>,

    /// Engine host to attach to
    #[arg(long, value_enum, default_value_t = EngineChoice::Auto)]
    engine: EngineChoice,

    /// Lose and regain focus once the engine is ready
    #[arg(long)]
    focus_cycle: bool,

    /// Write a default .gameshell/config.toml and exit
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let project_path = args
        .project
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if args.init {
        init_config_dir(&project_path)?;
        eprintln!("Wrote default config under {}", project_path.display());
        return Ok(());
    }

    gameshell_core::logging::init()?;

    let options = HeadlessOptions {
        scene: args.scene,
        commands: args.commands,
        engine: args.engine,
        focus_cycle: args.focus_cycle,
    };
    run_headless(&project_path, options).await?;
    Ok(())
}

//! # gameshell-app - Bridge Orchestration
//!
//! The engine bridge proper: session state machine, command queue, async
//! runtime, lifecycle coordination with screen focus, the engine view
//! adapter, and the small collaborators around it.
//!
//! ## Public API
//!
//! ### Bridge
//! - [`EngineBridge`] - Cloneable handle: bootstrap, commands, observation
//! - [`BridgeSnapshot`] - Observable state published on every change
//! - [`Dispatch`] - What happened to a command (sent, queued, skipped, rejected)
//!
//! ### State
//! - [`BridgeSession`] - Synchronous state machine behind the bridge
//! - [`CommandQueue`] - Bounded FIFO with flush-time staleness checks
//! - [`LifecycleCoordinator`] - Focus transitions to bridge actions
//!
//! ### Collaborators
//! - [`EngineView`] - Native surface or placeholder, with attach/detach hooks
//! - [`EffectsGovernor`] - Frame-rate reports to effects quality tiers
//! - [`Counters`] - Persistent point/currency counters
//! - [`config`] - `.gameshell/config.toml` settings

pub mod bridge;
pub mod config;
pub mod counters;
pub mod lifecycle;
pub mod quality;
pub mod queue;
pub mod session;
pub mod view;

pub use bridge::{EngineBridge, WeakBridge};
pub use config::{load_settings, BridgeSettings, QualitySettings, Settings};
pub use counters::{CounterStore, Counters, TomlCounterStore, FATE_ORE, FATE_POINTS};
pub use lifecycle::{LifecycleAction, LifecycleCoordinator, ScreenEvent};
pub use quality::EffectsGovernor;
pub use queue::{CommandQueue, PendingCommand};
pub use session::{BootstrapOutcome, BridgeSession, BridgeSnapshot, Dispatch, ViewPresence};
pub use view::{EngineView, PlaceholderStyle, Surface, SurfaceLayout, ViewObserver};

//! # gameshell-engine - Native Engine Boundary
//!
//! Everything on the far side of the bridge: the [`EngineHost`] trait that
//! attaches to an embedded engine, the JSON frame codec, typed commands, and
//! process-wide availability detection.
//!
//! Depends on [`gameshell_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Hosts
//! - [`EngineHost`] - Attach to an engine and get an [`EngineChannel`]
//! - [`PlatformEngineHost`] - Host chosen from [`engine_availability()`]
//! - [`LoopbackEngineHost`] - In-process simulated engine
//! - [`UnavailableEngineHost`] - Always fails with `EngineUnavailable`
//!
//! ### Commands and Frames
//! - [`EngineCommand`] - Typed commands, reserved and pass-through
//! - [`handshake()`] - Frames sent right after attach
//! - [`parse_engine_message()`] - Normalize an inbound event frame

pub mod availability;
pub mod commands;
pub mod host;
pub mod loopback;
pub mod protocol;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use availability::{engine_availability, EngineAvailability, ENGINE_ENV};
pub use commands::{handshake, EffectsQuality, EngineCommand, RenderMode};
pub use host::{
    EngineChannel, EngineHost, EngineSender, HostEndpoint, LocalEngineHost, PlatformEngineHost,
    UnavailableEngineHost,
};
pub use loopback::LoopbackEngineHost;
pub use protocol::{encode_command, encode_event, parse_command_frame, parse_engine_message};

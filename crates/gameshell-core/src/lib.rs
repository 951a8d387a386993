//! # gameshell-core - Core Domain Types
//!
//! Foundation crate for the game shell engine bridge. Provides domain types,
//! wire frame definitions, error handling, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`BridgeStatus`] - Lifecycle of the engine connection (idle, booting, ready, error)
//! - [`BridgeFault`] - Bridge fault taxonomy with UI visibility classification
//! - [`InboundEvent`] - Latest event received from the engine host
//! - [`Payload`] - Key/value data carried by commands and events
//!
//! ### Wire Frames (`events`)
//! - [`OutboundMessage`] - `{command, args}` frame sent to the engine
//! - [`InboundMessage`] - `{event, data}` frame received from the engine
//! - [`events::command`], [`events::event`] - Reserved names
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use gameshell_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all game shell crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use events::{InboundMessage, OutboundMessage};
pub use types::{BridgeFault, BridgeStatus, InboundEvent, Payload, DEFAULT_SCENE};

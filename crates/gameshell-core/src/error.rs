//! Application error types with rich context

use thiserror::Error;

use crate::types::BridgeFault;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    #[error("Engine protocol error: {message}")]
    Protocol { message: String },

    // ─────────────────────────────────────────────────────────────
    // Engine Bridge Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Engine bridge: {0}")]
    Bridge(#[from] BridgeFault),

    #[error("Bridge session was torn down before the engine became ready")]
    TornDown,

    // ─────────────────────────────────────────────────────────────
    // Counter Storage Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Counter storage error: {message}")]
    Storage { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Shorthand for [`BridgeFault::EngineUnavailable`] wrapped as an error.
    pub fn engine_unavailable(reason: impl Into<String>) -> Self {
        Self::Bridge(BridgeFault::EngineUnavailable {
            reason: reason.into(),
        })
    }

    /// The bridge fault carried by this error, if any.
    pub fn bridge_fault(&self) -> Option<&BridgeFault> {
        match self {
            Error::Bridge(fault) => Some(fault),
            _ => None,
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Every bridge outcome is recoverable: the worst case is a visibly
    /// non-functional engine surface with a retry affordance.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Bridge(_)
                | Error::TornDown
                | Error::Protocol { .. }
                | Error::ChannelClosed
                | Error::Storage { .. }
        )
    }

    /// Check if this error should trigger application exit
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ConfigInvalid { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display_messages() {
        let err = Error::config("bad value");
        assert_eq!(err.to_string(), "Configuration error: bad value");

        let err = Error::TornDown;
        assert!(err.to_string().contains("torn down"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_bridge_fault() {
        let err: Error = BridgeFault::BootstrapTimeout {
            timeout: Duration::from_secs(10),
        }
        .into();
        assert_eq!(
            err.bridge_fault().map(BridgeFault::code),
            Some("BootstrapTimeout")
        );
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn test_bridge_errors_are_never_fatal() {
        assert!(!Error::engine_unavailable("no native view").is_fatal());
        assert!(!Error::TornDown.is_fatal());
        assert!(!Error::Bridge(BridgeFault::ChannelDisconnected).is_fatal());
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::engine_unavailable("x").is_recoverable());
        assert!(Error::TornDown.is_recoverable());
        assert!(Error::protocol("parse error").is_recoverable());
        assert!(!Error::config_invalid("capacity").is_recoverable());
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(Error::config_invalid("queue_capacity must be > 0").is_fatal());
        assert!(!Error::config("missing file").is_fatal());
    }

    #[test]
    fn test_result_ext_preserves_error() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = res.context("writing counters").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}

//! Engine availability detection
//!
//! Availability is fixed for the life of the process: it is computed once on
//! first use and every caller sees the same answer.

use std::sync::LazyLock;

/// Environment variable that disables the embedded engine.
///
/// Any of `off`, `none`, `0`, `false` or `disabled` (case-insensitive) marks
/// the engine unavailable; anything else, or leaving it unset, keeps it on.
pub const ENGINE_ENV: &str = "GAMESHELL_ENGINE";

static AVAILABILITY: LazyLock<EngineAvailability> = LazyLock::new(|| {
    let availability = EngineAvailability::detect();
    tracing::info!("Engine availability: {}", availability);
    availability
});

/// Whether a native engine can be attached in this process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineAvailability {
    Available,
    Unavailable { reason: String },
}

impl EngineAvailability {
    /// Check the environment. Prefer [`engine_availability()`], which caches.
    pub fn detect() -> Self {
        Self::from_env_value(std::env::var(ENGINE_ENV).ok().as_deref())
    }

    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "off" | "none" | "0" | "false" | "disabled") => {
                EngineAvailability::Unavailable {
                    reason: format!("engine disabled by {}={}", ENGINE_ENV, v),
                }
            }
            _ => EngineAvailability::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, EngineAvailability::Available)
    }
}

impl std::fmt::Display for EngineAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineAvailability::Available => f.write_str("available"),
            EngineAvailability::Unavailable { reason } => write!(f, "unavailable ({})", reason),
        }
    }
}

/// Process-wide engine availability, computed on first call
pub fn engine_availability() -> &'static EngineAvailability {
    &AVAILABILITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_unset_is_available() {
        assert_eq!(
            EngineAvailability::from_env_value(None),
            EngineAvailability::Available
        );
    }

    #[test]
    fn test_disable_values() {
        for value in ["off", "NONE", " 0 ", "false", "Disabled"] {
            let availability = EngineAvailability::from_env_value(Some(value));
            assert!(!availability.is_available(), "{value} should disable");
        }
    }

    #[test]
    fn test_other_values_keep_engine_on() {
        for value in ["loopback", "1", "on", ""] {
            assert!(EngineAvailability::from_env_value(Some(value)).is_available());
        }
    }

    #[test]
    fn test_unavailable_display_names_variable() {
        let availability = EngineAvailability::from_env_value(Some("off"));
        assert!(availability.to_string().contains(ENGINE_ENV));
    }

    #[test]
    #[serial]
    fn test_detect_reads_environment() {
        std::env::set_var(ENGINE_ENV, "off");
        assert!(!EngineAvailability::detect().is_available());

        std::env::remove_var(ENGINE_ENV);
        assert!(EngineAvailability::detect().is_available());
    }

    #[test]
    #[serial]
    fn test_cached_value_is_stable() {
        let first = engine_availability();
        let second = engine_availability();
        assert!(std::ptr::eq(first, second));
    }
}

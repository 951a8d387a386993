//! Frame-rate driven effects quality

use gameshell_core::events::event;
use gameshell_core::InboundEvent;
use gameshell_engine::EffectsQuality;

use crate::config::QualitySettings;

/// Maps engine frame-rate reports to an [`EffectsQuality`] tier.
///
/// Reports come from `PERF_METRIC` or `FPS_UPDATE` events, reading `fps` and
/// falling back to `value`. A tier is only emitted when it changes.
#[derive(Debug, Clone)]
pub struct EffectsGovernor {
    low_below: f64,
    medium_below: f64,
    current: Option<EffectsQuality>,
}

impl EffectsGovernor {
    pub fn new(low_below: f64, medium_below: f64) -> Self {
        Self {
            low_below,
            medium_below,
            current: None,
        }
    }

    pub fn from_settings(settings: &QualitySettings) -> Self {
        Self::new(settings.low_fps_threshold, settings.medium_fps_threshold)
    }

    pub fn tier_for(&self, fps: f64) -> EffectsQuality {
        if fps < self.low_below {
            EffectsQuality::Low
        } else if fps < self.medium_below {
            EffectsQuality::Medium
        } else {
            EffectsQuality::High
        }
    }

    /// Returns the new tier if this event changes it
    pub fn observe(&mut self, inbound: &InboundEvent) -> Option<EffectsQuality> {
        if inbound.name != event::PERF_METRIC && inbound.name != event::FPS_UPDATE {
            return None;
        }
        let fps = inbound
            .f64_field("fps")
            .or_else(|| inbound.f64_field("value"))
            .filter(|fps| fps.is_finite() && *fps >= 0.0)?;

        let tier = self.tier_for(fps);
        if self.current == Some(tier) {
            return None;
        }
        self.current = Some(tier);
        Some(tier)
    }

    pub fn current(&self) -> Option<EffectsQuality> {
        self.current
    }

    /// Record a tier chosen explicitly by the application
    pub fn set_current(&mut self, quality: EffectsQuality) {
        self.current = Some(quality);
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

impl Default for EffectsGovernor {
    fn default() -> Self {
        Self::from_settings(&QualitySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn perf(name: &str, data: serde_json::Value) -> InboundEvent {
        InboundEvent::new(name, data.as_object().cloned())
    }

    #[test]
    fn test_tiers() {
        let governor = EffectsGovernor::default();
        assert_eq!(governor.tier_for(20.0), EffectsQuality::Low);
        assert_eq!(governor.tier_for(28.0), EffectsQuality::Medium);
        assert_eq!(governor.tier_for(44.9), EffectsQuality::Medium);
        assert_eq!(governor.tier_for(45.0), EffectsQuality::High);
    }

    #[test]
    fn test_emits_only_on_change() {
        let mut governor = EffectsGovernor::default();
        assert_eq!(
            governor.observe(&perf("PERF_METRIC", json!({ "fps": 60 }))),
            Some(EffectsQuality::High)
        );
        assert_eq!(governor.observe(&perf("PERF_METRIC", json!({ "fps": 58 }))), None);
        assert_eq!(
            governor.observe(&perf("FPS_UPDATE", json!({ "value": 24 }))),
            Some(EffectsQuality::Low)
        );
        assert_eq!(governor.current(), Some(EffectsQuality::Low));
    }

    #[test]
    fn test_ignores_other_events_and_bad_values() {
        let mut governor = EffectsGovernor::default();
        assert_eq!(governor.observe(&perf("COMBAT_STARTED", json!({ "fps": 10 }))), None);
        assert_eq!(governor.observe(&perf("PERF_METRIC", json!({ "fps": "fast" }))), None);
        assert_eq!(governor.observe(&perf("PERF_METRIC", json!({ "fps": -1 }))), None);
        assert_eq!(governor.observe(&InboundEvent::new("PERF_METRIC", None)), None);
    }

    #[test]
    fn test_explicit_tier_suppresses_duplicate() {
        let mut governor = EffectsGovernor::default();
        governor.set_current(EffectsQuality::Medium);
        assert_eq!(governor.observe(&perf("PERF_METRIC", json!({ "fps": 30 }))), None);

        governor.reset();
        assert_eq!(
            governor.observe(&perf("PERF_METRIC", json!({ "fps": 30 }))),
            Some(EffectsQuality::Medium)
        );
    }
}

//! Performance governor
//!
//! Device capability is assessed exactly once, at startup, and turned into a
//! fixed set of per-frame budgets. Detection (browser APIs) lives in
//! `platform`; this module only maps signals to a config so it can be tested
//! with injected values.

use crate::consts::{BASE_BALLOON_RADIUS, REFERENCE_FRAME_MS};
pub use crate::settings::QualityPreset;

/// Network quality as reported by `navigator.connection.effectiveType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionQuality {
    Slow2g,
    TwoG,
    ThreeG,
    FourG,
}

impl ConnectionQuality {
    pub fn from_effective_type(s: &str) -> Option<Self> {
        match s {
            "slow-2g" => Some(ConnectionQuality::Slow2g),
            "2g" => Some(ConnectionQuality::TwoG),
            "3g" => Some(ConnectionQuality::ThreeG),
            "4g" => Some(ConnectionQuality::FourG),
            _ => None,
        }
    }

    /// 2G-class links usually ride along with weak hardware
    pub fn is_slow(&self) -> bool {
        matches!(self, ConnectionQuality::Slow2g | ConnectionQuality::TwoG)
    }
}

/// Coarse device signals gathered once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSignals {
    /// Touch-capable / coarse pointer
    pub touch: bool,
    /// `navigator.hardwareConcurrency`, if reported
    pub logical_cores: Option<u32>,
    /// Network quality, if the browser exposes it
    pub connection: Option<ConnectionQuality>,
    /// Display pixel density
    pub device_pixel_ratio: f32,
}

impl Default for DeviceSignals {
    /// Desktop-class device with nothing unusual reported
    fn default() -> Self {
        Self {
            touch: false,
            logical_cores: None,
            connection: None,
            device_pixel_ratio: 1.0,
        }
    }
}

/// Fixed budgets for the whole session
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceConfig {
    pub preset: QualityPreset,
    /// Minimum time between simulated frames
    pub frame_interval_ms: f64,
    /// Balloons integrated per tick (round-robin)
    pub balloon_batch_size: usize,
    /// Fragments integrated per tick (newest first)
    pub fragment_update_budget: usize,
    /// Hard cap on live fragments
    pub max_fragments: usize,
    /// Burst size per pop
    pub fragments_per_pop: usize,
    /// Ticks between grid rebuild + collision pass
    pub grid_rebuild_interval: u32,
    /// Spatial grid cell edge (CSS px)
    pub cell_size: f32,
}

impl PerformanceConfig {
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            preset,
            frame_interval_ms: preset.frame_interval_ms(),
            balloon_batch_size: preset.balloon_batch_size(),
            fragment_update_budget: preset.fragment_update_budget(),
            max_fragments: preset.max_fragments(),
            fragments_per_pop: preset.fragments_per_pop(),
            grid_rebuild_interval: preset.grid_rebuild_interval(),
            // Covers a full-size balloon diameter
            cell_size: BASE_BALLOON_RADIUS * 2.5,
        }
    }

    /// Per-tick time scale so motion speed does not depend on frame rate
    pub fn time_scale(&self) -> f32 {
        (self.frame_interval_ms / REFERENCE_FRAME_MS) as f32
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self::from_preset(QualityPreset::default())
    }
}

/// Pick a quality tier from device signals
pub fn classify(signals: &DeviceSignals) -> QualityPreset {
    let cores = signals.logical_cores.unwrap_or(4);
    let slow_link = signals.connection.is_some_and(|c| c.is_slow());

    if slow_link || cores <= 2 || (signals.touch && cores <= 4) {
        QualityPreset::Low
    } else if signals.touch || cores <= 4 {
        QualityPreset::Medium
    } else {
        QualityPreset::High
    }
}

/// Derive the session's performance budgets from device signals
pub fn derive_config(signals: &DeviceSignals) -> PerformanceConfig {
    let preset = classify(signals);
    log::info!(
        "Device signals: touch={} cores={:?} connection={:?} dpr={:.2} -> {} quality",
        signals.touch,
        signals.logical_cores,
        signals.connection,
        signals.device_pixel_ratio,
        preset.as_str()
    );
    PerformanceConfig::from_preset(preset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(touch: bool, cores: Option<u32>, connection: Option<ConnectionQuality>) -> DeviceSignals {
        DeviceSignals {
            touch,
            logical_cores: cores,
            connection,
            device_pixel_ratio: 2.0,
        }
    }

    #[test]
    fn test_desktop_gets_high() {
        let config = derive_config(&signals(false, Some(8), Some(ConnectionQuality::FourG)));
        assert_eq!(config.preset, QualityPreset::High);
        assert!((config.frame_interval_ms - 1000.0 / 60.0).abs() < 1e-9);
        assert!((config.time_scale() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_low_end_phone_gets_low() {
        assert_eq!(classify(&signals(true, Some(4), None)), QualityPreset::Low);
        assert_eq!(classify(&signals(false, Some(2), None)), QualityPreset::Low);
        assert_eq!(
            classify(&signals(false, Some(16), Some(ConnectionQuality::Slow2g))),
            QualityPreset::Low
        );
    }

    #[test]
    fn test_middle_tier() {
        assert_eq!(classify(&signals(true, Some(8), None)), QualityPreset::Medium);
        assert_eq!(classify(&signals(false, Some(4), None)), QualityPreset::Medium);
        // Unknown core count is treated as a 4-core machine
        assert_eq!(classify(&signals(false, None, None)), QualityPreset::Medium);
    }

    #[test]
    fn test_low_tier_runs_slower_ticks() {
        let config = PerformanceConfig::from_preset(QualityPreset::Low);
        assert!((config.time_scale() - 2.0).abs() < 1e-5);
        assert!(config.fragment_update_budget < config.max_fragments);
    }

    #[test]
    fn test_effective_type_parsing() {
        assert_eq!(
            ConnectionQuality::from_effective_type("3g"),
            Some(ConnectionQuality::ThreeG)
        );
        assert_eq!(ConnectionQuality::from_effective_type("5g"), None);
    }
}

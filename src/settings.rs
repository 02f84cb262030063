//! Player preferences and quality presets
//!
//! Persisted in LocalStorage, separate from anything the simulation owns.

use serde::{Deserialize, Serialize};

use crate::governor::PerformanceConfig;

/// Quality tiers, picked by the governor or pinned by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Target frame interval in milliseconds
    pub fn frame_interval_ms(&self) -> f64 {
        match self {
            QualityPreset::Low => 1000.0 / 30.0,
            QualityPreset::Medium => 1000.0 / 45.0,
            QualityPreset::High => 1000.0 / 60.0,
        }
    }

    /// Balloons integrated per tick
    pub fn balloon_batch_size(&self) -> usize {
        match self {
            QualityPreset::Low => 6,
            QualityPreset::Medium => 12,
            QualityPreset::High => 32,
        }
    }

    /// Fragments whose kinematics are integrated per tick
    pub fn fragment_update_budget(&self) -> usize {
        match self {
            QualityPreset::Low => 40,
            QualityPreset::Medium => 80,
            QualityPreset::High => 200,
        }
    }

    /// Maximum fragments alive at once
    pub fn max_fragments(&self) -> usize {
        match self {
            QualityPreset::Low => 60,
            QualityPreset::Medium => 120,
            QualityPreset::High => 300,
        }
    }

    /// Fragments spawned per pop
    pub fn fragments_per_pop(&self) -> usize {
        match self {
            QualityPreset::Low => 6,
            QualityPreset::Medium => 8,
            QualityPreset::High => 12,
        }
    }

    /// Ticks between spatial grid rebuilds (and collision passes)
    pub fn grid_rebuild_interval(&self) -> u32 {
        match self {
            QualityPreset::Low => 4,
            QualityPreset::Medium => 3,
            QualityPreset::High => 2,
        }
    }
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pin a quality preset instead of trusting device detection
    pub quality_override: Option<QualityPreset>,
    /// Pause the frame loop while the tab is hidden
    pub pause_when_hidden: bool,
    /// Freeze bob/sway/rotation/pulse animations
    pub reduced_motion: bool,
    /// Pop fragments on/off
    pub fragments: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality_override: None,
            pause_when_hidden: true,
            reduced_motion: false,
            fragments: true,
        }
    }
}

impl Settings {
    /// Fold preferences into a derived config
    pub fn apply(&self, mut config: PerformanceConfig) -> PerformanceConfig {
        if let Some(preset) = self.quality_override {
            if preset != config.preset {
                log::info!(
                    "Quality override: {} -> {}",
                    config.preset.as_str(),
                    preset.as_str()
                );
                config = PerformanceConfig::from_preset(preset);
            }
        }
        if !self.fragments {
            config.max_fragments = 0;
            config.fragments_per_pop = 0;
        }
        config
    }

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "balloon_field_settings";

    /// Read persisted preferences, falling back to defaults
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring corrupt settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Persist preferences as JSON
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native builds keep no settings between runs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        log::debug!("Settings not persisted on native");
    }
}

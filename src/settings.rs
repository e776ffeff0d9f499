//! Viewer settings and preferences
//!
//! Persisted as JSON in LocalStorage on the web build.

use serde::{Deserialize, Serialize};

/// Quality preset levels
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

    /// Particle population multiplier for this preset
    pub fn density_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.45,
            QualityPreset::Medium => 1.0,
            QualityPreset::High => 1.3,
        }
    }

    /// Whether the software pass scatters glitter along the helix
    pub fn glitter_enabled(&self) -> bool {
        match self {
            QualityPreset::Low => false,
            QualityPreset::Medium => true,
            QualityPreset::High => true,
        }
    }
}

/// Which particle renderer to try first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BackendPreference {
    /// WebGPU when the adapter comes up, software otherwise
    #[default]
    Auto,
    /// Skip the GPU probe entirely
    Software,
}

impl BackendPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendPreference::Auto => "Auto",
            BackendPreference::Software => "Software",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(BackendPreference::Auto),
            "software" | "cpu" => Some(BackendPreference::Software),
            _ => None,
        }
    }
}

/// Viewer settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Visual quality preset
    pub quality: QualityPreset,
    /// Particle renderer selection
    pub backend: BackendPreference,
    /// Glitter speckles along the helix (software pass)
    pub glitter: bool,
    /// Ambient music volume (0.0 - 1.0)
    pub music_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            backend: BackendPreference::Auto,
            glitter: true,
            music_volume: 0.5,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.quality = preset;
        settings.glitter = preset.glitter_enabled();
        settings
    }

    /// Particle population multiplier
    pub fn density_scale(&self) -> f32 {
        self.quality.density_scale()
    }

    /// Effective glitter flag (the preset can force it off)
    pub fn effective_glitter(&self) -> bool {
        self.glitter && self.quality.glitter_enabled()
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "glowspire_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
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

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let mut settings = Settings::from_preset(QualityPreset::High);
        settings.backend = BackendPreference::Software;
        settings.music_volume = 0.25;

        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.quality, QualityPreset::High);
        assert_eq!(back.backend, BackendPreference::Software);
        assert!(back.glitter);
        assert!((back.music_volume - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!(QualityPreset::from_str("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("HIGH"), Some(QualityPreset::High));
        assert_eq!(QualityPreset::from_str("ultra"), None);
        assert_eq!(
            BackendPreference::from_str("cpu"),
            Some(BackendPreference::Software)
        );
    }

    #[test]
    fn test_low_preset_forces_glitter_off() {
        let mut settings = Settings::from_preset(QualityPreset::Low);
        assert!(!settings.effective_glitter());
        // Even with the flag forced back on, Low keeps it off
        settings.glitter = true;
        assert!(!settings.effective_glitter());
    }
}

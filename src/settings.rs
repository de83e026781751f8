//! Player preferences
//!
//! Persisted separately from the session record, through the same storage.

use serde::{Deserialize, Serialize};

use crate::persistence::Storage;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

/// Unrecognised quality preset name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPreset(pub String);

impl std::fmt::Display for UnknownPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown quality preset '{}' (expected low, medium or high)", self.0)
    }
}

impl std::error::Error for UnknownPreset {}

impl std::str::FromStr for QualityPreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(QualityPreset::Low),
            "medium" => Ok(QualityPreset::Medium),
            "high" => Ok(QualityPreset::High),
            _ => Err(UnknownPreset(s.to_string())),
        }
    }
}

impl std::fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
        };
        f.write_str(name)
    }
}

impl QualityPreset {
    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 500,
            QualityPreset::High => 2000,
        }
    }
}

/// Presentation preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Record ball trails
    pub trails: bool,
    /// Win-burst particles
    pub particles: bool,
    /// Payout and reward popups
    pub popups: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            trails: true,
            particles: true,
            popups: true,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Storage key
    pub const STORAGE_KEY: &'static str = "plinko_settings";

    /// Load settings, falling back to defaults on any failure
    pub fn load(storage: &impl Storage) -> Self {
        match storage.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring malformed settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Could not read settings: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings; failures are logged
    pub fn save(&self, storage: &mut impl Storage) {
        let result = serde_json::to_string(self)
            .map_err(Into::into)
            .and_then(|json| storage.set(Self::STORAGE_KEY, &json));
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Could not save settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_quality_flag_values() {
        assert_eq!(" High ".parse::<QualityPreset>(), Ok(QualityPreset::High));
        assert_eq!("low".parse::<QualityPreset>(), Ok(QualityPreset::Low));
        assert_eq!(
            "ultra".parse::<QualityPreset>(),
            Err(UnknownPreset("ultra".into()))
        );
        for preset in [QualityPreset::Low, QualityPreset::Medium, QualityPreset::High] {
            assert_eq!(preset.to_string().parse::<QualityPreset>(), Ok(preset));
        }
    }

    #[test]
    fn test_particles_toggle_zeroes_budget() {
        let mut settings = Settings::from_preset(QualityPreset::High);
        assert_eq!(settings.max_particles(), 2000);
        settings.particles = false;
        assert_eq!(settings.max_particles(), 0);
    }

    #[test]
    fn test_save_then_load() {
        let mut storage = MemoryStorage::new();
        let settings = Settings {
            quality: QualityPreset::Low,
            trails: false,
            ..Settings::default()
        };
        settings.save(&mut storage);
        assert_eq!(Settings::load(&storage), settings);
    }

    #[test]
    fn test_malformed_falls_back() {
        let mut storage = MemoryStorage::new();
        storage.set(Settings::STORAGE_KEY, "{{{").unwrap();
        assert_eq!(Settings::load(&storage), Settings::default());
    }
}

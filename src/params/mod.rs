//! Parameter definitions with units and documented semantics.
//!
//! Every tuned constant lives here so it can be overridden from a TOML
//! file. Missing keys fall back to the defaults below.

mod audio;
mod music;
mod organism;
mod render;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// Re-export all types
pub use audio::{audio_constants, FFTConfig};
pub use music::MusicParams;
pub use organism::{GrowthParams, PhysiologyParams};
pub use render::{RecordingConfig, RenderConfig};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "bloomsynth.toml";

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fft: FFTConfig,
    pub physiology: PhysiologyParams,
    pub growth: GrowthParams,
    pub render: RenderConfig,
    pub music: MusicParams,
}

impl EngineConfig {
    /// Load from a TOML file; fall back to defaults on any error.
    pub fn load(path: Option<&Path>) -> Self {
        let p = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let text = match fs::read_to_string(p) {
            Ok(text) => text,
            Err(_) => {
                log::debug!("no config at {}, using defaults", p.display());
                return Self::default();
            }
        };
        match Self::from_toml(&text) {
            Ok(config) => {
                log::info!("loaded config from {}", p.display());
                config.checked()
            }
            Err(e) => {
                log::warn!("ignoring malformed config {}: {}", p.display(), e);
                Self::default()
            }
        }
    }

    /// Replace an unusable analysis section with defaults
    fn checked(mut self) -> Self {
        if let Err(e) = self.fft.validate() {
            log::warn!("ignoring [fft] section: {}", e);
            self.fft = FFTConfig::default();
        }
        self
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [physiology]
            stress_threshold = 90.0

            [fft]
            input_gain = 2.5
            "#,
        )
        .unwrap();

        assert_eq!(config.physiology.stress_threshold, 90.0);
        assert_eq!(config.physiology.stress_increment, 0.04);
        assert_eq!(config.fft.input_gain, 2.5);
        assert_eq!(config.fft.fft_size, 512);
        assert_eq!(config.music.bass_cap, 0.35);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = EngineConfig::load(Some(Path::new("/nonexistent/bloomsynth.toml")));
        assert_eq!(config.render.canvas_width, 1280);
    }

    #[test]
    fn test_invalid_fft_section_falls_back() {
        let path = std::env::temp_dir().join(format!("bloomsynth_cfg_{}.toml", std::process::id()));
        fs::write(
            &path,
            "[fft]\nmin_db = -20.0\nmax_db = -60.0\n\n[physiology]\nstress_threshold = 90.0\n",
        )
        .unwrap();
        let config = EngineConfig::load(Some(&path));
        let _ = fs::remove_file(&path);

        assert_eq!(config.fft.min_db, -100.0);
        assert_eq!(config.fft.max_db, -30.0);
        // Other sections survive
        assert_eq!(config.physiology.stress_threshold, 90.0);
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let text = EngineConfig::default().to_toml().unwrap();
        let back = EngineConfig::from_toml(&text).unwrap();
        assert_eq!(back.growth.rate, 0.4);
    }
}

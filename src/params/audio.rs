//! Audio analysis configuration and constants.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// FFT analysis configuration with the three-band partition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FFTConfig {
    /// Nominal sample rate for sources that do not report one (Hz)
    pub sample_rate_hz: usize,

    /// FFT window size (must be power of 2)
    /// 512 = 256 usable magnitude bins, ~11.6ms @ 44.1kHz
    pub fft_size: usize,

    /// Gain applied to live capture before analysis (dimensionless)
    /// 5.0 lets quiet laptop microphones still register strongly
    pub input_gain: f32,

    /// Magnitude mapped to byte 0 (dBFS)
    pub min_db: f32,

    /// Magnitude mapped to byte 255 (dBFS)
    pub max_db: f32,

    /// File playback pacing (milliseconds of audio pushed per pump step)
    /// 20 = 50 Hz, comfortably above the visual tick rate
    pub update_interval_ms: u64,

    /// Capacity of the sample block channel between producer and extractor
    pub channel_blocks: usize,
}

impl Default for FFTConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 512,
            input_gain: 5.0,
            min_db: -100.0,
            max_db: -30.0,
            update_interval_ms: 20,
            channel_blocks: 64,
        }
    }
}

impl FFTConfig {
    /// Number of magnitude bins produced per frame
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Split `len` bins into three equal contiguous bands (bass, mid, treble).
    /// The treble band absorbs the remainder.
    pub fn band_bins(len: usize) -> [Range<usize>; 3] {
        let third = len / 3;
        [0..third, third..third * 2, third * 2..len]
    }

    /// Samples per pump step at the given rate
    pub fn pump_block_len(&self, sample_rate_hz: u32) -> usize {
        ((sample_rate_hz as u64 * self.update_interval_ms) / 1000).max(1) as usize
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 8 {
            return Err(format!(
                "FFT size must be a power of 2 >= 8, got {}",
                self.fft_size
            ));
        }
        if self.sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        if self.max_db <= self.min_db {
            return Err(format!(
                "dB range is empty ({} .. {})",
                self.min_db, self.max_db
            ));
        }
        Ok(())
    }
}

/// Audio constants (compile-time)
pub mod audio_constants {
    /// Output limiter ceiling, keeps the mix well away from clipping
    pub const OUTPUT_CEILING: f32 = 0.5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_bins_are_contiguous() {
        let bands = FFTConfig::band_bins(256);
        assert_eq!(bands[0], 0..85);
        assert_eq!(bands[1], 85..170);
        assert_eq!(bands[2], 170..256);
    }

    #[test]
    fn test_band_bins_tiny_spectrum() {
        let bands = FFTConfig::band_bins(2);
        assert!(bands[0].is_empty());
        assert!(bands[1].is_empty());
        assert_eq!(bands[2], 0..2);
    }

    #[test]
    fn test_validate_rejects_odd_fft() {
        let config = FFTConfig {
            fft_size: 500,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(FFTConfig::default().validate().is_ok());
    }
}

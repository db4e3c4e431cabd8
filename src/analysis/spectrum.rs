//! Windowed FFT and the byte-scaled magnitude spectrum.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::FeatureFrame;
use crate::params::FFTConfig;

/// Reusable FFT plan plus scratch buffers for one window size
pub struct SpectrumAnalyzer {
    config: FFTConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new(config: FFTConfig) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let window = (0..config.fft_size)
            .map(|i| hann_window(i, config.fft_size))
            .collect();
        let buffer = vec![Complex::new(0.0, 0.0); config.fft_size];

        Self {
            config,
            fft,
            window,
            buffer,
        }
    }

    /// Analyze the newest `fft_size` samples of `samples`, scaled by `gain`.
    /// Shorter input is zero-padded at the front.
    pub fn analyze(&mut self, samples: &[f32], gain: f32) -> FeatureFrame {
        let n = self.config.fft_size;
        let tail = &samples[samples.len().saturating_sub(n)..];
        let pad = n - tail.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let s = if i < pad { 0.0 } else { tail[i - pad] * gain };
            *slot = Complex::new(s * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let spectrum: Vec<u8> = self.buffer[..self.config.bin_count()]
            .iter()
            .map(|c| self.to_byte(c.norm() / n as f32))
            .collect();

        FeatureFrame::from_spectrum(spectrum)
    }

    /// Map a linear magnitude onto 0..255 over the configured dB range
    fn to_byte(&self, magnitude: f32) -> u8 {
        let db = 20.0 * magnitude.max(1e-12).log10();
        let t = (db - self.config.min_db) / (self.config.max_db - self.config.min_db);
        (t.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

/// One-shot analysis of a block, for offline use.
pub fn analyze_block(samples: &[f32], config: &FFTConfig) -> FeatureFrame {
    SpectrumAnalyzer::new(config.clone()).analyze(samples, 1.0)
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_hz: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq_hz * i as f32 / 44100.0).sin())
            .collect()
    }

    #[test]
    fn test_hann_window() {
        let size = 512;
        assert!(hann_window(0, size).abs() < 0.01);
        assert!(hann_window(size - 1, size).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_silence_is_all_zero() {
        let frame = analyze_block(&[0.0; 512], &FFTConfig::default());
        assert_eq!(frame.spectrum.len(), 256);
        assert!(frame.spectrum.iter().all(|&b| b == 0));
        assert_eq!(frame.volume(), 0.0);
    }

    #[test]
    fn test_low_tone_lands_in_bass_band() {
        let frame = analyze_block(&sine(300.0, 0.8, 512), &FFTConfig::default());
        assert!(frame.bass > frame.mid);
        assert!(frame.bass > frame.treble);
    }

    #[test]
    fn test_high_tone_lands_in_treble_band() {
        let frame = analyze_block(&sine(16000.0, 0.8, 512), &FFTConfig::default());
        assert!(frame.treble > frame.bass);
    }

    #[test]
    fn test_gain_raises_levels() {
        let config = FFTConfig::default();
        let mut analyzer = SpectrumAnalyzer::new(config);
        let quiet = sine(1000.0, 0.01, 512);
        let plain = analyzer.analyze(&quiet, 1.0).volume();
        let boosted = analyzer.analyze(&quiet, 5.0).volume();
        assert!(boosted > plain);
    }

    #[test]
    fn test_short_block_is_padded() {
        let frame = analyze_block(&sine(440.0, 0.5, 100), &FFTConfig::default());
        assert_eq!(frame.spectrum.len(), 256);
    }
}

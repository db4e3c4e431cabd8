//! Signal feature extraction: raw audio to banded energy per tick.

mod source;
mod spectrum;

pub use source::{decode_wav, ActiveSource, Block, Source};
pub use spectrum::{analyze_block, hann_window, SpectrumAnalyzer};

use std::collections::VecDeque;

use crossbeam_channel::TryRecvError;

use crate::error::Result;
use crate::params::FFTConfig;

/// Banded energy for one tick (band means on the 0..255 byte scale)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureFrame {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    /// Raw byte magnitude spectrum
    pub spectrum: Vec<u8>,
}

impl FeatureFrame {
    /// Frame with explicit band levels and no spectrum
    pub fn bands(bass: f32, mid: f32, treble: f32) -> Self {
        Self {
            bass,
            mid,
            treble,
            spectrum: Vec::new(),
        }
    }

    /// Partition a byte spectrum into three equal bands and average each
    pub fn from_spectrum(spectrum: Vec<u8>) -> Self {
        let [bass, mid, treble] = FFTConfig::band_bins(spectrum.len()).map(|r| {
            if r.is_empty() {
                0.0
            } else {
                let len = r.len() as f32;
                spectrum[r].iter().map(|&b| b as f32).sum::<f32>() / len
            }
        });

        Self {
            bass,
            mid,
            treble,
            spectrum,
        }
    }

    /// Mean of the three band levels
    pub fn volume(&self) -> f32 {
        (self.bass + self.mid + self.treble) / 3.0
    }
}

/// Pulls sample blocks from the attached source and analyzes on demand
pub struct FeatureExtractor {
    config: FFTConfig,
    analyzer: SpectrumAnalyzer,
    source: Option<ActiveSource>,
    window: VecDeque<f32>,
    last: FeatureFrame,
}

impl FeatureExtractor {
    pub fn new(config: FFTConfig) -> Self {
        Self {
            analyzer: SpectrumAnalyzer::new(config.clone()),
            window: VecDeque::with_capacity(config.fft_size),
            config,
            source: None,
            last: FeatureFrame::default(),
        }
    }

    /// Replace the current source. On error the previous source stays attached.
    pub fn attach(&mut self, source: Source) -> Result<()> {
        let kind = source.kind();
        let opened = ActiveSource::open(source, &self.config)?;
        self.detach();
        log::info!("Attached {} source @ {}Hz", kind, opened.sample_rate);
        self.source = Some(opened);
        Ok(())
    }

    /// Stop pulling and release the source. Safe to call repeatedly.
    pub fn detach(&mut self) {
        if self.source.take().is_some() {
            log::info!("Detached audio source");
        }
        self.window.clear();
        self.last = FeatureFrame::default();
    }

    pub fn is_attached(&self) -> bool {
        self.source.is_some()
    }

    /// Hold or resume a file source. Paused sources read as silence.
    /// Returns false when nothing pausable is attached.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        let Some(source) = &self.source else {
            return false;
        };
        if !source.set_paused(paused) {
            return false;
        }
        log::info!("Source {}", if paused { "paused" } else { "resumed" });
        if paused {
            self.window.clear();
            self.last = FeatureFrame::default();
        }
        true
    }

    pub fn is_paused(&self) -> bool {
        self.source.as_ref().is_some_and(|s| s.is_paused())
    }

    /// Current frame. All-zero when detached or paused; unchanged when no
    /// new samples arrived since the last call. A source whose producer
    /// went away is detached once its queued blocks are consumed.
    pub fn frame(&mut self) -> FeatureFrame {
        let Some(source) = &self.source else {
            return FeatureFrame::default();
        };
        if source.is_paused() {
            return FeatureFrame::default();
        }

        let mut fresh = false;
        let mut ended = false;
        loop {
            match source.receiver.try_recv() {
                Ok(mut block) => {
                    self.window.extend(block.drain(..));
                    source.recycle(block);
                    fresh = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    ended = true;
                    break;
                }
            }
        }
        if ended && !fresh {
            log::info!("Audio source ended");
            self.detach();
            return FeatureFrame::default();
        }
        if fresh {
            let excess = self.window.len().saturating_sub(self.config.fft_size);
            self.window.drain(..excess);
            let gain = source.gain;
            let samples = self.window.make_contiguous();
            self.last = self.analyzer.analyze(samples, gain);
        }

        self.last.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::f32::consts::PI;

    fn stream_source() -> (crossbeam_channel::Sender<Block>, Source) {
        let (tx, rx) = bounded(8);
        (
            tx,
            Source::stream(rx, 44100),
        )
    }

    fn tone(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 44100.0).sin())
            .collect()
    }

    #[test]
    fn test_unattached_frame_is_zero() {
        let mut extractor = FeatureExtractor::new(FFTConfig::default());
        assert_eq!(extractor.frame(), FeatureFrame::default());
    }

    #[test]
    fn test_stream_frames_and_stale_reuse() {
        let mut extractor = FeatureExtractor::new(FFTConfig::default());
        let (tx, source) = stream_source();
        extractor.attach(source).unwrap();

        tx.send(tone(512)).unwrap();
        let first = extractor.frame();
        assert!(first.volume() > 0.0);

        // Nothing new: the last frame is returned
        assert_eq!(extractor.frame(), first);
    }

    #[test]
    fn test_detach_is_idempotent_and_zeroes() {
        let mut extractor = FeatureExtractor::new(FFTConfig::default());
        let (tx, source) = stream_source();
        extractor.attach(source).unwrap();
        tx.send(tone(512)).unwrap();
        extractor.frame();

        extractor.detach();
        extractor.detach();
        assert!(!extractor.is_attached());
        assert_eq!(extractor.frame().volume(), 0.0);
    }

    #[test]
    fn test_ended_stream_falls_silent_and_detaches() {
        let mut extractor = FeatureExtractor::new(FFTConfig::default());
        let (tx, source) = stream_source();
        extractor.attach(source).unwrap();

        tx.send(tone(512)).unwrap();
        drop(tx);
        // Queued audio is still analyzed
        assert!(extractor.frame().volume() > 0.0);
        assert!(extractor.is_attached());

        assert_eq!(extractor.frame(), FeatureFrame::default());
        assert!(!extractor.is_attached());
    }

    #[test]
    fn test_pause_needs_a_file_source() {
        let mut extractor = FeatureExtractor::new(FFTConfig::default());
        assert!(!extractor.set_paused(true));
        let (_tx, source) = stream_source();
        extractor.attach(source).unwrap();
        assert!(!extractor.set_paused(true));
        assert!(!extractor.is_paused());
    }

    #[test]
    fn test_drained_blocks_are_recycled() {
        let mut extractor = FeatureExtractor::new(FFTConfig::default());
        let (tx, rx) = bounded(4);
        let (recycle_tx, recycle_rx) = bounded(4);
        extractor
            .attach(Source::Stream {
                receiver: rx,
                sample_rate: 44100,
                recycle: Some(recycle_tx),
            })
            .unwrap();

        let block = tone(512);
        let ptr = block.as_ptr();
        tx.send(block).unwrap();
        extractor.frame();

        let back = recycle_rx.try_recv().unwrap();
        assert!(back.is_empty());
        assert_eq!(back.as_ptr(), ptr);
    }

    #[test]
    fn test_failed_attach_keeps_previous_source() {
        let mut extractor = FeatureExtractor::new(FFTConfig::default());
        let (tx, source) = stream_source();
        extractor.attach(source).unwrap();

        let result = extractor.attach(Source::file("/nonexistent/song.wav", false));
        assert!(result.is_err());
        assert!(extractor.is_attached());

        tx.send(tone(512)).unwrap();
        assert!(extractor.frame().volume() > 0.0);
    }

    #[test]
    fn test_from_spectrum_band_means() {
        let mut spectrum = vec![0u8; 9];
        spectrum[..3].fill(90);
        spectrum[6..].fill(30);
        let frame = FeatureFrame::from_spectrum(spectrum);
        assert_eq!(frame.bass, 90.0);
        assert_eq!(frame.mid, 0.0);
        assert_eq!(frame.treble, 30.0);
        assert_eq!(frame.volume(), 40.0);
    }
}

//! Sample producers feeding the feature extractor.
//!
//! Every source ends up as a bounded channel of mono sample blocks. The
//! producer side (cpal callback, file pump thread, music tap) never blocks:
//! blocks are dropped when the extractor falls behind.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::params::FFTConfig;

/// Mono sample block
pub type Block = Vec<f32>;

/// Where analysis samples come from
pub enum Source {
    /// Default capture device, input gain applied
    Microphone,
    /// Decoded WAV file played at real-time rate
    File { path: PathBuf, looped: bool },
    /// Any producer of mono blocks (e.g. the music engine's output tap).
    /// Drained blocks go back through `recycle` when the producer pools them.
    Stream {
        receiver: Receiver<Block>,
        sample_rate: u32,
        recycle: Option<Sender<Block>>,
    },
}

impl Source {
    pub fn file(path: impl Into<PathBuf>, looped: bool) -> Self {
        Source::File {
            path: path.into(),
            looped,
        }
    }

    pub fn stream(receiver: Receiver<Block>, sample_rate: u32) -> Self {
        Source::Stream {
            receiver,
            sample_rate,
            recycle: None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Source::Microphone => "microphone",
            Source::File { .. } => "file",
            Source::Stream { .. } => "stream",
        }
    }
}

/// An opened source. Dropping it releases the device or joins the pump.
pub struct ActiveSource {
    pub receiver: Receiver<Block>,
    pub gain: f32,
    pub sample_rate: u32,
    recycle: Option<Sender<Block>>,
    _stream: Option<cpal::Stream>,
    pump: Option<Pump>,
}

impl ActiveSource {
    pub fn open(source: Source, config: &FFTConfig) -> Result<Self> {
        match source {
            Source::Microphone => open_microphone(config),
            Source::File { path, looped } => open_file(&path, looped, config),
            Source::Stream {
                receiver,
                sample_rate,
                recycle,
            } => Ok(Self {
                receiver,
                gain: 1.0,
                sample_rate,
                recycle,
                _stream: None,
                pump: None,
            }),
        }
    }

    /// Hand a drained block back to a pooling producer
    pub fn recycle(&self, mut block: Block) {
        if let Some(recycle) = &self.recycle {
            block.clear();
            let _ = recycle.try_send(block);
        }
    }

    /// Hold or resume a file pump. Returns false for sources that cannot pause.
    pub fn set_paused(&self, paused: bool) -> bool {
        match &self.pump {
            Some(pump) => {
                pump.paused.store(paused, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pump
            .as_ref()
            .is_some_and(|p| p.paused.load(Ordering::Relaxed))
    }
}

fn open_microphone(config: &FFTConfig) -> Result<ActiveSource> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| EngineError::DeviceUnavailable("no audio input device found".into()))?;

    let supported = device
        .default_input_config()
        .map_err(|e| EngineError::DeviceUnavailable(format!("input config: {}", e)))?;

    log::info!(
        "Input: {} @ {}Hz",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        supported.sample_rate().0
    );

    let (tx, rx) = bounded(config.channel_blocks);
    let sample_rate = supported.sample_rate().0;
    let sample_format = supported.sample_format();
    let stream_config: cpal::StreamConfig = supported.into();

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_input::<f32>(&device, &stream_config, tx),
        cpal::SampleFormat::I16 => build_input::<i16>(&device, &stream_config, tx),
        cpal::SampleFormat::U16 => build_input::<u16>(&device, &stream_config, tx),
        other => Err(EngineError::DeviceUnavailable(format!(
            "unsupported input sample format {:?}",
            other
        ))),
    }?;

    stream
        .play()
        .map_err(|e| EngineError::DeviceUnavailable(format!("start input stream: {}", e)))?;

    Ok(ActiveSource {
        receiver: rx,
        gain: config.input_gain,
        sample_rate,
        recycle: None,
        _stream: Some(stream),
        pump: None,
    })
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tx: Sender<Block>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels.max(1) as usize;
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let block: Block = data
                    .chunks(channels)
                    .map(|frame| {
                        frame.iter().map(|&s| f32::from_sample(s)).sum::<f32>() / channels as f32
                    })
                    .collect();
                let _ = tx.try_send(block);
            },
            |err| log::error!("Audio input error: {}", err),
            None,
        )
        .map_err(|e| EngineError::DeviceUnavailable(format!("build input stream: {}", e)))
}

/// Decode a WAV file to mono f32 samples.
pub fn decode_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path).map_err(|e| match e {
        hound::Error::IoError(io) => {
            EngineError::DeviceUnavailable(format!("{}: {}", path.display(), io))
        }
        other => EngineError::DecodeFailure(format!("{}: {}", path.display(), other)),
    })?;

    let spec = reader.spec();
    let decode_err = |e: hound::Error| EngineError::DecodeFailure(format!("{}: {}", path.display(), e));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(decode_err)?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(decode_err)?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mono: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    if mono.is_empty() {
        return Err(EngineError::DecodeFailure(format!(
            "{}: no samples",
            path.display()
        )));
    }

    Ok((mono, spec.sample_rate))
}

fn open_file(path: &Path, looped: bool, config: &FFTConfig) -> Result<ActiveSource> {
    let (samples, sample_rate) = decode_wav(path)?;
    log::info!(
        "File source: {} ({:.1}s @ {}Hz{})",
        path.display(),
        samples.len() as f32 / sample_rate as f32,
        sample_rate,
        if looped { ", looped" } else { "" }
    );

    let (tx, rx) = bounded(config.channel_blocks);
    let block_len = config.pump_block_len(sample_rate);
    let interval = Duration::from_millis(config.update_interval_ms);
    let pump = Pump::spawn(samples, block_len, interval, looped, tx);

    Ok(ActiveSource {
        receiver: rx,
        gain: 1.0,
        sample_rate,
        recycle: None,
        _stream: None,
        pump: Some(pump),
    })
}

/// Worker thread pushing decoded samples at real-time pace
struct Pump {
    stop: Arc<AtomicBool>,
    /// Playback holds its position while set
    paused: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Pump {
    fn spawn(
        samples: Vec<f32>,
        block_len: usize,
        interval: Duration,
        looped: bool,
        tx: Sender<Block>,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let paused = Arc::new(AtomicBool::new(false));
        let paused_flag = Arc::clone(&paused);

        let handle = thread::spawn(move || {
            let mut pos = 0;
            while !stop_flag.load(Ordering::Relaxed) {
                if paused_flag.load(Ordering::Relaxed) {
                    thread::sleep(interval);
                    continue;
                }
                if pos >= samples.len() {
                    if !looped {
                        break;
                    }
                    pos = 0;
                }
                let end = (pos + block_len).min(samples.len());
                if let Err(TrySendError::Disconnected(_)) = tx.try_send(samples[pos..end].to_vec()) {
                    break;
                }
                pos = end;
                thread::sleep(interval);
            }
        });

        Self {
            stop,
            paused,
            handle: Some(handle),
        }
    }
}

impl Drop for Pump {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, spec: hound::WavSpec, frames: usize) {
        let mut w = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            for _ in 0..spec.channels {
                let v = ((i as f32) * 0.05).sin() * 0.5;
                match spec.sample_format {
                    hound::SampleFormat::Float => w.write_sample(v).unwrap(),
                    hound::SampleFormat::Int => w.write_sample((v * 32767.0) as i16).unwrap(),
                }
            }
        }
        w.finalize().unwrap();
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bloomsynth_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_decode_int_stereo_downmixes() {
        let path = temp_path("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, 1000);
        let (mono, sr) = decode_wav(&path).unwrap();
        assert_eq!(sr, 22050);
        assert_eq!(mono.len(), 1000);
        assert!(mono.iter().all(|s| s.abs() <= 0.51));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_device_unavailable() {
        let err = decode_wav(Path::new("/nonexistent/clip.wav")).unwrap_err();
        assert!(matches!(err, EngineError::DeviceUnavailable(_)));
    }

    #[test]
    fn test_garbage_file_is_decode_failure() {
        let path = temp_path("garbage.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();
        let err = decode_wav(&path).unwrap_err();
        assert!(matches!(err, EngineError::DecodeFailure(_)));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_file_pump_delivers_and_stops() {
        let path = temp_path("pump.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        write_wav(&path, spec, 800);

        let config = FFTConfig {
            update_interval_ms: 1,
            ..Default::default()
        };
        let active = ActiveSource::open(Source::file(&path, true), &config).unwrap();
        let block = active
            .receiver
            .recv_timeout(Duration::from_secs(2))
            .unwrap();
        assert!(!block.is_empty());
        assert_eq!(active.gain, 1.0);
        // Dropping joins the looping pump thread
        drop(active);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_paused_pump_holds_blocks() {
        let path = temp_path("paused.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        write_wav(&path, spec, 800);

        let config = FFTConfig {
            update_interval_ms: 1,
            ..Default::default()
        };
        let active = ActiveSource::open(Source::file(&path, true), &config).unwrap();
        assert!(active.set_paused(true));
        assert!(active.is_paused());

        // Let an in-flight block land, then drain
        thread::sleep(Duration::from_millis(20));
        while active.receiver.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(50));
        assert!(active.receiver.is_empty());

        active.set_paused(false);
        assert!(active
            .receiver
            .recv_timeout(Duration::from_secs(2))
            .is_ok());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_stream_cannot_pause() {
        let (_tx, rx) = bounded(1);
        let active = ActiveSource::open(Source::stream(rx, 8000), &FFTConfig::default()).unwrap();
        assert!(!active.set_paused(true));
        assert!(!active.is_paused());
    }
}

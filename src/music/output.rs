//! Speaker output driven by the music engine.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use log::{error, info};

use super::engine::MusicEngine;
use crate::error::{EngineError, Result};

/// Default output stream; the engine renders inside the device callback.
/// Dropping it silences the device.
pub struct AudioOutput {
    _stream: cpal::Stream,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioOutput {
    pub fn open(engine: &MusicEngine) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::DeviceUnavailable("no audio output device found".into()))?;

        let supported = device
            .default_output_config()
            .map_err(|e| EngineError::DeviceUnavailable(format!("output config: {}", e)))?;

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();
        info!(
            "Output: {} @ {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels
        );
        engine.set_sample_rate(sample_rate);

        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_output::<f32>(&device, &config, engine.clone()),
            cpal::SampleFormat::I16 => build_output::<i16>(&device, &config, engine.clone()),
            cpal::SampleFormat::U16 => build_output::<u16>(&device, &config, engine.clone()),
            other => Err(EngineError::DeviceUnavailable(format!(
                "unsupported output sample format {:?}",
                other
            ))),
        }?;

        stream
            .play()
            .map_err(|e| EngineError::DeviceUnavailable(format!("start output stream: {}", e)))?;

        Ok(Self {
            _stream: stream,
            sample_rate,
            channels,
        })
    }
}

fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    engine: MusicEngine,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    let mut mono: Vec<f32> = Vec::new();
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                mono.resize(frames, 0.0);
                engine.render_block(&mut mono);
                for (frame, &s) in data.chunks_mut(channels).zip(&mono) {
                    frame.fill(T::from_sample(s));
                }
            },
            |err| error!("Audio output error: {}", err),
            None,
        )
        .map_err(|e| EngineError::DeviceUnavailable(format!("build output stream: {}", e)))
}

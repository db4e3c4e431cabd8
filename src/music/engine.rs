//! Generative music engine.
//!
//! The engine renders its own sample blocks, so the musical clock is
//! sample-accurate and the engine runs headless. A device callback
//! ([`super::AudioOutput`]) or a test simply calls [`MusicEngine::render_block`].
//! All state lives behind one mutex shared by the visual and audio threads.

use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::graph::{AudioGraph, GraphLayout};
use crate::analysis::{Block, Source};
use crate::descriptor::GeneticDescriptor;
use crate::error::{EngineError, Result};
use crate::params::audio_constants::OUTPUT_CEILING;
use crate::params::MusicParams;
use crate::physiology::PhysioState;

/// Capacity of each analysis tap, in blocks
const TAP_BLOCKS: usize = 64;

/// Recorded mono output
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Clip {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate.max(1) as f32
    }

    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        }
    }

    /// Encode as a 32-bit float mono WAV
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, self.wav_spec())
                .map_err(|e| EngineError::Encode(e.to_string()))?;
            for &s in &self.samples {
                writer
                    .write_sample(s)
                    .map_err(|e| EngineError::Encode(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| EngineError::Encode(e.to_string()))?;
        }
        Ok(cursor.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let encode = |e: hound::Error| EngineError::Encode(format!("{}: {}", path.display(), e));
        let mut writer = hound::WavWriter::create(path, self.wav_spec()).map_err(encode)?;
        for &s in &self.samples {
            writer.write_sample(s).map_err(encode)?;
        }
        writer.finalize().map_err(encode)?;
        info!(
            "Clip saved to {} ({:.1}s)",
            path.display(),
            self.duration_secs()
        );
        Ok(())
    }
}

/// Current ramp targets of the stress-driven effects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectTargets {
    pub distortion_wet: f32,
    pub crusher_bits: f32,
    pub crusher_wet: f32,
}

/// Output copy for one analysis consumer. Blocks come back through `spare`
/// once drained, so steady-state rendering reuses the same buffers.
struct Tap {
    tx: Sender<Block>,
    spare: Receiver<Block>,
}

impl Tap {
    /// False once the consumer is gone
    fn send(&self, samples: &[f32]) -> bool {
        if self.tx.is_full() {
            // Full: only probe for a dropped consumer
            return !matches!(self.tx.try_send(Vec::new()), Err(TrySendError::Disconnected(_)));
        }
        let mut block = self.spare.try_recv().unwrap_or_default();
        block.clear();
        block.extend_from_slice(samples);
        !matches!(self.tx.try_send(block), Err(TrySendError::Disconnected(_)))
    }
}

struct GraphRuntime {
    params: MusicParams,
    sample_rate: u32,
    generation: u64,
    graph: Option<AudioGraph>,
    recording: Option<Vec<f32>>,
    taps: Vec<Tap>,
    rng: StdRng,
}

impl GraphRuntime {
    fn teardown(&mut self) -> bool {
        if self.graph.take().is_none() {
            return false;
        }
        self.generation += 1;
        if self.recording.take().is_some() {
            debug!("Discarding unfinished recording");
        }
        info!("Audio graph stopped (generation {})", self.generation);
        true
    }

    fn build(&mut self, descriptor: &GeneticDescriptor) {
        let graph = AudioGraph::new(descriptor, &self.params, self.sample_rate);
        let layout = graph.layout();
        self.generation += 1;
        info!(
            "Audio graph started: {} voice, {:?} (generation {}, {:.0} bpm)",
            layout.voice.family.name(),
            layout.effects,
            self.generation,
            graph.base_bpm()
        );
        self.graph = Some(graph);
    }
}

/// Handle to the shared graph runtime; clones share one engine
#[derive(Clone)]
pub struct MusicEngine {
    runtime: Arc<Mutex<GraphRuntime>>,
}

impl MusicEngine {
    pub fn new(params: MusicParams) -> Self {
        Self::with_rng(params, StdRng::from_entropy())
    }

    /// Engine whose note choices follow `seed`
    pub fn with_seed(params: MusicParams, seed: u64) -> Self {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }

    fn with_rng(params: MusicParams, rng: StdRng) -> Self {
        let sample_rate = params.sample_rate_hz.max(1);
        Self {
            runtime: Arc::new(Mutex::new(GraphRuntime {
                params,
                sample_rate,
                generation: 0,
                graph: None,
                recording: None,
                taps: Vec::new(),
                rng,
            })),
        }
    }

    fn runtime(&self) -> MutexGuard<'_, GraphRuntime> {
        // A panic on another thread leaves plain data behind; keep going
        self.runtime.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Build the graph for `descriptor`. A running graph is stopped first.
    pub fn start(&self, descriptor: &GeneticDescriptor) {
        let mut rt = self.runtime();
        if rt.graph.is_some() {
            warn!("{}; restarting", EngineError::GraphAlreadyRunning);
            rt.teardown();
        }
        rt.build(descriptor);
    }

    /// Tear the graph down. Idempotent.
    pub fn stop(&self) {
        self.runtime().teardown();
    }

    pub fn is_running(&self) -> bool {
        self.runtime().graph.is_some()
    }

    /// Bumped on every graph build and teardown
    pub fn generation(&self) -> u64 {
        self.runtime().generation
    }

    pub fn sample_rate(&self) -> u32 {
        self.runtime().sample_rate
    }

    /// Adopt a device rate; a running graph is rebuilt at the new rate
    pub fn set_sample_rate(&self, sample_rate: u32) {
        let mut rt = self.runtime();
        let sample_rate = sample_rate.max(1);
        if rt.sample_rate == sample_rate {
            return;
        }
        rt.sample_rate = sample_rate;
        if let Some(descriptor) = rt.graph.as_ref().map(|g| g.descriptor().clone()) {
            rt.teardown();
            rt.build(&descriptor);
        }
    }

    /// Forward physiology to the running graph; parameters only
    pub fn update_bio_state(&self, physio: PhysioState) {
        let mut rt = self.runtime();
        let GraphRuntime { graph, params, .. } = &mut *rt;
        if let Some(graph) = graph {
            graph.set_physio(physio, params);
        }
    }

    /// Current tempo (bpm) of the running graph
    pub fn tempo(&self) -> Option<f32> {
        self.runtime().graph.as_ref().map(|g| g.tempo())
    }

    /// Tempo the running graph is ramping toward
    pub fn target_tempo(&self) -> Option<f32> {
        self.runtime().graph.as_ref().map(|g| g.target_tempo())
    }

    pub fn layout(&self) -> Option<GraphLayout> {
        self.runtime().graph.as_ref().map(|g| g.layout())
    }

    pub fn effect_targets(&self) -> Option<EffectTargets> {
        self.runtime().graph.as_ref().map(|g| {
            let fx = g.effects();
            EffectTargets {
                distortion_wet: fx.distortion().wet.target(),
                crusher_bits: fx.crusher().bits.target(),
                crusher_wet: fx.crusher().wet.target(),
            }
        })
    }

    /// Fill `out` with mono samples. Silence while stopped.
    pub fn render_block(&self, out: &mut [f32]) {
        let mut rt = self.runtime();
        let GraphRuntime {
            graph,
            params,
            rng,
            recording,
            taps,
            ..
        } = &mut *rt;

        match graph {
            Some(graph) => {
                for s in out.iter_mut() {
                    *s = graph
                        .next_sample(rng, params)
                        .clamp(-OUTPUT_CEILING, OUTPUT_CEILING);
                }
            }
            None => out.fill(0.0),
        }

        if let Some(buf) = recording {
            buf.extend_from_slice(out);
        }
        taps.retain(|tap| tap.send(out));
    }

    /// Begin capturing the mixed output. Needs a running graph.
    pub fn start_recording(&self) -> bool {
        let mut rt = self.runtime();
        if rt.graph.is_none() {
            warn!("Cannot record: audio graph is not running");
            return false;
        }
        if rt.recording.is_none() {
            rt.recording = Some(Vec::new());
            info!("Recording started");
        }
        true
    }

    pub fn is_recording(&self) -> bool {
        self.runtime().recording.is_some()
    }

    /// Finish the capture; `None` when nothing was recording
    pub fn stop_recording(&self) -> Option<Clip> {
        let mut rt = self.runtime();
        let samples = rt.recording.take()?;
        let clip = Clip {
            samples,
            sample_rate: rt.sample_rate,
        };
        info!("Recording stopped ({:.1}s)", clip.duration_secs());
        Some(clip)
    }

    /// Mixed output as an analysis source
    pub fn analysis_tap(&self) -> Source {
        let (tx, rx) = bounded(TAP_BLOCKS);
        let (recycle, spare) = bounded(TAP_BLOCKS);
        let mut rt = self.runtime();
        rt.taps.push(Tap { tx, spare });
        Source::Stream {
            receiver: rx,
            sample_rate: rt.sample_rate,
            recycle: Some(recycle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Mood, Topology};
    use crate::music::EffectKind;

    fn engine() -> MusicEngine {
        MusicEngine::with_seed(
            MusicParams {
                sample_rate_hz: 8000,
                ..Default::default()
            },
            42,
        )
    }

    fn descriptor(topology: Topology, mood: Mood) -> GeneticDescriptor {
        GeneticDescriptor {
            topology,
            mood,
            ..Default::default()
        }
    }

    #[test]
    fn test_start_stop_generation() {
        let e = engine();
        assert!(!e.is_running());
        e.stop();
        assert_eq!(e.generation(), 0);

        e.start(&GeneticDescriptor::default());
        assert!(e.is_running());
        assert_eq!(e.generation(), 1);

        e.stop();
        e.stop();
        assert!(!e.is_running());
        assert_eq!(e.generation(), 2);
    }

    #[test]
    fn test_start_while_running_restarts() {
        let e = engine();
        e.start(&descriptor(Topology::FractalTree, Mood::Happy));
        e.start(&descriptor(Topology::CrystalCactus, Mood::Aggressive));
        // stop + start on top of the first build
        assert_eq!(e.generation(), 3);
        let layout = e.layout().unwrap();
        assert_eq!(layout.effects[0], EffectKind::PreDistortion);
    }

    #[test]
    fn test_restart_reproduces_layout() {
        let e = engine();
        for t in Topology::ALL {
            for mood in Mood::ALL {
                let d = descriptor(t, mood);
                e.start(&d);
                let first = e.layout().unwrap();
                e.stop();
                e.start(&d);
                assert_eq!(e.layout().unwrap(), first, "{:?}/{:?}", t, mood);
            }
        }
    }

    #[test]
    fn test_tempo_follows_stress_for_every_topology() {
        let e = engine();
        let mut block = vec![0.0; 512];
        for t in Topology::ALL {
            let d = GeneticDescriptor {
                topology: t,
                growth_speed: 1.5,
                ..Default::default()
            };
            e.start(&d);
            assert_eq!(e.tempo(), Some(120.0));
            for stress in [0.0, 0.25, 1.0] {
                e.update_bio_state(PhysioState {
                    stress,
                    energy: 0.5,
                });
                let expected = 120.0 + 60.0 * stress;
                assert!((e.target_tempo().unwrap() - expected).abs() < 1e-3);
                // 0.5 s ramp at 8 kHz
                for _ in 0..8 {
                    e.render_block(&mut block);
                }
                assert!((e.tempo().unwrap() - expected).abs() < 1e-3, "{:?}", t);
            }
        }
    }

    #[test]
    fn test_stress_drives_effect_targets() {
        let e = engine();
        assert_eq!(e.effect_targets(), None);
        e.start(&GeneticDescriptor::default());

        e.update_bio_state(PhysioState {
            stress: 0.8,
            energy: 0.0,
        });
        let hot = e.effect_targets().unwrap();
        assert_eq!(hot.distortion_wet, 0.8);
        assert_eq!(hot.crusher_bits, 4.0);
        assert_eq!(hot.crusher_wet, 1.0);

        e.update_bio_state(PhysioState::default());
        let calm = e.effect_targets().unwrap();
        assert_eq!(calm.distortion_wet, 0.0);
        assert_eq!(calm.crusher_bits, 8.0);
        assert_eq!(calm.crusher_wet, 0.0);
    }

    #[test]
    fn test_render_bounded_and_audible() {
        let e = engine();
        let mut block = vec![1.0; 256];
        e.render_block(&mut block);
        assert!(block.iter().all(|&s| s == 0.0));

        e.start(&descriptor(Topology::AlienShrub, Mood::Aggressive));
        e.update_bio_state(PhysioState {
            stress: 1.0,
            energy: 1.0,
        });
        let mut peak = 0.0f32;
        for _ in 0..(8000 * 4 / 256) {
            e.render_block(&mut block);
            for &s in &block {
                assert!(s.is_finite() && s.abs() <= OUTPUT_CEILING);
                peak = peak.max(s.abs());
            }
        }
        assert!(peak > 1e-3);
    }

    #[test]
    fn test_recording_lifecycle() {
        let e = engine();
        assert!(!e.start_recording());
        assert_eq!(e.stop_recording(), None);

        e.start(&GeneticDescriptor::default());
        assert!(e.start_recording());
        let mut block = vec![0.0; 100];
        for _ in 0..10 {
            e.render_block(&mut block);
        }
        let clip = e.stop_recording().unwrap();
        assert_eq!(clip.samples.len(), 1000);
        assert_eq!(clip.sample_rate, 8000);
        assert_eq!(e.stop_recording(), None);

        // Stopping the graph discards an open recording
        e.start_recording();
        e.stop();
        assert_eq!(e.stop_recording(), None);
    }

    #[test]
    fn test_clip_wav_bytes() {
        let clip = Clip {
            samples: vec![0.0, 0.25, -0.5, 0.125],
            sample_rate: 8000,
        };
        let bytes = clip.to_wav_bytes().unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 8000);
        let decoded: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, clip.samples);
    }

    #[test]
    fn test_analysis_tap_receives_output() {
        let e = engine();
        let Source::Stream {
            receiver,
            sample_rate,
            ..
        } = e.analysis_tap()
        else {
            panic!("tap must be a stream source");
        };
        assert_eq!(sample_rate, 8000);
        let mut block = vec![0.0; 64];
        e.render_block(&mut block);
        assert_eq!(receiver.try_recv().unwrap().len(), 64);

        drop(receiver);
        e.render_block(&mut block);
        assert!(e.runtime().taps.is_empty());
    }

    #[test]
    fn test_tap_reuses_returned_blocks() {
        let e = engine();
        e.start(&GeneticDescriptor::default());
        let Source::Stream {
            receiver,
            recycle: Some(recycle),
            ..
        } = e.analysis_tap()
        else {
            panic!("tap must pool its blocks");
        };
        let mut block = vec![0.0; 64];
        e.render_block(&mut block);
        let first = receiver.try_recv().unwrap();
        let ptr = first.as_ptr();
        recycle.send(first).unwrap();

        e.render_block(&mut block);
        let second = receiver.try_recv().unwrap();
        assert_eq!(second.as_ptr(), ptr);
        assert_eq!(second, block);
    }

    #[test]
    fn test_sample_rate_change_rebuilds() {
        let e = engine();
        e.start(&GeneticDescriptor::default());
        e.set_sample_rate(8000);
        assert_eq!(e.generation(), 1);
        e.set_sample_rate(48000);
        assert_eq!(e.sample_rate(), 48000);
        assert_eq!(e.generation(), 3);
        assert!(e.is_running());
    }
}

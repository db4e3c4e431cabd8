//! One running audio graph: voices, bass, effect chain and musical clock.
//!
//! Built once per `start`, torn down on `stop`. Everything that varies while
//! running is a ramp target; the structure never changes.

use rand::Rng;

use super::effects::{EffectChain, EffectKind, Ramp};
use super::scale::{midi_to_hz, Scale};
use super::sequencer::{base_bpm, NoteEvent, Sequencer};
use super::voice::{Membrane, Voice, VoicePreset};
use crate::descriptor::GeneticDescriptor;
use crate::params::MusicParams;
use crate::physiology::PhysioState;

/// Structural fingerprint of a graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphLayout {
    pub voice: VoicePreset,
    pub effects: Vec<EffectKind>,
}

pub struct AudioGraph {
    descriptor: GeneticDescriptor,
    preset: VoicePreset,
    voices: Vec<Voice>,
    bass: Vec<Membrane>,
    effects: EffectChain,
    sequencer: Sequencer,
    base_bpm: f32,
    tempo: Ramp,
    /// Fraction of the current quarter note elapsed; a tick fires at 1
    beat: f64,
    last_hz: Option<f32>,
    physio: PhysioState,
    sample_rate: f32,
}

impl AudioGraph {
    pub fn new(descriptor: &GeneticDescriptor, params: &MusicParams, sample_rate: u32) -> Self {
        let sr = sample_rate.max(1) as f32;
        let base = base_bpm(descriptor.growth_speed, params);
        Self {
            descriptor: descriptor.clone(),
            preset: VoicePreset::for_topology(descriptor.topology),
            voices: Vec::with_capacity(params.polyphony),
            bass: Vec::new(),
            effects: EffectChain::for_mood(descriptor.mood, 60.0 / base, sr),
            sequencer: Sequencer::new(Scale::for_mood(descriptor.mood), descriptor.energy),
            base_bpm: base,
            tempo: Ramp::new(base),
            // First tick lands on the first sample
            beat: 1.0,
            last_hz: None,
            physio: PhysioState::default(),
            sample_rate: sr,
        }
    }

    pub fn descriptor(&self) -> &GeneticDescriptor {
        &self.descriptor
    }

    pub fn layout(&self) -> GraphLayout {
        GraphLayout {
            voice: self.preset,
            effects: self.effects.layout(),
        }
    }

    pub fn effects(&self) -> &EffectChain {
        &self.effects
    }

    pub fn base_bpm(&self) -> f32 {
        self.base_bpm
    }

    pub fn tempo(&self) -> f32 {
        self.tempo.value()
    }

    pub fn target_tempo(&self) -> f32 {
        self.tempo.target()
    }

    /// Retarget wet amounts, bit depth and tempo
    pub fn set_physio(&mut self, physio: PhysioState, params: &MusicParams) {
        self.physio = physio;
        self.effects.modulate(physio.stress, self.sample_rate);
        let target = self.base_bpm + physio.stress * params.stress_bpm_span;
        self.tempo
            .ramp_to(target, params.tempo_ramp_secs, self.sample_rate);
    }

    pub fn next_sample<R: Rng + ?Sized>(&mut self, rng: &mut R, params: &MusicParams) -> f32 {
        let bpm = self.tempo.next().max(1.0);
        if self.beat >= 1.0 {
            self.beat -= 1.0;
            self.on_beat(rng, params, bpm);
        }
        self.beat += bpm as f64 / 60.0 / self.sample_rate as f64;

        let dt = 1.0 / self.sample_rate;
        let voice: f32 = self.voices.iter_mut().map(|v| v.next(dt)).sum();
        let bass: f32 = self.bass.iter_mut().map(|m| m.next(dt)).sum();
        self.voices.retain(|v| !v.finished());
        self.bass.retain(|m| !m.finished());

        self.effects.process(voice, bass) * params.master_gain
    }

    fn on_beat<R: Rng + ?Sized>(&mut self, rng: &mut R, params: &MusicParams, bpm: f32) {
        let beat_secs = 60.0 / bpm;
        for event in self.sequencer.step(rng, self.physio, params) {
            match event {
                NoteEvent::Bass { note, beats } => {
                    self.bass.push(Membrane::new(midi_to_hz(note), beats * beat_secs));
                }
                NoteEvent::Melody { notes, beats } => {
                    for note in notes {
                        if self.voices.len() >= params.polyphony.max(1) {
                            self.voices.remove(0);
                        }
                        let hz = midi_to_hz(note);
                        self.voices
                            .push(Voice::new(self.preset, hz, beats * beat_secs, self.last_hz));
                        self.last_hz = Some(hz);
                    }
                }
            }
        }
    }
}

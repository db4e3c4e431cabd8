//! Generative audio engine.
//!
//! Topology picks the voice, mood picks the scale and the mood effect, and
//! physiology modulates wet amounts, bit depth and tempo while running.

mod effects;
mod engine;
mod graph;
mod output;
mod scale;
mod sequencer;
mod voice;

pub use effects::{EffectKind, CRUSH_STRESS, DISTORTION_ONSET};
pub use engine::{Clip, EffectTargets, MusicEngine};
pub use graph::GraphLayout;
pub use output::AudioOutput;
pub use scale::{midi_to_hz, Note, Scale};
pub use sequencer::{base_bpm, bass_probability, density, NoteEvent, Sequencer};
pub use voice::{Adsr, VoiceFamily, VoicePreset, Waveform};

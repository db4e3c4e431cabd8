//! Generative music parameters.
//!
//! Probabilities are per quarter-note tick of the musical clock.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicParams {
    /// Output sample rate used when no device dictates one (Hz)
    pub sample_rate_hz: u32,

    /// Bass trigger probability at stress 0
    pub bass_base: f32,

    /// Extra bass probability per unit stress
    pub bass_stress_scale: f32,

    /// Hard cap on the bass trigger probability
    pub bass_cap: f32,

    /// Melodic density at zero energy
    pub density_base: f32,

    /// Density per unit of authored (descriptor) energy
    pub density_authored: f32,

    /// Density per unit of runtime (physiological) energy
    pub density_runtime: f32,

    /// Hard cap on melodic density
    pub density_cap: f32,

    /// Probability that a melodic note is promoted to a triad
    pub chord_probability: f32,

    /// Stress above which every note is an eighth
    pub staccato_stress: f32,

    /// BPM at growth_speed 0
    pub bpm_floor: f32,

    /// BPM added per unit of growth_speed
    pub bpm_per_speed: f32,

    /// BPM added at full stress
    pub stress_bpm_span: f32,

    /// Seconds for tempo to follow a new target (one-pole ramp)
    pub tempo_ramp_secs: f32,

    /// Master gain before the output limiter
    pub master_gain: f32,

    /// Maximum simultaneously sounding melodic voices
    pub polyphony: usize,
}

impl Default for MusicParams {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            bass_base: 0.15,
            bass_stress_scale: 0.2,
            bass_cap: 0.35,
            density_base: 0.2,
            density_authored: 0.15,
            density_runtime: 0.2,
            density_cap: 0.6,
            chord_probability: 0.15,
            staccato_stress: 0.7,
            bpm_floor: 60.0,
            bpm_per_speed: 40.0,
            stress_bpm_span: 60.0,
            tempo_ramp_secs: 0.5,
            master_gain: 0.6,
            polyphony: 12,
        }
    }
}

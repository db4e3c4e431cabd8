//! Voice presets and per-note synthesis.
//!
//! Each topology owns one preset. A [`Voice`] is one sounding note of that
//! preset; the engine keeps a small pool of them plus [`Membrane`] hits for
//! the sub-bass.

use std::f32::consts::TAU;

use crate::descriptor::Topology;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Saw,
}

impl Waveform {
    /// Sample at `phase` in cycles (0..1)
    pub fn sample(self, phase: f32) -> f32 {
        let p = phase.rem_euclid(1.0);
        match self {
            Waveform::Sine => (TAU * p).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Saw => 2.0 * p - 1.0,
        }
    }
}

/// Attack/decay/release in seconds, sustain as a level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Level `t` seconds after onset for a note held `gate` seconds
    pub fn level(&self, t: f32, gate: f32) -> f32 {
        if t < gate {
            self.held(t)
        } else {
            let from = self.held(gate);
            let r = self.release.max(1e-4);
            (from * (1.0 - (t - gate) / r)).max(0.0)
        }
    }

    fn held(&self, t: f32) -> f32 {
        let a = self.attack.max(1e-4);
        if t < a {
            return t / a;
        }
        let d = self.decay.max(1e-4);
        if t < a + d {
            1.0 - (1.0 - self.sustain) * (t - a) / d
        } else {
            self.sustain
        }
    }
}

/// Synthesis family and its timbre parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceFamily {
    /// Frequency modulation; deviation is `index` x modulator frequency
    Fm {
        harmonicity: f32,
        index: f32,
        carrier: Waveform,
        modulator: Waveform,
        mod_env: Adsr,
    },
    /// Single oscillator through a two-pole lowpass swept by its own envelope
    Filtered {
        wave: Waveform,
        filter_env: Adsr,
        base_hz: f32,
        octaves: f32,
    },
    /// Additive carrier (harmonic amplitudes) under amplitude modulation
    Am {
        harmonicity: f32,
        partials: [f32; 3],
    },
    /// Saw and sine pair with shared vibrato
    Duo {
        harmonicity: f32,
        vibrato_semitones: f32,
        vibrato_hz: f32,
    },
    /// Plain oscillator gliding from the previous note
    Simple { wave: Waveform, portamento: f32 },
}

impl VoiceFamily {
    pub fn name(&self) -> &'static str {
        match self {
            VoiceFamily::Fm { .. } => "fm",
            VoiceFamily::Filtered { .. } => "filtered",
            VoiceFamily::Am { .. } => "am",
            VoiceFamily::Duo { .. } => "duo",
            VoiceFamily::Simple { .. } => "simple",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoicePreset {
    pub family: VoiceFamily,
    pub envelope: Adsr,
}

impl VoicePreset {
    pub fn for_topology(topology: Topology) -> Self {
        let (family, envelope) = match topology {
            Topology::FractalTree => (
                VoiceFamily::Fm {
                    harmonicity: 3.0,
                    index: 10.0,
                    carrier: Waveform::Sine,
                    modulator: Waveform::Square,
                    mod_env: Adsr::new(0.5, 0.01, 1.0, 0.5),
                },
                Adsr::new(0.5, 0.5, 1.0, 2.0),
            ),
            Topology::OrganicVine => (
                VoiceFamily::Filtered {
                    wave: Waveform::Triangle,
                    filter_env: Adsr::new(0.06, 0.2, 0.5, 2.0),
                    base_hz: 200.0,
                    octaves: 3.0,
                },
                Adsr::new(1.0, 0.5, 0.5, 2.0),
            ),
            Topology::WeepingWillow => (
                VoiceFamily::Am {
                    harmonicity: 2.5,
                    partials: [0.0, 2.0, 3.0],
                },
                Adsr::new(0.01, 0.3, 0.0, 1.0),
            ),
            Topology::CrystalCactus => (
                VoiceFamily::Fm {
                    harmonicity: 8.0,
                    index: 20.0,
                    carrier: Waveform::Sine,
                    modulator: Waveform::Sine,
                    mod_env: Adsr::new(0.001, 2.0, 0.0, 2.0),
                },
                Adsr::new(0.001, 2.0, 0.0, 2.0),
            ),
            Topology::AlienShrub => (
                VoiceFamily::Duo {
                    harmonicity: 1.5,
                    vibrato_semitones: 0.5,
                    vibrato_hz: 5.0,
                },
                Adsr::new(0.01, 0.0, 1.0, 0.5),
            ),
            Topology::DataBlossom => (
                VoiceFamily::Simple {
                    wave: Waveform::Sine,
                    portamento: 0.05,
                },
                Adsr::new(0.3, 0.2, 0.8, 3.0),
            ),
            Topology::RadialSucculent => (
                VoiceFamily::Simple {
                    wave: Waveform::Triangle,
                    portamento: 0.0,
                },
                Adsr::new(0.005, 0.1, 0.3, 1.0),
            ),
            Topology::FernFrond => (
                VoiceFamily::Filtered {
                    wave: Waveform::Saw,
                    filter_env: Adsr::new(0.1, 0.4, 0.3, 1.5),
                    base_hz: 400.0,
                    octaves: 2.0,
                },
                Adsr::new(0.05, 0.3, 0.6, 1.5),
            ),
        };
        Self { family, envelope }
    }
}

/// Per-note output level before the effect chain
const VOICE_LEVEL: f32 = 0.25;

/// One sounding note
#[derive(Debug, Clone)]
pub struct Voice {
    preset: VoicePreset,
    hz: f32,
    /// Current pitch while gliding toward `hz`
    glide_hz: f32,
    gate: f32,
    t: f32,
    phase: f32,
    phase2: f32,
    mod_phase: f32,
    lowpass: [f32; 2],
}

impl Voice {
    /// `from_hz` is where a portamento preset starts its glide
    pub fn new(preset: VoicePreset, hz: f32, gate: f32, from_hz: Option<f32>) -> Self {
        Self {
            preset,
            hz,
            glide_hz: from_hz.unwrap_or(hz),
            gate: gate.max(0.0),
            t: 0.0,
            phase: 0.0,
            phase2: 0.0,
            mod_phase: 0.0,
            lowpass: [0.0; 2],
        }
    }

    pub fn finished(&self) -> bool {
        self.t >= self.gate + self.preset.envelope.release
    }

    pub fn next(&mut self, dt: f32) -> f32 {
        let amp = self.preset.envelope.level(self.t, self.gate);
        let out = match self.preset.family {
            VoiceFamily::Fm {
                harmonicity,
                index,
                carrier,
                modulator,
                mod_env,
            } => {
                let mod_hz = self.hz * harmonicity;
                let depth = index * mod_hz * mod_env.level(self.t, self.gate);
                let deviation = modulator.sample(self.mod_phase) * depth;
                self.mod_phase = advance(self.mod_phase, mod_hz, dt);
                let s = carrier.sample(self.phase);
                self.phase = advance(self.phase, self.hz + deviation, dt);
                s
            }
            VoiceFamily::Filtered {
                wave,
                filter_env,
                base_hz,
                octaves,
            } => {
                let x = wave.sample(self.phase);
                self.phase = advance(self.phase, self.hz, dt);
                let cutoff = base_hz * 2f32.powf(octaves * filter_env.level(self.t, self.gate));
                let a = 1.0 - (-TAU * cutoff * dt).exp();
                self.lowpass[0] += a * (x - self.lowpass[0]);
                self.lowpass[1] += a * (self.lowpass[0] - self.lowpass[1]);
                self.lowpass[1]
            }
            VoiceFamily::Am {
                harmonicity,
                partials,
            } => {
                let total: f32 = partials.iter().sum::<f32>().max(1e-6);
                let carrier: f32 = partials
                    .iter()
                    .enumerate()
                    .map(|(h, amp)| amp * Waveform::Sine.sample(self.phase * (h + 1) as f32))
                    .sum::<f32>()
                    / total;
                let modulator = 0.5 + 0.5 * Waveform::Sine.sample(self.mod_phase);
                self.phase = advance(self.phase, self.hz, dt);
                self.mod_phase = advance(self.mod_phase, self.hz * harmonicity, dt);
                carrier * modulator
            }
            VoiceFamily::Duo {
                harmonicity,
                vibrato_semitones,
                vibrato_hz,
            } => {
                let vibrato = (TAU * vibrato_hz * self.t).sin() * vibrato_semitones;
                let hz = self.hz * 2f32.powf(vibrato / 12.0);
                let s = 0.5 * (Waveform::Saw.sample(self.phase) + Waveform::Sine.sample(self.phase2));
                self.phase = advance(self.phase, hz, dt);
                self.phase2 = advance(self.phase2, hz * harmonicity, dt);
                s
            }
            VoiceFamily::Simple { wave, portamento } => {
                if portamento > 0.0 {
                    let k = 1.0 - (-dt / portamento).exp();
                    self.glide_hz += (self.hz - self.glide_hz) * k;
                } else {
                    self.glide_hz = self.hz;
                }
                let s = wave.sample(self.phase);
                self.phase = advance(self.phase, self.glide_hz, dt);
                s
            }
        };
        self.t += dt;
        out * amp * VOICE_LEVEL
    }
}

fn advance(phase: f32, hz: f32, dt: f32) -> f32 {
    (phase + hz * dt).rem_euclid(1.0)
}

/// Sub-bass drum: sine whose pitch falls from `octaves` x `hz` to `hz`
#[derive(Debug, Clone)]
pub struct Membrane {
    hz: f32,
    gate: f32,
    t: f32,
    phase: f32,
}

impl Membrane {
    const PITCH_DECAY: f32 = 0.05;
    const OCTAVES: f32 = 4.0;
    const ENVELOPE: Adsr = Adsr::new(0.001, 0.4, 0.01, 1.4);
    /// -10 dB
    const LEVEL: f32 = 0.316;

    pub fn new(hz: f32, gate: f32) -> Self {
        Self {
            hz,
            gate,
            t: 0.0,
            phase: 0.0,
        }
    }

    /// Instantaneous pitch
    pub fn pitch(&self) -> f32 {
        let k = (self.t / Self::PITCH_DECAY).min(1.0);
        self.hz * Self::OCTAVES.powf(1.0 - k)
    }

    pub fn finished(&self) -> bool {
        self.t >= self.gate + Self::ENVELOPE.release
    }

    pub fn next(&mut self, dt: f32) -> f32 {
        let amp = Self::ENVELOPE.level(self.t, self.gate);
        let s = Waveform::Sine.sample(self.phase);
        self.phase = advance(self.phase, self.pitch(), dt);
        self.t += dt;
        s * amp * Self::LEVEL
    }
}

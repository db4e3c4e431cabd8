//! Effect chain: mood stage, reverb and delay, then stress-driven
//! distortion and bit reduction.
//!
//! The chain layout is fixed when the graph is built. While running only
//! [`Ramp`] targets move.

use std::f32::consts::TAU;

use crate::descriptor::Mood;

/// Stress above which the distortion opens (wet = stress)
pub const DISTORTION_ONSET: f32 = 0.3;
/// Stress above which the crusher drops to low-fi
pub const CRUSH_STRESS: f32 = 0.6;

const CLEAN_BITS: f32 = 8.0;
const CRUSHED_BITS: f32 = 4.0;

/// Linear parameter ramp advanced once per sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    value: f32,
    target: f32,
    step: f32,
    remaining: u32,
}

impl Ramp {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            target: value,
            step: 0.0,
            remaining: 0,
        }
    }

    pub fn ramp_to(&mut self, target: f32, secs: f32, sample_rate: f32) {
        let n = (secs * sample_rate).round().max(0.0) as u32;
        self.target = target;
        if n == 0 {
            self.value = target;
            self.remaining = 0;
        } else {
            self.step = (target - self.value) / n as f32;
            self.remaining = n;
        }
    }

    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.value = if self.remaining == 0 {
                self.target
            } else {
                self.value + self.step
            };
        }
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.target
    }
}

/// Effects in signal order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Chorus,
    PreDistortion,
    Reverb,
    Delay,
    Distortion,
    BitCrusher,
}

fn mix(dry: f32, wet: f32, amount: f32) -> f32 {
    dry * (1.0 - amount) + wet * amount
}

struct DelayLine {
    buf: Vec<f32>,
    pos: usize,
}

impl DelayLine {
    fn new(len: usize) -> Self {
        Self {
            buf: vec![0.0; len.max(2)],
            pos: 0,
        }
    }

    /// Sample written `delay` samples ago, linearly interpolated
    fn read(&self, delay: f32) -> f32 {
        let len = self.buf.len();
        let d = delay.clamp(1.0, (len - 1) as f32);
        let whole = d.floor() as usize;
        let frac = d - whole as f32;
        let a = self.buf[(self.pos + len - whole) % len];
        let b = self.buf[(self.pos + len - whole - 1) % len];
        a + (b - a) * frac
    }

    fn write(&mut self, x: f32) {
        self.pos = (self.pos + 1) % self.buf.len();
        self.buf[self.pos] = x;
    }
}

pub struct BitCrusher {
    pub bits: Ramp,
    pub wet: Ramp,
}

impl BitCrusher {
    fn new() -> Self {
        Self {
            bits: Ramp::new(CLEAN_BITS),
            wet: Ramp::new(0.0),
        }
    }

    pub fn process(&mut self, x: f32) -> f32 {
        let bits = self.bits.next();
        let wet = self.wet.next();
        let step = 2.0 / 2f32.powf(bits);
        mix(x, (x / step).round() * step, wet)
    }
}

/// Waveshaper `(1 + k) x / (1 + k |x|)`
pub struct Distortion {
    k: f32,
    pub wet: Ramp,
}

impl Distortion {
    fn new(amount: f32, wet: f32) -> Self {
        let a = amount.clamp(0.0, 0.99);
        Self {
            k: 2.0 * a / (1.0 - a),
            wet: Ramp::new(wet),
        }
    }

    pub fn process(&mut self, x: f32) -> f32 {
        let wet = self.wet.next();
        let shaped = (1.0 + self.k) * x / (1.0 + self.k * x.abs());
        mix(x, shaped, wet)
    }
}

pub struct FeedbackDelay {
    line: DelayLine,
    delay: f32,
    feedback: f32,
}

impl FeedbackDelay {
    fn new(delay_secs: f32, feedback: f32, sample_rate: f32) -> Self {
        let delay = (delay_secs * sample_rate).max(1.0);
        Self {
            line: DelayLine::new(delay.ceil() as usize + 2),
            delay,
            feedback,
        }
    }

    /// Fully wet echo
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.line.read(self.delay);
        self.line.write(x + y * self.feedback);
        y
    }
}

struct Comb {
    line: DelayLine,
    len: f32,
    feedback: f32,
}

impl Comb {
    fn process(&mut self, x: f32) -> f32 {
        let y = self.line.read(self.len);
        self.line.write(x + y * self.feedback);
        y
    }
}

struct Allpass {
    line: DelayLine,
    len: f32,
}

impl Allpass {
    const GAIN: f32 = 0.5;

    fn process(&mut self, x: f32) -> f32 {
        let delayed = self.line.read(self.len);
        let v = x + delayed * Self::GAIN;
        self.line.write(v);
        delayed - v * Self::GAIN
    }
}

/// Schroeder reverb: parallel combs into series allpasses
pub struct Reverb {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
    wet: f32,
}

impl Reverb {
    /// Comb and allpass lengths at 44.1 kHz
    const COMBS: [f32; 4] = [1116.0, 1188.0, 1277.0, 1356.0];
    const ALLPASSES: [f32; 2] = [556.0, 441.0];

    fn new(decay_secs: f32, wet: f32, sample_rate: f32) -> Self {
        let scale = sample_rate / 44100.0;
        let combs = Self::COMBS
            .iter()
            .map(|&n| {
                let len = (n * scale).max(1.0);
                // -60 dB after `decay_secs`
                let feedback = 10f32.powf(-3.0 * len / sample_rate / decay_secs.max(0.01));
                Comb {
                    line: DelayLine::new(len.ceil() as usize + 2),
                    len,
                    feedback,
                }
            })
            .collect();
        let allpasses = Self::ALLPASSES
            .iter()
            .map(|&n| {
                let len = (n * scale).max(1.0);
                Allpass {
                    line: DelayLine::new(len.ceil() as usize + 2),
                    len,
                }
            })
            .collect();
        Self {
            combs,
            allpasses,
            wet,
        }
    }

    pub fn process(&mut self, x: f32) -> f32 {
        let n = self.combs.len() as f32;
        let mut y = self.combs.iter_mut().map(|c| c.process(x)).sum::<f32>() / n;
        for ap in &mut self.allpasses {
            y = ap.process(y);
        }
        mix(x, y, self.wet)
    }
}

/// Modulated short delay
pub struct Chorus {
    line: DelayLine,
    rate_hz: f32,
    delay: f32,
    depth: f32,
    lfo: f32,
    dt: f32,
}

impl Chorus {
    const WET: f32 = 0.5;

    fn new(rate_hz: f32, delay_ms: f32, depth: f32, sample_rate: f32) -> Self {
        let delay = delay_ms / 1000.0 * sample_rate;
        Self {
            line: DelayLine::new((delay * (1.0 + depth)).ceil() as usize + 4),
            rate_hz,
            delay,
            depth,
            lfo: 0.0,
            dt: 1.0 / sample_rate,
        }
    }

    pub fn process(&mut self, x: f32) -> f32 {
        self.line.write(x);
        let d = self.delay * (1.0 + self.depth * (TAU * self.lfo).sin());
        self.lfo = (self.lfo + self.rate_hz * self.dt).rem_euclid(1.0);
        mix(x, self.line.read(d), Self::WET)
    }
}

enum MoodStage {
    Chorus(Chorus),
    PreDistortion(Distortion),
}

pub struct EffectChain {
    mood_stage: Option<MoodStage>,
    reverb: Reverb,
    delay: FeedbackDelay,
    distortion: Distortion,
    crusher: BitCrusher,
}

impl EffectChain {
    /// `beat_secs` sets the eighth-note echo
    pub fn for_mood(mood: Mood, beat_secs: f32, sample_rate: f32) -> Self {
        let mood_stage = match mood {
            Mood::Calm | Mood::Mysterious => {
                Some(MoodStage::Chorus(Chorus::new(4.0, 2.5, 0.5, sample_rate)))
            }
            Mood::Aggressive => Some(MoodStage::PreDistortion(Distortion::new(0.4, 1.0))),
            Mood::Happy | Mood::Melancholic => None,
        };
        Self {
            mood_stage,
            reverb: Reverb::new(4.0, 0.4, sample_rate),
            delay: FeedbackDelay::new(beat_secs / 2.0, 0.3, sample_rate),
            distortion: Distortion::new(0.8, 0.0),
            crusher: BitCrusher::new(),
        }
    }

    pub fn layout(&self) -> Vec<EffectKind> {
        let mut kinds = Vec::with_capacity(6);
        match self.mood_stage {
            Some(MoodStage::Chorus(_)) => kinds.push(EffectKind::Chorus),
            Some(MoodStage::PreDistortion(_)) => kinds.push(EffectKind::PreDistortion),
            None => {}
        }
        kinds.extend([
            EffectKind::Reverb,
            EffectKind::Delay,
            EffectKind::Distortion,
            EffectKind::BitCrusher,
        ]);
        kinds
    }

    /// Point the stress-driven ramps at their new targets
    pub fn modulate(&mut self, stress: f32, sample_rate: f32) {
        let drive = if stress > DISTORTION_ONSET { stress } else { 0.0 };
        self.distortion.wet.ramp_to(drive, 0.1, sample_rate);
        if stress > CRUSH_STRESS {
            self.crusher.bits.ramp_to(CRUSHED_BITS, 0.2, sample_rate);
            self.crusher.wet.ramp_to(1.0, 0.2, sample_rate);
        } else {
            self.crusher.bits.ramp_to(CLEAN_BITS, 0.5, sample_rate);
            self.crusher.wet.ramp_to(0.0, 0.5, sample_rate);
        }
    }

    pub fn distortion(&self) -> &Distortion {
        &self.distortion
    }

    pub fn crusher(&self) -> &BitCrusher {
        &self.crusher
    }

    /// Mix the melodic and bass buses through the chain.
    ///
    /// Both buses also reach the output dry; the mood stage feeds reverb and
    /// delay in place of the raw voice when present.
    pub fn process(&mut self, voice: f32, bass: f32) -> f32 {
        let (colored, send) = match &mut self.mood_stage {
            Some(MoodStage::Chorus(c)) => {
                let y = c.process(voice);
                (y, y)
            }
            Some(MoodStage::PreDistortion(d)) => {
                let y = d.process(voice);
                (y, y)
            }
            None => (0.0, voice),
        };
        let space = self.reverb.process(send + bass) + self.delay.process(send);
        let driven = self.crusher.process(self.distortion.process(space));
        voice + bass + colored + driven
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    #[test]
    fn test_ramp_reaches_target() {
        let mut r = Ramp::new(8.0);
        r.ramp_to(4.0, 0.001, SR);
        let n = (0.001 * SR).round() as usize;
        for _ in 0..n - 1 {
            let v = r.next();
            assert!(v > 4.0 && v <= 8.0);
        }
        assert_eq!(r.next(), 4.0);
        assert_eq!(r.next(), 4.0);

        r.ramp_to(1.0, 0.0, SR);
        assert_eq!(r.value(), 1.0);
    }

    #[test]
    fn test_crusher_quantizes_when_wet() {
        let mut c = BitCrusher::new();
        assert_eq!(c.process(0.3), 0.3);
        c.bits.ramp_to(CRUSHED_BITS, 0.0, SR);
        c.wet.ramp_to(1.0, 0.0, SR);
        // 4 bits: step 0.125
        assert_eq!(c.process(0.3), 0.25);
        assert_eq!(c.process(-0.44), -0.5);
    }

    #[test]
    fn test_distortion_identity_when_dry() {
        let mut d = Distortion::new(0.8, 0.0);
        assert_eq!(d.process(0.2), 0.2);
        d.wet.ramp_to(1.0, 0.0, SR);
        let y = d.process(0.2);
        assert!(y > 0.2 && y < 1.0);
        assert!((d.process(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_delay_echoes_after_delay_time() {
        let mut d = FeedbackDelay::new(0.01, 0.3, SR);
        let n = (0.01 * SR) as usize;
        let out: Vec<f32> = (0..3 * n + 2)
            .map(|i| d.process(if i == 0 { 1.0 } else { 0.0 }))
            .collect();
        let first = out.iter().position(|&y| y > 0.5).unwrap();
        assert!((first as i64 - n as i64).abs() <= 1, "{} vs {}", first, n);
        let second = out.iter().skip(first + 2).position(|&y| y > 0.1).unwrap() + first + 2;
        assert!(out[second] < 0.35);
    }

    #[test]
    fn test_reverb_tail_decays() {
        let mut r = Reverb::new(0.5, 1.0, SR);
        let out: Vec<f32> = (0..SR as usize)
            .map(|i| r.process(if i == 0 { 1.0 } else { 0.0 }))
            .collect();
        let energy = |s: &[f32]| s.iter().map(|x| x * x).sum::<f32>();
        let early = energy(&out[..4410]);
        let late = energy(&out[SR as usize - 4410..]);
        assert!(early > 0.0);
        assert!(late < early * 1e-3, "{} vs {}", late, early);
    }

    #[test]
    fn test_layout_by_mood() {
        let layout = |m| EffectChain::for_mood(m, 0.5, SR).layout();
        assert_eq!(layout(Mood::Calm)[0], EffectKind::Chorus);
        assert_eq!(layout(Mood::Mysterious)[0], EffectKind::Chorus);
        assert_eq!(layout(Mood::Aggressive)[0], EffectKind::PreDistortion);
        assert_eq!(
            layout(Mood::Happy),
            vec![
                EffectKind::Reverb,
                EffectKind::Delay,
                EffectKind::Distortion,
                EffectKind::BitCrusher
            ]
        );
        assert_eq!(layout(Mood::Melancholic), layout(Mood::Happy));
    }

    #[test]
    fn test_modulate_targets() {
        let mut chain = EffectChain::for_mood(Mood::Happy, 0.5, SR);
        chain.modulate(0.2, SR);
        assert_eq!(chain.distortion().wet.target(), 0.0);
        assert_eq!(chain.crusher().bits.target(), 8.0);

        chain.modulate(0.5, SR);
        assert_eq!(chain.distortion().wet.target(), 0.5);
        assert_eq!(chain.crusher().wet.target(), 0.0);

        chain.modulate(0.9, SR);
        assert_eq!(chain.distortion().wet.target(), 0.9);
        assert_eq!(chain.crusher().bits.target(), 4.0);
        assert_eq!(chain.crusher().wet.target(), 1.0);
    }

    #[test]
    fn test_silence_in_silence_out() {
        for mood in Mood::ALL {
            let mut chain = EffectChain::for_mood(mood, 0.5, SR);
            chain.modulate(1.0, SR);
            assert!((0..2000).all(|_| chain.process(0.0, 0.0) == 0.0), "{:?}", mood);
        }
    }
}

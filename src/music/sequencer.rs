//! Probabilistic note emission, one decision per quarter note.

use rand::Rng;

use super::scale::{Note, Scale};
use crate::params::MusicParams;
use crate::physiology::PhysioState;

const QUARTER: f32 = 1.0;
const EIGHTH: f32 = 0.5;

/// Note emitted on one tick; durations are in beats
#[derive(Debug, Clone, PartialEq)]
pub enum NoteEvent {
    Bass { note: Note, beats: f32 },
    Melody { notes: Vec<Note>, beats: f32 },
}

/// Chance of a sub-bass hit per tick
pub fn bass_probability(stress: f32, params: &MusicParams) -> f32 {
    (params.bass_base + stress * params.bass_stress_scale).min(params.bass_cap)
}

/// Chance of a melodic note per tick
pub fn density(authored_energy: f32, runtime_energy: f32, params: &MusicParams) -> f32 {
    (params.density_base
        + authored_energy * params.density_authored
        + runtime_energy * params.density_runtime)
        .min(params.density_cap)
}

pub fn base_bpm(growth_speed: f32, params: &MusicParams) -> f32 {
    params.bpm_floor + params.bpm_per_speed * growth_speed
}

#[derive(Debug, Clone)]
pub struct Sequencer {
    scale: Scale,
    authored_energy: f32,
}

impl Sequencer {
    pub fn new(scale: Scale, authored_energy: f32) -> Self {
        Self {
            scale,
            authored_energy,
        }
    }

    /// One quarter-note decision.
    ///
    /// A single draw gates both the bass and the melody, so a bass hit
    /// implies a melodic note whenever density exceeds the bass chance.
    pub fn step<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        physio: PhysioState,
        params: &MusicParams,
    ) -> Vec<NoteEvent> {
        let mut events = Vec::new();
        let r: f32 = rng.gen();

        if r < bass_probability(physio.stress, params) {
            events.push(NoteEvent::Bass {
                note: self.scale.bass_root(),
                beats: EIGHTH,
            });
        }

        if r < density(self.authored_energy, physio.energy, params) {
            let degree = rng.gen_range(0..self.scale.len());
            let beats = if physio.stress > params.staccato_stress || rng.gen_bool(0.5) {
                EIGHTH
            } else {
                QUARTER
            };
            let notes = if rng.gen::<f32>() < params.chord_probability {
                self.scale.triad(degree).to_vec()
            } else {
                vec![self.scale.degree(degree)]
            };
            events.push(NoteEvent::Melody { notes, beats });
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Mood;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn physio(stress: f32, energy: f32) -> PhysioState {
        PhysioState { stress, energy }
    }

    #[test]
    fn test_bass_probability_capped() {
        let p = MusicParams::default();
        assert!((bass_probability(0.0, &p) - 0.15).abs() < 1e-6);
        for i in 0..=20 {
            assert!(bass_probability(i as f32 / 20.0, &p) <= 0.35);
        }
        assert_eq!(bass_probability(1.0, &p), 0.35);
    }

    #[test]
    fn test_density_capped() {
        let p = MusicParams::default();
        assert!((density(0.0, 0.0, &p) - 0.2).abs() < 1e-6);
        assert!((density(1.0, 0.5, &p) - 0.45).abs() < 1e-6);
        assert!((density(1.0, 1.0, &p) - 0.55).abs() < 1e-6);
        let greedy = MusicParams {
            density_runtime: 1.0,
            ..Default::default()
        };
        assert_eq!(density(1.0, 1.0, &greedy), 0.6);
    }

    #[test]
    fn test_base_bpm() {
        let p = MusicParams::default();
        assert_eq!(base_bpm(1.0, &p), 100.0);
        assert_eq!(base_bpm(1.5, &p), 120.0);
    }

    #[test]
    fn test_emission_rates() {
        let p = MusicParams::default();
        let seq = Sequencer::new(Scale::for_mood(Mood::Happy), 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        let ticks = 20_000;
        let (mut bass, mut melody, mut chords) = (0, 0, 0);
        for _ in 0..ticks {
            for e in seq.step(&mut rng, physio(1.0, 0.0), &p) {
                match e {
                    NoteEvent::Bass { .. } => bass += 1,
                    NoteEvent::Melody { notes, .. } => {
                        melody += 1;
                        if notes.len() == 3 {
                            chords += 1;
                        }
                    }
                }
            }
        }
        let rate = |n: usize| n as f32 / ticks as f32;
        assert!((rate(bass) - 0.35).abs() < 0.02, "bass {}", rate(bass));
        assert!((rate(melody) - 0.2).abs() < 0.02, "melody {}", rate(melody));
        let chord_share = chords as f32 / melody as f32;
        assert!((chord_share - 0.15).abs() < 0.03, "chords {}", chord_share);
    }

    #[test]
    fn test_high_stress_is_staccato() {
        let p = MusicParams::default();
        let seq = Sequencer::new(Scale::for_mood(Mood::Aggressive), 1.0);
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = 0;
        for _ in 0..2000 {
            for e in seq.step(&mut rng, physio(0.9, 1.0), &p) {
                if let NoteEvent::Melody { beats, .. } = e {
                    assert_eq!(beats, EIGHTH);
                    seen += 1;
                }
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn test_notes_come_from_scale() {
        let p = MusicParams::default();
        let scale = Scale::for_mood(Mood::Mysterious);
        let seq = Sequencer::new(scale, 0.5);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2000 {
            for e in seq.step(&mut rng, physio(0.2, 0.5), &p) {
                match e {
                    NoteEvent::Bass { note, beats } => {
                        assert_eq!(note, 36);
                        assert_eq!(beats, EIGHTH);
                    }
                    NoteEvent::Melody { notes, .. } => {
                        assert!(notes.iter().all(|n| scale.notes().contains(n)));
                        if let [a, b, c] = notes[..] {
                            let i = scale.notes().iter().position(|&n| n == a).unwrap();
                            assert_eq!([a, b, c], scale.triad(i));
                        }
                    }
                }
            }
        }
    }
}

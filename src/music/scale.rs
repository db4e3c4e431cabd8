//! Mood scales as MIDI note numbers.

use crate::descriptor::Mood;

/// MIDI note number
pub type Note = u8;

/// Seven-note scale selected by mood
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    notes: [Note; 7],
}

impl Scale {
    pub fn for_mood(mood: Mood) -> Self {
        let notes = match mood {
            // C4 D4 E4 G4 A4 C5 D5, major pentatonic
            Mood::Happy => [60, 62, 64, 67, 69, 72, 74],
            // A3 C4 D4 E4 G4 A4 C5, minor pentatonic
            Mood::Melancholic => [57, 60, 62, 64, 67, 69, 72],
            // C4 C#4 E4 F#4 G4 B4 C5
            Mood::Mysterious => [60, 61, 64, 66, 67, 71, 72],
            // C3 C#3 F3 F#3 G3 Bb3 C4
            Mood::Aggressive => [48, 49, 53, 54, 55, 58, 60],
            // C4 D4 E4 F#4 G4 A4 B4, lydian
            Mood::Calm => [60, 62, 64, 66, 67, 69, 71],
        };
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn root(&self) -> Note {
        self.notes[0]
    }

    /// Sub-bass note: the root two octaves down
    pub fn bass_root(&self) -> Note {
        self.root().saturating_sub(24)
    }

    /// Degree `i`, wrapping around the scale
    pub fn degree(&self, i: usize) -> Note {
        self.notes[i % self.notes.len()]
    }

    /// Triad stacked on degree `i` by skipping one scale step twice
    pub fn triad(&self, i: usize) -> [Note; 3] {
        [self.degree(i), self.degree(i + 2), self.degree(i + 4)]
    }
}

/// Equal-tempered frequency, A4 = 440 Hz
pub fn midi_to_hz(note: Note) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_to_hz() {
        assert!((midi_to_hz(69) - 440.0).abs() < 1e-3);
        assert!((midi_to_hz(60) - 261.626).abs() < 0.01);
        assert!((midi_to_hz(57) - 220.0).abs() < 1e-3);
    }

    #[test]
    fn test_bass_root_two_octaves_down() {
        // A3 -> A1, C4 -> C2, C3 -> C1
        assert_eq!(Scale::for_mood(Mood::Melancholic).bass_root(), 33);
        assert_eq!(Scale::for_mood(Mood::Happy).bass_root(), 36);
        assert_eq!(Scale::for_mood(Mood::Aggressive).bass_root(), 24);
    }

    #[test]
    fn test_triad_wraps() {
        let s = Scale::for_mood(Mood::Calm);
        assert_eq!(s.triad(0), [60, 64, 67]);
        assert_eq!(s.triad(5), [69, 60, 64]);
    }

    #[test]
    fn test_every_mood_ascends() {
        for mood in Mood::ALL {
            let s = Scale::for_mood(mood);
            assert_eq!(s.len(), 7);
            assert!(s.notes().windows(2).all(|w| w[0] < w[1]), "{:?}", mood);
        }
    }
}

//! Orchestration (C5 step 4): fold a chord progression's roots and chord
//! tones into a bass and piano register and emit them as [`Part`]s.
//!
//! Grounded on the teacher's `theory::core::transpose` octave-shift math
//! (`frequency * 2^(semitones/12)`), generalized here to integer MIDI
//! register folding rather than a one-shot semitone offset.

use super::part::{Part, PartMap};
use super::theory::{midi_to_freq, ChordSymbol};

pub const BASS_RANGE: (i32, i32) = (28, 48);
pub const PIANO_RANGE: (i32, i32) = (50, 96);

/// Reference octave used before folding: MIDI 60 = C4, pitch class 0.
const REFERENCE_OCTAVE_MIDI: i32 = 60;

pub struct Orchestrator;

impl Orchestrator {
    pub fn new() -> Self {
        Self
    }

    /// Produce `{bass, piano}` parts for a chord progression, each chord
    /// lasting `durations[i]` beats (`spec.md` §4.5 step 4).
    pub fn voice(&self, chords: &[ChordSymbol], durations: &[f64]) -> PartMap {
        let mut bass_notes = Vec::with_capacity(chords.len());
        let mut bass_durations = Vec::with_capacity(chords.len());
        let mut bass_intensity = Vec::with_capacity(chords.len());

        let mut piano_notes = Vec::new();
        let mut piano_durations = Vec::new();
        let mut piano_intensity = Vec::new();

        for (chord, &duration) in chords.iter().zip(durations.iter()) {
            let bass_midi = fold_into_range(chord.root as i32, BASS_RANGE);
            bass_notes.push(midi_to_freq(bass_midi as f64));
            bass_durations.push(duration);
            bass_intensity.push(0.7);

            let tones = chord.chord_tones();
            let per_tone_duration = duration / tones.len().max(1) as f64;
            for pc in tones {
                let midi = fold_into_range(pc as i32, PIANO_RANGE);
                piano_notes.push(midi_to_freq(midi as f64));
                piano_durations.push(per_tone_duration);
                piano_intensity.push(0.6);
            }
        }

        let mut parts = PartMap::new();
        parts.insert(
            "bass".to_string(),
            Part::new(bass_notes, bass_durations, bass_intensity),
        );
        parts.insert(
            "piano".to_string(),
            Part::new(piano_notes, piano_durations, piano_intensity),
        );
        parts
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Folds a pitch class into `range` (inclusive MIDI bounds) by repeatedly
/// shifting by octaves, starting from the reference octave (`spec.md`
/// §4.5: "register folds iterate ±12 semitones until the pitch falls in
/// range").
fn fold_into_range(pitch_class: i32, range: (i32, i32)) -> i32 {
    let mut midi = REFERENCE_OCTAVE_MIDI + pitch_class.rem_euclid(12);
    while midi < range.0 {
        midi += 12;
    }
    while midi > range.1 {
        midi -= 12;
    }
    midi
}

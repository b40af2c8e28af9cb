//! Chord progression synthesis (C5 step 3): genre templates or a Markov
//! T/S/D walk, converted to concrete chord symbols against a key.
//!
//! Grounded on the teacher's `sequences::generative::markov` chain-walk
//! pattern for the fallback mode and `theory::core::ProgressionType` for
//! the idea of named progression templates (the concrete Roman numeral
//! lists themselves come from `spec.md` §4.5).

use rand::Rng;

use super::theory::{
    function_of_degree, numerals_for_function, resolve_roman, ChordSymbol, Function, KeyMode,
    KeySymbol,
};

pub const DEFAULT_BAR_BEATS: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genre {
    Pop,
    Rock,
    Blues,
    Jazz,
    Classical,
    Funk,
}

impl Genre {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pop" => Some(Genre::Pop),
            "rock" => Some(Genre::Rock),
            "blues" => Some(Genre::Blues),
            "jazz" => Some(Genre::Jazz),
            "classical" => Some(Genre::Classical),
            "funk" => Some(Genre::Funk),
            _ => None,
        }
    }

    pub fn template(&self) -> &'static [&'static str] {
        match self {
            Genre::Pop => &["I", "V", "vi", "IV"],
            Genre::Rock => &["I", "IV", "V"],
            Genre::Blues => &["I", "IV", "I", "V"],
            Genre::Jazz => &["ii", "V", "I"],
            Genre::Classical => &["I", "vi", "ii", "V"],
            Genre::Funk => &["I", "bVII", "IV", "I"],
        }
    }
}

enum Mode {
    Genre(Genre),
    Markov { temperature: f64 },
}

pub struct ProgressionSynth {
    mode: Mode,
    bar_beats: f64,
}

impl ProgressionSynth {
    /// `genre` names a known template (case-insensitive); anything else
    /// (including `None`) falls back to the Markov walk.
    pub fn new(genre: Option<&str>) -> Self {
        let mode = match genre.and_then(Genre::parse) {
            Some(g) => Mode::Genre(g),
            None => Mode::Markov { temperature: 0.5 },
        };
        Self { mode, bar_beats: DEFAULT_BAR_BEATS }
    }

    pub fn markov(temperature: f64) -> Self {
        Self {
            mode: Mode::Markov { temperature: temperature.clamp(0.0, 1.0) },
            bar_beats: DEFAULT_BAR_BEATS,
        }
    }

    pub fn with_bar_beats(mut self, bar_beats: f64) -> Self {
        self.bar_beats = bar_beats.max(1e-6);
        self
    }

    /// Number of bars for a given beat count, per `spec.md` §4.5 step 3:
    /// `n = round(beats / bar_beats)`, floored at 1 bar.
    pub fn bar_count(&self, beats: f64) -> usize {
        (beats / self.bar_beats).round().max(1.0) as usize
    }

    /// Produce a concrete chord-symbol sequence of length `bar_count(beats)`.
    pub fn next(&self, key: &KeySymbol, beats: f64) -> Vec<ChordSymbol> {
        let n = self.bar_count(beats);
        let numerals = match &self.mode {
            Mode::Genre(genre) => repeat_truncate(genre.template(), n),
            Mode::Markov { temperature } => markov_walk(key.mode, *temperature, n),
        };
        numerals.iter().map(|num| resolve_roman(num, key)).collect()
    }
}

fn repeat_truncate(template: &'static [&'static str], n: usize) -> Vec<&'static str> {
    if template.is_empty() || n == 0 {
        return Vec::new();
    }
    (0..n).map(|i| template[i % template.len()]).collect()
}

/// Walks the T -> {S, D, T} (3:2:1), S -> {D, T} (4:1), D -> {T, S} (5:1)
/// function Markov chain for `n` steps, then samples a numeral uniformly
/// from each chosen function's diatonic pool. `temperature` blends between
/// always taking the heaviest-weighted transition/numeral (0.0) and a
/// fully weighted-random walk (1.0) — this tie-breaking knob isn't pinned
/// down further by `spec.md`, so it's resolved here as a deterministic/
/// random blend rather than, say, a softmax over the weights (see
/// DESIGN.md).
fn markov_walk(mode: KeyMode, temperature: f64, n: usize) -> Vec<&'static str> {
    let mut rng = rand::rng();
    let mut function = Function::Tonic;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let pool = numerals_for_function(function, mode);
        let numeral = if temperature <= 0.0 {
            pool[0]
        } else if rng.random::<f64>() < temperature {
            pool[rng.random_range(0..pool.len())]
        } else {
            pool[0]
        };
        out.push(numeral);
        function = step_function(function, temperature, &mut rng);
    }
    out
}

fn step_function(current: Function, temperature: f64, rng: &mut impl Rng) -> Function {
    let weighted: &[(Function, u32)] = match current {
        Function::Tonic => &[(Function::Subdominant, 3), (Function::Dominant, 2), (Function::Tonic, 1)],
        Function::Subdominant => &[(Function::Dominant, 4), (Function::Tonic, 1)],
        Function::Dominant => &[(Function::Tonic, 5), (Function::Subdominant, 1)],
    };
    if temperature <= 0.0 {
        return weighted[0].0;
    }
    let total: u32 = weighted.iter().map(|(_, w)| w).sum();
    let roll = if rng.random::<f64>() < temperature {
        rng.random_range(0..total)
    } else {
        0
    };
    let mut acc = 0;
    for (function, weight) in weighted {
        acc += weight;
        if roll < acc {
            return *function;
        }
    }
    weighted[0].0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_pop_progression_in_c() {
        let key = KeySymbol::new(0, KeyMode::Major);
        let synth = ProgressionSynth::new(Some("pop"));
        let chords: Vec<String> = synth.next(&key, 16.0).iter().map(|c| c.to_string()).collect();
        assert_eq!(chords, vec!["C", "G", "Am", "F"]);
    }

    #[test]
    fn test_coverage_every_genre_every_beat_count() {
        let key = KeySymbol::new(0, KeyMode::Major);
        for genre in ["pop", "rock", "blues", "jazz", "classical", "funk"] {
            let synth = ProgressionSynth::new(Some(genre));
            for beats in 1..=64 {
                let chords = synth.next(&key, beats as f64);
                assert!(!chords.is_empty());
                assert_eq!(chords.len(), synth.bar_count(beats as f64));
            }
        }
    }

    #[test]
    fn test_markov_fallback_produces_nonempty_sequence() {
        let key = KeySymbol::new(0, KeyMode::Minor);
        let synth = ProgressionSynth::new(Some("not-a-genre"));
        for beats in [1.0, 8.0, 33.0, 64.0] {
            let chords = synth.next(&key, beats);
            assert_eq!(chords.len(), synth.bar_count(beats));
        }
    }

    #[test]
    fn test_bvii_appears_in_funk_template() {
        let key = KeySymbol::new(2, KeyMode::Major); // D major
        let synth = ProgressionSynth::new(Some("funk"));
        let chords = synth.next(&key, 16.0);
        // I bVII IV I -> D, C, G, D
        assert_eq!(chords[1].root, 0); // C
    }
}

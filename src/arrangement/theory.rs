//! Pitch-class arithmetic, chord symbols, and Roman-numeral resolution.
//!
//! Everything here works in MIDI-ish integer pitch space (pitch class
//! 0..12, octave-free) rather than the teacher's frequency-first
//! `theory::core`, because harmonic analysis and progression synthesis
//! both reason about scale degrees, not absolute Hz. The orchestrator
//! (`arrangement::orchestrator`) is the one place pitch classes get folded
//! into a MIDI register and converted back to Hz for a [`super::part::Part`].

use std::fmt;

/// A pitch class, 0 (C) through 11 (B).
pub type PitchClass = u8;

pub const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub fn pitch_class_name(pc: PitchClass) -> &'static str {
    PITCH_NAMES[(pc % 12) as usize]
}

/// Parse a pitch-class name (`"C"`, `"F#"`, `"Bb"`) back to a pitch class.
/// Returns `None` for anything unrecognized.
pub fn parse_pitch_class(name: &str) -> Option<PitchClass> {
    let name = name.trim();
    for (pc, candidate) in PITCH_NAMES.iter().enumerate() {
        if *candidate == name {
            return Some(pc as PitchClass);
        }
    }
    // Accept flats by mapping to the enharmonic sharp.
    let flats = ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B"];
    flats.iter().position(|c| *c == name).map(|pc| pc as PitchClass)
}

pub fn midi_to_freq(midi: f64) -> f64 {
    440.0 * 2f64.powf((midi - 69.0) / 12.0)
}

pub fn freq_to_midi(freq_hz: f64) -> f64 {
    if freq_hz <= 0.0 {
        return 0.0;
    }
    69.0 + 12.0 * (freq_hz / 440.0).log2()
}

/// Diatonic scale degree of the key's mode, relative semitone offsets from
/// the tonic. Only major/natural-minor are modeled — the two modes the
/// harmonic analyser's 24 triad templates distinguish.
pub const MAJOR_SCALE: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];
pub const NATURAL_MINOR_SCALE: [i32; 7] = [0, 2, 3, 5, 7, 8, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySymbol {
    pub tonic: PitchClass,
    pub mode: KeyMode,
}

impl KeySymbol {
    pub fn new(tonic: PitchClass, mode: KeyMode) -> Self {
        Self { tonic, mode }
    }

    /// Root pitch class of the `degree`-th scale step (1-indexed, wraps
    /// past 7 the way a progression walking more than one octave would).
    pub fn degree_root(&self, degree: u8) -> PitchClass {
        let scale = match self.mode {
            KeyMode::Major => &MAJOR_SCALE,
            KeyMode::Minor => &NATURAL_MINOR_SCALE,
        };
        let idx = ((degree.saturating_sub(1)) as usize) % 7;
        (self.tonic as i32 + scale[idx]).rem_euclid(12) as PitchClass
    }

    /// Scale degree (1-7) that `pc` sits on in this key's diatonic scale,
    /// or `None` if `pc` isn't one of the seven scale tones.
    pub fn degree_of(&self, pc: PitchClass) -> Option<u8> {
        let scale = match self.mode {
            KeyMode::Major => &MAJOR_SCALE,
            KeyMode::Minor => &NATURAL_MINOR_SCALE,
        };
        let offset = (pc as i32 - self.tonic as i32).rem_euclid(12);
        scale.iter().position(|&s| s == offset).map(|i| (i + 1) as u8)
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            KeyMode::Major => "major",
            KeyMode::Minor => "minor",
        };
        write!(f, "{} {}", pitch_class_name(self.tonic), mode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Major,
    Minor,
    Dominant7,
    /// Not one of the three suffixes the data model names explicitly, but
    /// needed to represent `vii°` when the Markov fallback samples a
    /// dominant-function numeral (see `spec.md` §4.5/§9).
    Diminished,
}

impl Quality {
    fn suffix(&self) -> &'static str {
        match self {
            Quality::Major => "",
            Quality::Minor => "m",
            Quality::Dominant7 => "7",
            Quality::Diminished => "dim",
        }
    }

    /// Chord tones as semitone offsets from the root.
    pub fn intervals(&self) -> &'static [i32] {
        match self {
            Quality::Major => &[0, 4, 7],
            Quality::Minor => &[0, 3, 7],
            Quality::Dominant7 => &[0, 4, 7, 10],
            Quality::Diminished => &[0, 3, 6],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordSymbol {
    pub root: PitchClass,
    pub quality: Quality,
}

impl ChordSymbol {
    pub fn new(root: PitchClass, quality: Quality) -> Self {
        Self { root, quality }
    }

    pub fn chord_tones(&self) -> Vec<PitchClass> {
        self.quality
            .intervals()
            .iter()
            .map(|i| (self.root as i32 + i).rem_euclid(12) as PitchClass)
            .collect()
    }
}

impl fmt::Display for ChordSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", pitch_class_name(self.root), self.quality.suffix())
    }
}

/// Harmonic function a chord plays in a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Tonic,
    Subdominant,
    Dominant,
}

/// Scale-degree-based function assignment (`spec.md` §4.5 step 2): degrees
/// 5 and 7 (`V`, `vii°`) are Dominant, 2 and 4 (`ii`, `IV`) are
/// Subdominant, everything else is Tonic. This is independent of the
/// matched triad's actual quality — the 24 analysis templates are all
/// plain major/minor triads, so "vii°" here names the scale-degree slot,
/// not an analyzed diminished chord.
pub fn function_of_degree(degree: u8) -> Function {
    match degree {
        5 | 7 => Function::Dominant,
        2 | 4 => Function::Subdominant,
        _ => Function::Tonic,
    }
}

/// Roman numeral naming for each scale degree, used both to label analysis
/// output and to enumerate the Markov fallback's per-function numeral pool.
pub fn numeral_for_degree(degree: u8, mode: KeyMode) -> &'static str {
    // Diatonic triad qualities: major key I ii iii IV V vi vii°;
    // minor key i ii° III iv v VI VII (natural minor). The engine only
    // ever resolves chord *quality* from the numeral's own case/suffix
    // (see `resolve_roman`), so this table exists purely for display/
    // lookup of "the numeral that names this scale degree".
    match (mode, degree) {
        (KeyMode::Major, 1) => "I",
        (KeyMode::Major, 2) => "ii",
        (KeyMode::Major, 3) => "iii",
        (KeyMode::Major, 4) => "IV",
        (KeyMode::Major, 5) => "V",
        (KeyMode::Major, 6) => "vi",
        (KeyMode::Major, 7) => "vii\u{b0}",
        (KeyMode::Minor, 1) => "i",
        (KeyMode::Minor, 2) => "ii\u{b0}",
        (KeyMode::Minor, 3) => "III",
        (KeyMode::Minor, 4) => "iv",
        (KeyMode::Minor, 5) => "v",
        (KeyMode::Minor, 6) => "VI",
        (KeyMode::Minor, 7) => "VII",
        _ => "I",
    }
}

/// Resolve a Roman numeral string (`"I"`, `"ii"`, `"V7"`, `"vii\u{b0}"`,
/// `"bVII"`) to a concrete [`ChordSymbol`] in `key`.
///
/// Root comes from resolving the scale degree against the key; quality
/// comes from the numeral's own case and suffix, per `spec.md` §4.5:
/// uppercase = major, lowercase = minor, `°` = diminished, `7` suffix =
/// dominant. `bVII` is the one documented special case (open question in
/// `spec.md` §9): root = `(tonic + 10) mod 12`, quality major, regardless
/// of key mode.
pub fn resolve_roman(numeral: &str, key: &KeySymbol) -> ChordSymbol {
    if numeral.eq_ignore_ascii_case("bVII") {
        let root = (key.tonic as i32 + 10).rem_euclid(12) as PitchClass;
        return ChordSymbol::new(root, Quality::Major);
    }

    let diminished = numeral.ends_with('\u{b0}');
    let dominant7 = numeral.ends_with('7');
    let letters: String = numeral
        .chars()
        .filter(|c| matches!(c, 'I' | 'V' | 'i' | 'v'))
        .collect();
    let is_upper = letters.chars().next().map(char::is_uppercase).unwrap_or(true);

    let degree = roman_to_degree(&letters.to_uppercase()).unwrap_or(1);
    let root = key.degree_root(degree);

    let quality = if diminished {
        Quality::Diminished
    } else if dominant7 {
        Quality::Dominant7
    } else if is_upper {
        Quality::Major
    } else {
        Quality::Minor
    };
    ChordSymbol::new(root, quality)
}

fn roman_to_degree(letters: &str) -> Option<u8> {
    match letters {
        "I" => Some(1),
        "II" => Some(2),
        "III" => Some(3),
        "IV" => Some(4),
        "V" => Some(5),
        "VI" => Some(6),
        "VII" => Some(7),
        _ => None,
    }
}

/// All diatonic numerals belonging to a given function, used by the
/// Markov fallback to sample uniformly within a chosen function.
pub fn numerals_for_function(function: Function, mode: KeyMode) -> Vec<&'static str> {
    (1..=7u8)
        .filter(|&d| function_of_degree(d) == function)
        .map(|d| numeral_for_degree(d, mode))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_root_c_major() {
        let key = KeySymbol::new(0, KeyMode::Major);
        assert_eq!(key.degree_root(1), 0); // C
        assert_eq!(key.degree_root(5), 7); // G
        assert_eq!(key.degree_root(4), 5); // F
    }

    #[test]
    fn test_resolve_roman_pop_progression_in_c() {
        let key = KeySymbol::new(0, KeyMode::Major);
        let chords: Vec<String> = ["I", "V", "vi", "IV"]
            .iter()
            .map(|n| resolve_roman(n, &key).to_string())
            .collect();
        assert_eq!(chords, vec!["C", "G", "Am", "F"]);
    }

    #[test]
    fn test_bvii_resolves_flat_seven_major() {
        let key = KeySymbol::new(0, KeyMode::Major);
        let chord = resolve_roman("bVII", &key);
        assert_eq!(chord.root, 10); // Bb
        assert_eq!(chord.quality, Quality::Major);
    }

    #[test]
    fn test_function_of_degree_matches_spec_table() {
        assert_eq!(function_of_degree(5), Function::Dominant);
        assert_eq!(function_of_degree(7), Function::Dominant);
        assert_eq!(function_of_degree(2), Function::Subdominant);
        assert_eq!(function_of_degree(4), Function::Subdominant);
        assert_eq!(function_of_degree(1), Function::Tonic);
        assert_eq!(function_of_degree(6), Function::Tonic);
    }

    #[test]
    fn test_midi_freq_round_trip() {
        let midi = 69.0;
        assert!((midi_to_freq(midi) - 440.0).abs() < 1e-9);
        assert!((freq_to_midi(440.0) - 69.0).abs() < 1e-9);
    }
}

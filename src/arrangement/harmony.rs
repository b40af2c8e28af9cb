//! Harmonic analysis (C5 step 2): Krumhansl–Schmuckler key estimation over
//! a pitch-class histogram, then per-window triad matching against the 24
//! major/minor templates.

use super::theory::{function_of_degree, ChordSymbol, Function, KeyMode, KeySymbol, Quality};
use crate::error::{MaestroError, Result};

/// Krumhansl-Kessler key profiles (tonal hierarchy ratings), the standard
/// reference weighting for pitch classes 0..12 relative to the tonic.
const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];
const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicAnalysis {
    pub key: KeySymbol,
    pub chords: Vec<ChordSymbol>,
    pub functions: Vec<Function>,
    pub durations: Vec<f64>,
}

/// One note in the span being analyzed: frequency in Hz (0 = rest) and its
/// duration in beats.
pub type AnalysisNote = (f64, f64);

pub struct HarmonicAnalyser;

impl HarmonicAnalyser {
    pub fn new() -> Self {
        Self
    }

    /// Estimate key and chord progression for a melodic span.
    ///
    /// `spec.md` §4.5 step 1-2. `AnalysisDegenerate` (empty span) resolves
    /// to C major tonic triads rather than erroring, per the error taxonomy
    /// in `spec.md` §7.
    pub fn describe(&self, notes: &[AnalysisNote]) -> Result<HarmonicAnalysis> {
        let sounding: Vec<&AnalysisNote> = notes.iter().filter(|(f, _)| *f > 0.0).collect();
        if sounding.is_empty() {
            return Ok(degenerate_analysis(notes.iter().map(|(_, d)| *d).sum()));
        }

        let key = estimate_key(&sounding);

        let total_beats: f64 = notes.iter().map(|(_, d)| *d).sum();
        let windows = partition_into_windows(notes, total_beats);

        let mut chords = Vec::with_capacity(windows.len());
        let mut functions = Vec::with_capacity(windows.len());
        let mut durations = Vec::with_capacity(windows.len());

        for window in &windows {
            let window_notes: Vec<&AnalysisNote> =
                window.notes.iter().filter(|(f, _)| *f > 0.0).collect();
            let (chord, function) = if window_notes.is_empty() {
                (tonic_triad(&key), Function::Tonic)
            } else {
                match_best_triad(&window_notes, &key)
            };
            chords.push(chord);
            functions.push(function);
            durations.push(window.duration);
        }

        Ok(HarmonicAnalysis {
            key,
            chords,
            functions,
            durations,
        })
    }
}

impl Default for HarmonicAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

fn degenerate_analysis(total_beats: f64) -> HarmonicAnalysis {
    let key = KeySymbol::new(0, KeyMode::Major);
    let span = if total_beats > 0.0 { total_beats } else { 1.0 };
    HarmonicAnalysis {
        key,
        chords: vec![tonic_triad(&key)],
        functions: vec![Function::Tonic],
        durations: vec![span],
    }
}

fn tonic_triad(key: &KeySymbol) -> ChordSymbol {
    let quality = match key.mode {
        KeyMode::Major => Quality::Major,
        KeyMode::Minor => Quality::Minor,
    };
    ChordSymbol::new(key.tonic, quality)
}

fn pitch_class_histogram(notes: &[&AnalysisNote]) -> [f64; 12] {
    let mut hist = [0.0; 12];
    for (freq, duration) in notes {
        let pc = frequency_to_pitch_class(*freq);
        hist[pc as usize] += duration.max(0.0);
    }
    hist
}

fn frequency_to_pitch_class(freq_hz: f64) -> u8 {
    let midi = 69.0 + 12.0 * (freq_hz / 440.0).log2();
    (midi.round() as i64).rem_euclid(12) as u8
}

/// Pearson correlation of `histogram` against `profile` rotated to put
/// `tonic` at index 0.
fn correlate(histogram: &[f64; 12], profile: &[f64; 12], tonic: u8) -> f64 {
    let rotated: Vec<f64> = (0..12)
        .map(|i| profile[((i + 12 - tonic as usize) % 12) as usize])
        .collect();
    let mean_h = histogram.iter().sum::<f64>() / 12.0;
    let mean_p = rotated.iter().sum::<f64>() / 12.0;
    let mut num = 0.0;
    let mut den_h = 0.0;
    let mut den_p = 0.0;
    for i in 0..12 {
        let dh = histogram[i] - mean_h;
        let dp = rotated[i] - mean_p;
        num += dh * dp;
        den_h += dh * dh;
        den_p += dp * dp;
    }
    if den_h <= 0.0 || den_p <= 0.0 {
        return 0.0;
    }
    num / (den_h.sqrt() * den_p.sqrt())
}

fn estimate_key(notes: &[&AnalysisNote]) -> KeySymbol {
    let hist = pitch_class_histogram(notes);
    let mut best = KeySymbol::new(0, KeyMode::Major);
    let mut best_score = f64::NEG_INFINITY;
    for tonic in 0..12u8 {
        let major_score = correlate(&hist, &MAJOR_PROFILE, tonic);
        if major_score > best_score {
            best_score = major_score;
            best = KeySymbol::new(tonic, KeyMode::Major);
        }
        let minor_score = correlate(&hist, &MINOR_PROFILE, tonic);
        if minor_score > best_score {
            best_score = minor_score;
            best = KeySymbol::new(tonic, KeyMode::Minor);
        }
    }
    best
}

struct Window<'a> {
    notes: Vec<&'a AnalysisNote>,
    duration: f64,
}

/// Splits the span into integer-beat windows (`spec.md` §4.5 step 2), with
/// a final fractional window if the span isn't a whole number of beats —
/// window durations always sum exactly to `total_beats` (law 4's
/// tolerance), which a naive `round()`-based window count would violate.
fn partition_into_windows<'a>(notes: &'a [AnalysisNote], total_beats: f64) -> Vec<Window<'a>> {
    if total_beats <= 0.0 {
        return Vec::new();
    }
    let full_windows = total_beats.floor() as usize;
    let remainder = total_beats - full_windows as f64;
    let mut durations: Vec<f64> = vec![1.0; full_windows];
    if remainder > 1e-9 {
        durations.push(remainder);
    } else if durations.is_empty() {
        durations.push(total_beats);
    }

    let window_count = durations.len();
    let mut windows: Vec<Window<'a>> = durations
        .into_iter()
        .map(|duration| Window { notes: Vec::new(), duration })
        .collect();

    let mut cursor = 0.0f64;
    for note in notes {
        let start = cursor;
        let end = cursor + note.1;
        let first_window = (start.floor() as usize).min(window_count - 1);
        let last_window = ((end - 1e-9).floor().max(0.0) as usize).min(window_count - 1);
        for w in first_window..=last_window {
            windows[w].notes.push(note);
        }
        cursor = end;
    }
    windows
}

/// Matches a window's pitch-class histogram against all 24 triad
/// templates (12 major, 12 minor), picking the max-score template with
/// ties broken by preferring the tonic-containing template.
fn match_best_triad(notes: &[&AnalysisNote], key: &KeySymbol) -> (ChordSymbol, Function) {
    let hist = pitch_class_histogram(notes);
    let mut best: Option<(f64, ChordSymbol)> = None;

    for root in 0..12u8 {
        for quality in [Quality::Major, Quality::Minor] {
            let chord = ChordSymbol::new(root, quality);
            let score = chord
                .chord_tones()
                .iter()
                .map(|pc| hist[*pc as usize])
                .sum::<f64>();
            let contains_tonic = chord.chord_tones().contains(&key.tonic);
            let better = match &best {
                None => true,
                Some((best_score, best_chord)) => {
                    score > *best_score
                        || (score == *best_score
                            && contains_tonic
                            && !best_chord.chord_tones().contains(&key.tonic))
                }
            };
            if better {
                best = Some((score, chord));
            }
        }
    }

    let chord = best.map(|(_, c)| c).unwrap_or_else(|| tonic_triad(key));
    let function = key
        .degree_of(chord.root)
        .map(function_of_degree)
        .unwrap_or(Function::Tonic);
    (chord, function)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s2_c_major_triad() {
        let analyser = HarmonicAnalyser::new();
        let notes = vec![(261.63, 1.0), (329.63, 1.0), (392.0, 1.0)];
        let analysis = analyser.describe(&notes).unwrap();
        assert_eq!(analysis.key.to_string(), "C major");
        assert_eq!(
            analysis.chords.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
            vec!["C", "C", "C"]
        );
        assert!(analysis.functions.iter().all(|f| *f == Function::Tonic));
    }

    #[test]
    fn test_durations_sum_matches_span() {
        let analyser = HarmonicAnalyser::new();
        let notes = vec![(261.63, 2.0), (293.66, 1.5), (329.63, 0.5)];
        let total: f64 = notes.iter().map(|(_, d)| d).sum();
        let analysis = analyser.describe(&notes).unwrap();
        let sum: f64 = analysis.durations.iter().sum();
        assert!((sum - total).abs() < 1e-6);
    }

    #[test]
    fn test_empty_span_is_degenerate_tonic() {
        let analyser = HarmonicAnalyser::new();
        let notes: Vec<AnalysisNote> = vec![(0.0, 4.0)];
        let analysis = analyser.describe(&notes).unwrap();
        assert_eq!(analysis.chords, vec![ChordSymbol::new(0, Quality::Major)]);
        assert_eq!(analysis.functions, vec![Function::Tonic]);
    }
}

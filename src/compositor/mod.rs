//! The Compositor (C4): the melody repository. Loads all melody files
//! from a directory at construction, tracks per-hand playhead state for
//! whichever melody is active, and emits parallel note events to drive
//! the arranger.

pub mod melody;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rand::Rng;

pub use melody::{Hand, Melody, NoteEvent};

use crate::error::{MaestroError, Result};

pub struct Compositor {
    melodies: BTreeMap<String, Melody>,
    active: Option<String>,
    playheads: Vec<usize>,
}

impl Compositor {
    /// Loads every `*.json` file in `dir` as a melody, keyed by file stem.
    /// Malformed files are skipped with a warning; the compositor still
    /// constructs successfully as long as the directory itself is
    /// readable (an empty or all-malformed directory is a valid, if
    /// useless, compositor).
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut melodies = BTreeMap::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let name = match path.file_stem().and_then(|s| s.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            let text = match fs::read_to_string(&path) {
                Ok(t) => t,
                Err(e) => {
                    log::warn!("skipping melody file {}: {}", path.display(), e);
                    continue;
                }
            };
            match Melody::parse(&text) {
                Ok(m) => {
                    melodies.insert(name, m);
                }
                Err(e) => {
                    log::warn!("skipping malformed melody {}: {}", path.display(), e);
                }
            }
        }
        Ok(Self { melodies, active: None, playheads: Vec::new() })
    }

    /// Builds a compositor from already-parsed melodies (used by tests and
    /// any caller that doesn't want directory I/O).
    pub fn from_melodies(melodies: BTreeMap<String, Melody>) -> Self {
        Self { melodies, active: None, playheads: Vec::new() }
    }

    pub fn melody_names(&self) -> Vec<&str> {
        self.melodies.keys().map(String::as_str).collect()
    }

    /// Loads the named melody's hands and resets per-hand playhead indices
    /// to 0 (`spec.md` §4.4).
    pub fn start(&mut self, name: &str) -> Result<()> {
        let melody = self
            .melodies
            .get(name)
            .ok_or_else(|| MaestroError::MalformedMelody(format!("no melody named '{name}'")))?;
        self.playheads = vec![0; melody.hands.len()];
        self.active = Some(name.to_string());
        Ok(())
    }

    fn active_melody(&self) -> Option<&Melody> {
        self.active.as_ref().and_then(|n| self.melodies.get(n))
    }

    /// One sample per hand, advancing each hand's playhead index modulo
    /// that hand's length — independent playheads, so hands of different
    /// lengths polymetrically desynchronize by design (`spec.md` §4.4).
    /// Never blocks, never allocates beyond the returned vectors.
    pub fn next_event(&mut self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let Some(melody) = self.active_melody() else {
            return (Vec::new(), Vec::new(), Vec::new());
        };
        let hand_count = melody.hands.len();
        let mut notes = Vec::with_capacity(hand_count);
        let mut durations = Vec::with_capacity(hand_count);
        let mut intensities = Vec::with_capacity(hand_count);

        for (hand_idx, hand) in melody.hands.iter().enumerate() {
            if hand.events.is_empty() {
                continue;
            }
            let idx = self.playheads[hand_idx] % hand.events.len();
            let event = hand.events[idx];
            notes.push(event.frequency_hz);
            durations.push(event.duration_beats);
            intensities.push(event.intensity);
            self.playheads[hand_idx] = (idx + 1) % hand.events.len();
        }
        (notes, durations, intensities)
    }

    /// Entire first-hand sequence of the active melody, for analysis
    /// lookahead (`spec.md` §4.4).
    pub fn get_full_sequence(&self) -> Vec<NoteEvent> {
        self.active_melody()
            .and_then(|m| m.hands.first())
            .map(|h| h.events.clone())
            .unwrap_or_default()
    }

    pub fn get_tempo(&self, default: f64) -> f64 {
        self.active_melody().and_then(|m| m.tempo_bpm).unwrap_or(default)
    }

    pub fn get_meter(&self) -> (u32, u32) {
        self.active_melody().map(|m| m.time_signature).unwrap_or((4, 4))
    }

    /// A Bernoulli trial used by higher layers for stochastic accents.
    pub fn sprinkle(&self, p: f64) -> bool {
        rand::rng().random::<f64>() < p.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use melody::Melody;

    fn two_note_melody() -> Melody {
        Melody::parse(
            r#"{
                "tempo": 120,
                "time_signature": "4/4",
                "hands": [[
                    {"frequency": 440, "duration_beats": 1},
                    {"frequency": 523.25, "duration_beats": 1}
                ]]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_s1_eight_calls_alternate_and_repeat() {
        let mut melodies = BTreeMap::new();
        melodies.insert("two_note".to_string(), two_note_melody());
        let mut compositor = Compositor::from_melodies(melodies);
        compositor.start("two_note").unwrap();

        let mut notes = Vec::new();
        let mut durations = Vec::new();
        let mut intensities = Vec::new();
        for _ in 0..8 {
            let (n, d, i) = compositor.next_event();
            notes.push(n[0]);
            durations.push(d[0]);
            intensities.push(i[0]);
        }
        assert_eq!(notes, vec![440.0, 523.25, 440.0, 523.25, 440.0, 523.25, 440.0, 523.25]);
        assert_eq!(durations, vec![1.0; 8]);
        assert_eq!(intensities, vec![0.8; 8]);
    }

    #[test]
    fn test_determinism_law_1_repeats_k_times_after_restart() {
        let mut melodies = BTreeMap::new();
        melodies.insert("two_note".to_string(), two_note_melody());
        let mut compositor = Compositor::from_melodies(melodies);
        compositor.start("two_note").unwrap();

        let k = 3;
        let hand_len = 2;
        let mut seen = std::collections::HashMap::new();
        for _ in 0..(k * hand_len) {
            let (n, _, _) = compositor.next_event();
            *seen.entry(n[0].to_bits()).or_insert(0) += 1;
        }
        for count in seen.values() {
            assert_eq!(*count, k);
        }

        compositor.start("two_note").unwrap();
        let (n, _, _) = compositor.next_event();
        assert_eq!(n[0], 440.0);
    }

    #[test]
    fn test_polymetric_hands_desynchronize() {
        let melody = Melody::parse(
            r#"{"hands": [
                [{"frequency": 100, "duration_beats": 1}, {"frequency": 200, "duration_beats": 1}],
                [{"frequency": 300, "duration_beats": 1}, {"frequency": 400, "duration_beats": 1}, {"frequency": 500, "duration_beats": 1}]
            ]}"#,
        )
        .unwrap();
        let mut melodies = BTreeMap::new();
        melodies.insert("poly".to_string(), melody);
        let mut compositor = Compositor::from_melodies(melodies);
        compositor.start("poly").unwrap();

        let mut hand_a = Vec::new();
        let mut hand_b = Vec::new();
        for _ in 0..6 {
            let (n, _, _) = compositor.next_event();
            hand_a.push(n[0]);
            hand_b.push(n[1]);
        }
        assert_eq!(hand_a, vec![100.0, 200.0, 100.0, 200.0, 100.0, 200.0]);
        assert_eq!(hand_b, vec![300.0, 400.0, 500.0, 300.0, 400.0, 500.0]);
    }

    #[test]
    fn test_sprinkle_extremes() {
        let compositor = Compositor::from_melodies(BTreeMap::new());
        assert!(!compositor.sprinkle(0.0));
        assert!(compositor.sprinkle(1.0));
    }
}

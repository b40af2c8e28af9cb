//! The arrangement pipeline (C5): turns a rolling window of melody events
//! into a harmonic analysis, a chord progression, a fully-voiced part map,
//! an auto-mix pass, and finally a batch of `play_preset` commands.
//!
//! Each submodule is one pipeline stage; [`Arranger`] is the thing that
//! actually runs them in order once per block, matching `spec.md` §4.5's
//! six numbered steps.

pub mod automix;
pub mod harmony;
pub mod orchestrator;
pub mod part;
pub mod progression;
pub mod theory;

use std::collections::BTreeMap;

use automix::AutoMixer;
use harmony::{AnalysisNote, HarmonicAnalyser};
use orchestrator::Orchestrator;
use part::{Part, PartMap};
use progression::ProgressionSynth;

use crate::command::{AudioCommand, AudioSink};
use crate::compositor::Compositor;
use crate::error::Result;
use crate::presets::ParamMap;
use crate::presets::ParamValue;

pub struct Arranger {
    analyser: HarmonicAnalyser,
    orchestrator: Orchestrator,
    mixer: AutoMixer,
    target_lufs: f64,
}

impl Arranger {
    pub fn new(analysis_sample_rate: u32, target_lufs: f64) -> Self {
        Self {
            analyser: HarmonicAnalyser::new(),
            orchestrator: Orchestrator::new(),
            mixer: AutoMixer::new(analysis_sample_rate as f64),
            target_lufs,
        }
    }

    /// Runs one full pass of the pipeline for a `beats`-long block and
    /// posts a `PlayPreset` command per resulting part. `genre` selects a
    /// progression template (`None` falls back to the Markov walk);
    /// `tempo_bpm` converts beat durations to seconds for the auto-mixer's
    /// sine-stub synthesis.
    pub fn render_block(
        &mut self,
        compositor: &mut Compositor,
        beats: f64,
        bar_beats: f64,
        genre: Option<&str>,
        tempo_bpm: f64,
        sink: &dyn AudioSink,
    ) -> Result<()> {
        // Step 1 — gather melody.
        let (melody_notes, melody_durations, melody_intensity) =
            gather_melody(compositor, beats);

        let analysis_notes: Vec<AnalysisNote> = melody_notes
            .iter()
            .zip(melody_durations.iter())
            .map(|(f, d)| (*f, *d))
            .collect();

        // Step 2 — harmonic analysis.
        let analysis = self.analyser.describe(&analysis_notes)?;

        // Step 3 — progression.
        let synth = ProgressionSynth::new(genre).with_bar_beats(bar_beats);
        let total_beats: f64 = analysis.durations.iter().sum();
        let chords = synth.next(&analysis.key, total_beats);
        let chord_durations = redistribute_durations(&chords, &analysis.durations);

        // Step 4 — orchestration.
        let mut parts: PartMap = self.orchestrator.voice(&chords, &chord_durations);

        // Raw melody injected as its own part.
        parts.insert(
            "melody".to_string(),
            Part::new(melody_notes, melody_durations, melody_intensity),
        );

        // Step 5 — auto-mix.
        let seconds_per_beat = if tempo_bpm > 0.0 { 60.0 / tempo_bpm } else { 0.5 };
        self.mixer.autoset(&mut parts, self.target_lufs, seconds_per_beat);

        // Step 6 — render.
        for (name, part) in &parts {
            let params = part_to_params(part);
            sink.post(AudioCommand::PlayPreset { preset: name.clone(), params })?;
        }

        Ok(())
    }
}

/// Pulls `next_event` until accumulated duration reaches `beats`
/// (`spec.md` §4.5 step 1). Bails out after a generous cap so a melody
/// with a single extremely long note can't spin forever.
fn gather_melody(compositor: &mut Compositor, beats: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut notes = Vec::new();
    let mut durations = Vec::new();
    let mut intensity = Vec::new();
    let mut accumulated = 0.0;
    let cap = ((beats * 64.0) as usize).max(256);

    for _ in 0..cap {
        if accumulated >= beats {
            break;
        }
        let (n, d, i) = compositor.next_event();
        if n.is_empty() {
            break;
        }
        accumulated += d[0];
        notes.push(n[0]);
        durations.push(d[0]);
        intensity.push(i[0]);
    }
    (notes, durations, intensity)
}

/// The analyser's per-window durations and the progression's per-bar
/// durations don't necessarily share a cardinality (one partitions by
/// beat, the other by bar); chord durations are stretched proportionally
/// across the analyzed span so the sum still matches `total_beats`.
fn redistribute_durations(chords: &[theory::ChordSymbol], analysis_durations: &[f64]) -> Vec<f64> {
    let total: f64 = analysis_durations.iter().sum();
    if chords.is_empty() {
        return Vec::new();
    }
    let each = total / chords.len() as f64;
    vec![each; chords.len()]
}

fn part_to_params(part: &Part) -> ParamMap {
    let mut params = ParamMap::new();
    params.insert("notes".to_string(), ParamValue::FloatList(part.notes.clone()));
    params.insert("durations".to_string(), ParamValue::FloatList(part.durations.clone()));
    params.insert(
        "intensity".to_string(),
        ParamValue::FloatList(part.intensity.clone()),
    );
    if let Some(mix) = part.mix {
        params.insert("gain_db".to_string(), ParamValue::Float(mix.gain_db));
        params.insert("enable_reverb".to_string(), ParamValue::Bool(mix.enable_reverb));
        params.insert("enable_chorus".to_string(), ParamValue::Bool(mix.enable_chorus));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::RecordingSink;
    use crate::compositor::melody::Melody;
    use std::collections::BTreeMap as StdBTreeMap;

    fn simple_compositor() -> Compositor {
        let melody = Melody::parse(
            r#"{"hands": [[
                {"frequency": 261.63, "duration_beats": 1},
                {"frequency": 329.63, "duration_beats": 1},
                {"frequency": 392.0, "duration_beats": 1},
                {"frequency": 261.63, "duration_beats": 1}
            ]]}"#,
        )
        .unwrap();
        let mut melodies = StdBTreeMap::new();
        melodies.insert("test".to_string(), melody);
        let mut compositor = Compositor::from_melodies(melodies);
        compositor.start("test").unwrap();
        compositor
    }

    #[test]
    fn test_render_block_posts_melody_bass_piano() {
        let mut compositor = simple_compositor();
        let mut arranger = Arranger::new(48_000, -14.0);
        let sink = RecordingSink::new();
        arranger
            .render_block(&mut compositor, 4.0, 4.0, Some("pop"), 120.0, &sink)
            .unwrap();

        let commands = sink.commands.lock().unwrap();
        let names: Vec<&str> = commands
            .iter()
            .map(|c| match c {
                AudioCommand::PlayPreset { preset, .. } => preset.as_str(),
                _ => panic!("unexpected command"),
            })
            .collect();
        assert!(names.contains(&"melody"));
        assert!(names.contains(&"bass"));
        assert!(names.contains(&"piano"));
    }

    #[test]
    fn test_render_block_empty_melody_is_non_fatal() {
        let mut compositor = Compositor::from_melodies(StdBTreeMap::new());
        let mut arranger = Arranger::new(48_000, -14.0);
        let sink = RecordingSink::new();
        let result = arranger.render_block(&mut compositor, 4.0, 4.0, None, 120.0, &sink);
        assert!(result.is_ok());
    }
}

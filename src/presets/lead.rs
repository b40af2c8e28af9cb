//! Clipped sine lead: an oscillator driven into the soft-clip distortion
//! node for a brighter, harmonically-rich lead voice. Grounded on the
//! teacher's `saw_lead`/`Instrument` lead presets paired with
//! `effects::Distortion`. Melodic: when the orchestrator hands it a
//! `notes`/`durations` sequence (one part's worth of pitches in Hz and
//! their beat-durations), it steps through them instead of holding a
//! single static `freq`.

use crate::dsp::distortion::Distortion;
use crate::dsp::oscillator::Oscillator;
use crate::dsp::waveform::Waveform;
use crate::dsp::DEFAULT_SAMPLE_RATE;
use crate::error::Result;

use super::kinds::PresetCore;
use super::{
    require_float, BasePreset, ParamMap, ParamMeta, ParamSchema, ParamValue, PresetFactory,
    PresetLifecycle, UniversalOptions,
};

pub struct ClippedSineLead {
    core: PresetCore,
    osc: Oscillator,
    distortion: Distortion,
    notes: Vec<f64>,
    durations: Vec<f64>,
    note_index: usize,
    note_elapsed: f64,
    seconds_per_beat: f64,
}

impl ClippedSineLead {
    pub fn new(intensity: f64, duration: f64, params: &ParamMap) -> Self {
        let opts = UniversalOptions::from_params(params);
        let drive = require_float(params, "drive", 6.0);
        let tempo_bpm = require_float(params, "tempo_bpm", 120.0).max(1.0);

        let notes: Vec<f64> = params
            .get("notes")
            .and_then(ParamValue::as_float_list)
            .map(|s| s.to_vec())
            .unwrap_or_default();
        let durations: Vec<f64> = params
            .get("durations")
            .and_then(ParamValue::as_float_list)
            .map(|s| s.to_vec())
            .unwrap_or_default();

        let start_freq = notes.first().copied().unwrap_or_else(|| require_float(params, "freq", 440.0));
        let mut osc = Oscillator::new(Waveform::Sine, start_freq, DEFAULT_SAMPLE_RATE);
        osc.set("amplitude", intensity.clamp(0.0, 1.0), 0.0);

        Self {
            core: PresetCore::new(opts, duration, DEFAULT_SAMPLE_RATE),
            osc,
            distortion: Distortion::new(drive, 0.8),
            notes,
            durations,
            note_index: 0,
            note_elapsed: 0.0,
            seconds_per_beat: 60.0 / tempo_bpm,
        }
    }

    fn advance_sequence(&mut self, dt_secs: f64) {
        if self.notes.is_empty() {
            return;
        }
        self.note_elapsed += dt_secs;
        let beats = self.durations.get(self.note_index).copied().unwrap_or(1.0);
        let note_secs = (beats * self.seconds_per_beat).max(1e-3);
        if self.note_elapsed >= note_secs {
            self.note_elapsed -= note_secs;
            self.note_index = (self.note_index + 1) % self.notes.len();
            self.osc.set("frequency", self.notes[self.note_index], 10.0);
        }
    }

    pub fn render(&mut self) -> (f64, f64) {
        let dry = self.osc.process();
        let clipped = self.distortion.process(dry);
        self.core.finish(clipped)
    }
}

impl BasePreset for ClippedSineLead {
    fn lifecycle(&self) -> PresetLifecycle {
        self.core.lifecycle
    }

    fn play(&mut self) -> Result<()> {
        self.core.begin_play()
    }

    fn stop(&mut self, fade_ms: f64) -> Result<()> {
        self.core.begin_stop(fade_ms);
        Ok(())
    }

    fn set(&mut self, key: &str, value: ParamValue) -> Result<()> {
        match (key, value.as_f64()) {
            ("freq", Some(v)) => self.osc.set("frequency", v, 15.0),
            ("drive", Some(v)) => self.distortion = Distortion::new(v, 0.8),
            _ => {}
        }
        Ok(())
    }

    fn tick(&mut self, dt_secs: f64) {
        self.advance_sequence(dt_secs);
        self.core.tick(dt_secs);
    }
}

pub struct ClippedSineLeadFactory;

impl PresetFactory for ClippedSineLeadFactory {
    fn name(&self) -> &'static str {
        "clipped_sine_lead"
    }

    fn param_schema(&self) -> ParamSchema {
        let mut schema = ParamSchema::new();
        schema.insert("freq".into(), ParamMeta::new(ParamValue::Float(440.0)));
        schema.insert("drive".into(), ParamMeta::new(ParamValue::Float(6.0)));
        schema.insert("tempo_bpm".into(), ParamMeta::new(ParamValue::Float(120.0)));
        schema.insert("notes".into(), ParamMeta::new(ParamValue::FloatList(Vec::new())));
        schema.insert("durations".into(), ParamMeta::new(ParamValue::FloatList(Vec::new())));
        schema
    }

    fn is_melodic(&self) -> bool {
        true
    }

    fn construct(
        &self,
        intensity: f64,
        duration: f64,
        params: &ParamMap,
    ) -> Result<Box<dyn BasePreset>> {
        Ok(Box::new(ClippedSineLead::new(intensity, duration, params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_stays_bounded() {
        let params = ParamMap::new();
        let mut lead = ClippedSineLead::new(0.7, 1.0, &params);
        lead.play().unwrap();
        for _ in 0..500 {
            let (l, r) = lead.render();
            assert!(l.is_finite() && r.is_finite());
        }
    }

    #[test]
    fn test_melodic_sequence_advances_through_notes() {
        let mut params = ParamMap::new();
        params.insert("notes".into(), ParamValue::FloatList(vec![220.0, 440.0, 330.0]));
        params.insert("durations".into(), ParamValue::FloatList(vec![1.0, 1.0, 1.0]));
        params.insert("tempo_bpm".into(), ParamValue::Float(120.0));
        let mut lead = ClippedSineLead::new(0.7, f64::INFINITY, &params);
        lead.play().unwrap();
        assert_eq!(lead.note_index, 0);
        let ticks = (48_000.0 * 1.2) as usize;
        for _ in 0..ticks {
            lead.tick(1.0 / 48_000.0);
            let _ = lead.render();
        }
        assert_eq!(lead.note_index, 2);
    }
}

//! Sample-player voice: records a short plucked-oscillator burst into an
//! in-memory wavetable once at construction, then reads it back pitched
//! and looped per note. Grounded on the teacher's `sample.rs`/`Sample`
//! playback model (`TableReader`'s fractional-pitch loop), minus the WAV
//! decoding — the core never touches a filesystem for sample data, per
//! [`crate::dsp::table`].

use crate::dsp::envelope::FadeEnvelope;
use crate::dsp::oscillator::Oscillator;
use crate::dsp::table::{TableReader, TableRecorder};
use crate::dsp::waveform::Waveform;
use crate::dsp::DEFAULT_SAMPLE_RATE;
use crate::error::Result;

use super::kinds::PresetCore;
use super::{
    require_float, BasePreset, ParamMap, ParamMeta, ParamSchema, ParamValue, PresetFactory,
    PresetLifecycle, UniversalOptions,
};

const REFERENCE_FREQ: f64 = 261.63;

fn record_pluck() -> std::sync::Arc<Vec<f64>> {
    let mut osc = Oscillator::new(Waveform::Triangle, REFERENCE_FREQ, DEFAULT_SAMPLE_RATE);
    let mut env = FadeEnvelope::new(5.0, 180.0);
    env.start();
    let samples = (DEFAULT_SAMPLE_RATE * 0.3) as usize;
    let mut rec = TableRecorder::new();
    for i in 0..samples {
        let level = if i as f64 > DEFAULT_SAMPLE_RATE * 0.02 {
            env.release();
            env.advance(1000.0 / DEFAULT_SAMPLE_RATE)
        } else {
            env.advance(1000.0 / DEFAULT_SAMPLE_RATE)
        };
        rec.push(osc.process() * level);
    }
    rec.finish()
}

pub struct SamplePlayerVoice {
    core: PresetCore,
    reader: TableReader,
    freq: f64,
}

impl SamplePlayerVoice {
    pub fn new(intensity: f64, duration: f64, params: &ParamMap) -> Self {
        let opts = UniversalOptions::from_params(params);
        let freq = require_float(params, "freq", REFERENCE_FREQ);
        let mut reader = TableReader::new(record_pluck(), true);
        reader.set_rate(freq / REFERENCE_FREQ);
        let mut core = PresetCore::new(opts, duration, DEFAULT_SAMPLE_RATE);
        core.gain_db += 20.0 * intensity.clamp(0.0, 1.0).max(1e-6).log10();
        Self { core, reader, freq }
    }

    pub fn render(&mut self) -> (f64, f64) {
        let dry = self.reader.process();
        self.core.finish(dry)
    }
}

impl BasePreset for SamplePlayerVoice {
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
        if key == "freq" {
            if let Some(v) = value.as_f64() {
                self.freq = v;
                self.reader.set_rate(v / REFERENCE_FREQ);
            }
        }
        Ok(())
    }

    fn tick(&mut self, dt_secs: f64) {
        self.core.tick(dt_secs);
    }
}

pub struct SamplePlayerVoiceFactory;

impl PresetFactory for SamplePlayerVoiceFactory {
    fn name(&self) -> &'static str {
        "sample_player_voice"
    }

    fn param_schema(&self) -> ParamSchema {
        let mut schema = ParamSchema::new();
        schema.insert(
            "freq".into(),
            ParamMeta::new(ParamValue::Float(REFERENCE_FREQ)),
        );
        schema
    }

    fn construct(
        &self,
        intensity: f64,
        duration: f64,
        params: &ParamMap,
    ) -> Result<Box<dyn BasePreset>> {
        Ok(Box::new(SamplePlayerVoice::new(intensity, duration, params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_voice_stays_bounded() {
        let params = ParamMap::new();
        let mut voice = SamplePlayerVoice::new(0.7, 1.0, &params);
        voice.play().unwrap();
        for _ in 0..2000 {
            voice.tick(0.001);
            let (l, r) = voice.render();
            assert!(l.is_finite() && r.is_finite());
        }
    }

    #[test]
    fn test_set_freq_changes_playback_rate() {
        let params = ParamMap::new();
        let mut voice = SamplePlayerVoice::new(0.7, 1.0, &params);
        voice.set("freq", ParamValue::Float(523.25)).unwrap();
        assert!((voice.freq - 523.25).abs() < 1e-9);
    }
}

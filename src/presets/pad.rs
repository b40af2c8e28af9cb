//! FM chorus pad: a two-operator FM voice (carrier/modulator ratio + index)
//! run through the chorus node. Grounded on the teacher's `FMParams`
//! (`fm_synthesis.rs`) for the ratio/index pairing, adapted from a static
//! envelope-shaped index table into a single steppable `mod_index`.

use crate::dsp::chorus::Chorus;
use crate::dsp::oscillator::Oscillator;
use crate::dsp::waveform::Waveform;
use crate::dsp::DEFAULT_SAMPLE_RATE;
use crate::error::Result;

use super::kinds::PresetCore;
use super::{
    require_float, BasePreset, ParamMap, ParamMeta, ParamSchema, ParamValue, PresetFactory,
    PresetLifecycle, UniversalOptions,
};

pub struct FmChorusPad {
    core: PresetCore,
    chorus: Chorus,
    carrier: Oscillator,
    modulator: Oscillator,
    base_freq: f64,
    mod_ratio: f64,
    mod_index: f64,
}

impl FmChorusPad {
    pub fn new(intensity: f64, duration: f64, params: &ParamMap) -> Self {
        let opts = UniversalOptions::from_params(params);
        let freq = require_float(params, "freq", 220.0);
        let mod_ratio = require_float(params, "mod_ratio", 1.5);
        let mod_index = require_float(params, "mod_index", 2.0);

        let mut carrier = Oscillator::new(Waveform::Sine, freq, DEFAULT_SAMPLE_RATE);
        carrier.set("amplitude", intensity.clamp(0.0, 1.0) * 0.5, 0.0);
        let modulator = Oscillator::new(Waveform::Sine, freq * mod_ratio, DEFAULT_SAMPLE_RATE);

        Self {
            core: PresetCore::new(opts, duration, DEFAULT_SAMPLE_RATE),
            chorus: Chorus::new(0.4, 8.0, 0.5, DEFAULT_SAMPLE_RATE),
            carrier,
            modulator,
            base_freq: freq,
            mod_ratio,
            mod_index,
        }
    }

    pub fn render(&mut self) -> (f64, f64) {
        let mod_signal = self.modulator.process();
        let fm_offset = self.base_freq * self.mod_ratio * self.mod_index * mod_signal * 0.01;
        self.carrier.set("frequency", self.base_freq + fm_offset, 0.0);
        let dry = self.carrier.process();
        let chorused = self.chorus.process(dry);
        self.core.finish(chorused)
    }
}

impl BasePreset for FmChorusPad {
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
            ("freq", Some(v)) => {
                self.base_freq = v;
                self.modulator.set("frequency", v * self.mod_ratio, 30.0);
            }
            ("mod_ratio", Some(v)) => {
                self.mod_ratio = v;
                self.modulator.set("frequency", self.base_freq * v, 30.0);
            }
            ("mod_index", Some(v)) => self.mod_index = v,
            _ => {}
        }
        Ok(())
    }

    fn tick(&mut self, dt_secs: f64) {
        self.core.tick(dt_secs);
    }
}

pub struct FmChorusPadFactory;

impl PresetFactory for FmChorusPadFactory {
    fn name(&self) -> &'static str {
        "fm_chorus_pad"
    }

    fn param_schema(&self) -> ParamSchema {
        let mut schema = ParamSchema::new();
        schema.insert("freq".into(), ParamMeta::new(ParamValue::Float(220.0)));
        schema.insert("mod_ratio".into(), ParamMeta::new(ParamValue::Float(1.5)));
        schema.insert("mod_index".into(), ParamMeta::new(ParamValue::Float(2.0)));
        schema
    }

    fn construct(
        &self,
        intensity: f64,
        duration: f64,
        params: &ParamMap,
    ) -> Result<Box<dyn BasePreset>> {
        Ok(Box::new(FmChorusPad::new(intensity, duration, params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fm_pad_is_bounded() {
        let params = ParamMap::new();
        let mut pad = FmChorusPad::new(0.7, 2.0, &params);
        pad.play().unwrap();
        for _ in 0..1000 {
            let (l, r) = pad.render();
            assert!(l.is_finite() && r.is_finite());
        }
    }
}

//! Dual-oscillator drone with LFO drift — the simplest static preset kind.
//!
//! Grounded on the teacher's `Instrument` + `ModRoute` pairing
//! (`instruments/pads.rs`'s `ambient_pad`, which routes a slow sine LFO into
//! filter cutoff): here the LFO drifts the second oscillator's detune
//! instead, producing a slow beating drift between the two voices.

use crate::dsp::lfo::Lfo;
use crate::dsp::oscillator::Oscillator;
use crate::dsp::waveform::Waveform;
use crate::dsp::DEFAULT_SAMPLE_RATE;
use crate::error::Result;

use super::kinds::PresetCore;
use super::{
    require_float, BasePreset, ParamMap, ParamMeta, ParamSchema, ParamValue, PresetFactory,
    PresetLifecycle, UniversalOptions,
};

pub struct TwoFreqDrones {
    core: PresetCore,
    osc_a: Oscillator,
    osc_b: Oscillator,
    detune_lfo: Lfo,
    base_freq: f64,
    detune_cents: f64,
}

impl TwoFreqDrones {
    pub fn new(intensity: f64, duration: f64, params: &ParamMap) -> Self {
        let opts = UniversalOptions::from_params(params);
        let freq = require_float(params, "freq", 110.0);
        let detune_cents = require_float(params, "detune_cents", 7.0);
        let drift_hz = require_float(params, "drift_hz", 0.05);
        let mut osc_a = Oscillator::new(Waveform::Sine, freq, DEFAULT_SAMPLE_RATE);
        let mut osc_b = Oscillator::new(Waveform::Sine, detuned(freq, detune_cents), DEFAULT_SAMPLE_RATE);
        osc_a.set("amplitude", intensity.clamp(0.0, 1.0) * 0.6, 0.0);
        osc_b.set("amplitude", intensity.clamp(0.0, 1.0) * 0.6, 0.0);
        Self {
            core: PresetCore::new(opts, duration, DEFAULT_SAMPLE_RATE),
            osc_a,
            osc_b,
            detune_lfo: Lfo::new(Waveform::Sine, drift_hz, 1.0, DEFAULT_SAMPLE_RATE),
            base_freq: freq,
            detune_cents,
        }
    }

    pub fn render(&mut self) -> (f64, f64) {
        self.detune_lfo.tick();
        let drift = self.detune_lfo.bipolar_value() * 4.0;
        self.osc_b.set("frequency", detuned(self.base_freq, self.detune_cents + drift), 0.0);
        let dry = self.osc_a.process() + self.osc_b.process();
        self.core.finish(dry * 0.5)
    }
}

fn detuned(freq: f64, cents: f64) -> f64 {
    freq * 2f64.powf(cents / 1200.0)
}

impl BasePreset for TwoFreqDrones {
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
        if let Some(v) = value.as_f64() {
            match key {
                "freq" => self.base_freq = v,
                "detune_cents" => self.detune_cents = v,
                "drift_hz" => self.detune_lfo.set_frequency(v, DEFAULT_SAMPLE_RATE),
                _ => {}
            }
        }
        Ok(())
    }

    fn tick(&mut self, dt_secs: f64) {
        self.core.tick(dt_secs);
    }
}

pub struct TwoFreqDronesFactory;

impl PresetFactory for TwoFreqDronesFactory {
    fn name(&self) -> &'static str {
        "two_freq_drones"
    }

    fn param_schema(&self) -> ParamSchema {
        let mut schema = ParamSchema::new();
        schema.insert("freq".into(), ParamMeta::new(ParamValue::Float(110.0)));
        schema.insert("detune_cents".into(), ParamMeta::new(ParamValue::Float(7.0)));
        schema.insert("drift_hz".into(), ParamMeta::new(ParamValue::Float(0.05)));
        schema
    }

    fn construct(
        &self,
        intensity: f64,
        duration: f64,
        params: &ParamMap,
    ) -> Result<Box<dyn BasePreset>> {
        Ok(Box::new(TwoFreqDrones::new(intensity, duration, params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drone_plays_and_stays_bounded() {
        let params = ParamMap::new();
        let mut drone = TwoFreqDrones::new(0.8, 2.0, &params);
        drone.play().unwrap();
        for _ in 0..500 {
            drone.tick(0.001);
            let (l, r) = drone.render();
            assert!(l.is_finite() && r.is_finite());
        }
    }

    #[test]
    fn test_factory_constructs_with_defaults() {
        let factory = TwoFreqDronesFactory;
        let params = ParamMap::new();
        let preset = factory.construct(1.0, f64::INFINITY, &params).unwrap();
        assert_eq!(preset.lifecycle(), PresetLifecycle::Building);
        assert!(!factory.is_melodic());
    }
}

//! Gated noise hits: short, rhythmic noise bursts gated by a repeating
//! attack/release envelope. Grounded on the teacher's percussion presets
//! (`instruments/percussion.rs`'s short, punchy `Envelope` shapes) paired
//! with the noise generator instead of a tuned oscillator.

use crate::dsp::envelope::FadeEnvelope;
use crate::dsp::filter::{Biquad, FilterKind};
use crate::dsp::noise::{NoiseColor, NoiseSource};
use crate::dsp::DEFAULT_SAMPLE_RATE;
use crate::error::Result;

use super::kinds::PresetCore;
use super::{
    require_float, BasePreset, ParamMap, ParamMeta, ParamSchema, ParamValue, PresetFactory,
    PresetLifecycle, UniversalOptions,
};

pub struct GatedNoiseHits {
    core: PresetCore,
    noise: NoiseSource,
    filter: Biquad,
    gate: FadeEnvelope,
    period_samples: u32,
    sample_counter: u32,
    intensity: f64,
}

impl GatedNoiseHits {
    pub fn new(intensity: f64, duration: f64, params: &ParamMap) -> Self {
        let opts = UniversalOptions::from_params(params);
        let rate_hz = require_float(params, "rate_hz", 4.0).max(0.1);
        let cutoff = require_float(params, "cutoff_hz", 3000.0);
        let period_samples = (DEFAULT_SAMPLE_RATE / rate_hz).round() as u32;

        Self {
            core: PresetCore::new(opts, duration, DEFAULT_SAMPLE_RATE),
            noise: NoiseSource::new(NoiseColor::White),
            filter: Biquad::new(FilterKind::BandPass, cutoff, 0.3, DEFAULT_SAMPLE_RATE),
            gate: FadeEnvelope::new(5.0, 60.0),
            period_samples: period_samples.max(1),
            sample_counter: 0,
            intensity: intensity.clamp(0.0, 1.0),
        }
    }

    pub fn render(&mut self) -> (f64, f64) {
        if self.sample_counter == 0 {
            self.gate.start();
        }
        self.sample_counter = (self.sample_counter + 1) % self.period_samples;
        if self.sample_counter == self.period_samples / 3 {
            self.gate.release();
        }

        let level = self.gate.advance(1000.0 / DEFAULT_SAMPLE_RATE);
        let raw = self.noise.process() * self.intensity * level;
        let filtered = self.filter.process(raw);
        self.core.finish(filtered)
    }
}

impl BasePreset for GatedNoiseHits {
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
            ("rate_hz", Some(v)) if v > 0.0 => {
                self.period_samples = (DEFAULT_SAMPLE_RATE / v).round().max(1.0) as u32;
            }
            ("cutoff_hz", Some(v)) => self.filter.set_cutoff(v, 20.0),
            _ => {}
        }
        Ok(())
    }

    fn tick(&mut self, dt_secs: f64) {
        self.core.tick(dt_secs);
    }
}

pub struct GatedNoiseHitsFactory;

impl PresetFactory for GatedNoiseHitsFactory {
    fn name(&self) -> &'static str {
        "gated_noise_hits"
    }

    fn param_schema(&self) -> ParamSchema {
        let mut schema = ParamSchema::new();
        schema.insert("rate_hz".into(), ParamMeta::new(ParamValue::Float(4.0)));
        schema.insert("cutoff_hz".into(), ParamMeta::new(ParamValue::Float(3000.0)));
        schema
    }

    fn construct(
        &self,
        intensity: f64,
        duration: f64,
        params: &ParamMap,
    ) -> Result<Box<dyn BasePreset>> {
        Ok(Box::new(GatedNoiseHits::new(intensity, duration, params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gated_hits_stay_bounded() {
        let params = ParamMap::new();
        let mut hits = GatedNoiseHits::new(0.9, 3.0, &params);
        hits.play().unwrap();
        for _ in 0..4000 {
            let (l, r) = hits.render();
            assert!(l.is_finite() && r.is_finite());
        }
    }
}

//! Filtered-noise beds: white/pink noise through a high/band-pass filter,
//! with an optional bit-crushed variant. Grounded on the teacher's
//! `synthesis::noise` generator paired with `filter.rs`'s state-variable
//! filter, the combination the teacher itself never wires together
//! directly but whose pieces are built for exactly this use.

use crate::dsp::distortion::BitCrusher;
use crate::dsp::filter::{Biquad, FilterKind};
use crate::dsp::noise::{NoiseColor, NoiseSource};
use crate::dsp::DEFAULT_SAMPLE_RATE;
use crate::error::Result;

use super::kinds::PresetCore;
use super::{
    require_float, BasePreset, ParamMap, ParamMeta, ParamSchema, ParamValue, PresetFactory,
    PresetLifecycle, UniversalOptions,
};

pub struct FilteredNoiseBed {
    core: PresetCore,
    noise: NoiseSource,
    filter: Biquad,
    crusher: Option<BitCrusher>,
    intensity: f64,
}

impl FilteredNoiseBed {
    pub fn new(intensity: f64, duration: f64, params: &ParamMap) -> Self {
        let opts = UniversalOptions::from_params(params);
        let cutoff = require_float(params, "cutoff_hz", 900.0);
        let resonance = require_float(params, "resonance", 0.3);
        let bit_crushed = params
            .get("bit_crushed")
            .and_then(ParamValue::as_bool)
            .unwrap_or(false);
        let color = if params
            .get("pink")
            .and_then(ParamValue::as_bool)
            .unwrap_or(true)
        {
            NoiseColor::Pink
        } else {
            NoiseColor::White
        };
        let kind = match params.get("band").and_then(|v| match v {
            ParamValue::List(l) => l.first().cloned(),
            _ => None,
        }) {
            Some(ref s) if s == "band_pass" => FilterKind::BandPass,
            _ => FilterKind::HighPass,
        };

        Self {
            core: PresetCore::new(opts, duration, DEFAULT_SAMPLE_RATE),
            noise: NoiseSource::new(color),
            filter: Biquad::new(kind, cutoff, resonance, DEFAULT_SAMPLE_RATE),
            crusher: bit_crushed.then(|| {
                let depth = require_float(params, "bit_depth", 6.0);
                let divisor = require_float(params, "rate_divisor", 4.0);
                BitCrusher::new(depth, divisor, 1.0)
            }),
            intensity: intensity.clamp(0.0, 1.0),
        }
    }

    pub fn render(&mut self) -> (f64, f64) {
        let raw = self.noise.process() * self.intensity * 0.5;
        let filtered = self.filter.process(raw);
        let shaped = match self.crusher.as_mut() {
            Some(crusher) => crusher.process(filtered),
            None => filtered,
        };
        self.core.finish(shaped)
    }
}

impl BasePreset for FilteredNoiseBed {
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
            ("cutoff_hz", Some(v)) => self.filter.set_cutoff(v, 25.0),
            ("resonance", Some(v)) => self.filter.set_resonance(v, 25.0),
            _ => {}
        }
        Ok(())
    }

    fn tick(&mut self, dt_secs: f64) {
        self.core.tick(dt_secs);
    }
}

pub struct FilteredNoiseBedFactory;

impl PresetFactory for FilteredNoiseBedFactory {
    fn name(&self) -> &'static str {
        "filtered_noise_bed"
    }

    fn param_schema(&self) -> ParamSchema {
        let mut schema = ParamSchema::new();
        schema.insert("cutoff_hz".into(), ParamMeta::new(ParamValue::Float(900.0)));
        schema.insert("resonance".into(), ParamMeta::new(ParamValue::Float(0.3)));
        schema.insert("bit_depth".into(), ParamMeta::new(ParamValue::Float(6.0)));
        schema.insert("rate_divisor".into(), ParamMeta::new(ParamValue::Float(4.0)));
        schema.insert("bit_crushed".into(), ParamMeta::new(ParamValue::Bool(false)));
        schema
    }

    fn construct(
        &self,
        intensity: f64,
        duration: f64,
        params: &ParamMap,
    ) -> Result<Box<dyn BasePreset>> {
        Ok(Box::new(FilteredNoiseBed::new(intensity, duration, params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_noise_bed_is_bounded() {
        let params = ParamMap::new();
        let mut bed = FilteredNoiseBed::new(0.6, 3.0, &params);
        bed.play().unwrap();
        for _ in 0..500 {
            let (l, r) = bed.render();
            assert!(l.is_finite() && r.is_finite());
        }
    }

    #[test]
    fn test_bit_crushed_variant_is_bounded() {
        let mut params = ParamMap::new();
        params.insert("bit_crushed".into(), ParamValue::Bool(true));
        let mut bed = FilteredNoiseBed::new(0.6, 3.0, &params);
        bed.play().unwrap();
        for _ in 0..500 {
            let (l, r) = bed.render();
            assert!(l.is_finite() && r.is_finite());
        }
    }
}

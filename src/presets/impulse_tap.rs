//! Impulse-response tap: a short synthetic impulse response (exponentially
//! decaying filtered noise) convolved directly against an excitation click
//! train. Grounded on the teacher's `synthesis::effects::convolution`
//! preset generators (`convolution::presets::cathedral`, which synthesize
//! an IR rather than load one from a file) — simplified to direct
//! time-domain convolution since the IR here is short enough that an FFT
//! overlap-add isn't warranted; that technique is reserved for the
//! auto-mixer's loudness analysis, where longer buffers justify it.

use crate::dsp::filter::{Biquad, FilterKind};
use crate::dsp::noise::{NoiseColor, NoiseSource};
use crate::dsp::DEFAULT_SAMPLE_RATE;
use crate::error::Result;

use super::kinds::PresetCore;
use super::{
    require_float, BasePreset, ParamMap, ParamMeta, ParamSchema, ParamValue, PresetFactory,
    PresetLifecycle, UniversalOptions,
};

fn synthesize_ir(length: usize, decay: f64, sample_rate: f64) -> Vec<f64> {
    let mut noise = NoiseSource::new(NoiseColor::White);
    let mut filter = Biquad::new(FilterKind::LowPass, 4000.0, 0.2, sample_rate);
    (0..length)
        .map(|i| {
            let envelope = (-(i as f64) / (decay * sample_rate)).exp();
            filter.process(noise.process()) * envelope
        })
        .collect()
}

pub struct ImpulseTap {
    core: PresetCore,
    ir: Vec<f64>,
    ring: Vec<f64>,
    write_pos: usize,
    tap_interval_samples: usize,
    samples_since_tap: usize,
    intensity: f64,
}

impl ImpulseTap {
    pub fn new(intensity: f64, duration: f64, params: &ParamMap) -> Self {
        let opts = UniversalOptions::from_params(params);
        let decay = require_float(params, "decay_secs", 0.6);
        let rate_hz = require_float(params, "tap_rate_hz", 0.5).max(0.01);
        let ir_len = (decay * DEFAULT_SAMPLE_RATE).round().clamp(64.0, 8_000.0) as usize;
        let ir = synthesize_ir(ir_len, decay, DEFAULT_SAMPLE_RATE);

        Self {
            core: PresetCore::new(opts, duration, DEFAULT_SAMPLE_RATE),
            ring: vec![0.0; ir.len()],
            write_pos: 0,
            tap_interval_samples: (DEFAULT_SAMPLE_RATE / rate_hz) as usize,
            samples_since_tap: 0,
            ir,
            intensity: intensity.clamp(0.0, 1.0),
        }
    }

    pub fn render(&mut self) -> (f64, f64) {
        if self.samples_since_tap == 0 {
            self.ring[self.write_pos] = self.intensity;
        } else {
            self.ring[self.write_pos] = 0.0;
        }
        self.samples_since_tap = (self.samples_since_tap + 1) % self.tap_interval_samples.max(1);

        let n = self.ring.len();
        let mut acc = 0.0;
        for (k, coeff) in self.ir.iter().enumerate() {
            let idx = (self.write_pos + n - k) % n;
            acc += self.ring[idx] * coeff;
        }
        self.write_pos = (self.write_pos + 1) % n;

        self.core.finish(acc.clamp(-4.0, 4.0))
    }
}

impl BasePreset for ImpulseTap {
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
        if key == "tap_rate_hz" {
            if let Some(v) = value.as_f64() {
                self.tap_interval_samples = (DEFAULT_SAMPLE_RATE / v.max(0.01)) as usize;
            }
        }
        Ok(())
    }

    fn tick(&mut self, dt_secs: f64) {
        self.core.tick(dt_secs);
    }
}

pub struct ImpulseTapFactory;

impl PresetFactory for ImpulseTapFactory {
    fn name(&self) -> &'static str {
        "impulse_tap"
    }

    fn param_schema(&self) -> ParamSchema {
        let mut schema = ParamSchema::new();
        schema.insert("decay_secs".into(), ParamMeta::new(ParamValue::Float(0.6)));
        schema.insert("tap_rate_hz".into(), ParamMeta::new(ParamValue::Float(0.5)));
        schema
    }

    fn construct(
        &self,
        intensity: f64,
        duration: f64,
        params: &ParamMap,
    ) -> Result<Box<dyn BasePreset>> {
        Ok(Box::new(ImpulseTap::new(intensity, duration, params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_tap_is_bounded() {
        let params = ParamMap::new();
        let mut tap = ImpulseTap::new(0.8, 5.0, &params);
        tap.play().unwrap();
        for _ in 0..4000 {
            let (l, r) = tap.render();
            assert!(l.is_finite() && r.is_finite());
        }
    }
}

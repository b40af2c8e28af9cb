//! Detuned harmonic swarm — N oscillator voices spread across the stereo
//! field with independent delay taps, adapted from the teacher's unison
//! voice-stacking in `instruments/strings.rs`-style ensembles generalized
//! into a steppable `voices` count.

use crate::dsp::delay::Delay;
use crate::dsp::oscillator::Oscillator;
use crate::dsp::panner::Panner;
use crate::dsp::waveform::Waveform;
use crate::dsp::DEFAULT_SAMPLE_RATE;
use crate::error::Result;

use super::kinds::PresetCore;
use super::{
    require_float, BasePreset, ParamMap, ParamMeta, ParamSchema, ParamValue, PresetFactory,
    PresetLifecycle, UniversalOptions,
};

struct Voice {
    osc: Oscillator,
    pan: Panner,
    delay: Delay,
}

pub struct HarmonicSwarm {
    core: PresetCore,
    voices: Vec<Voice>,
    base_freq: f64,
    spread_cents: f64,
}

impl HarmonicSwarm {
    pub fn new(intensity: f64, duration: f64, params: &ParamMap) -> Self {
        let opts = UniversalOptions::from_params(params);
        let freq = require_float(params, "freq", 220.0);
        let spread_cents = require_float(params, "spread_cents", 15.0);
        let voice_count = require_float(params, "voices", 5.0).round().clamp(1.0, 12.0) as usize;

        let voices = (0..voice_count)
            .map(|i| build_voice(i, voice_count, freq, spread_cents, intensity))
            .collect();

        Self {
            core: PresetCore::new(opts, duration, DEFAULT_SAMPLE_RATE),
            voices,
            base_freq: freq,
            spread_cents,
        }
    }

    pub fn render(&mut self) -> (f64, f64) {
        let n = self.voices.len().max(1) as f64;
        let mut acc_l = 0.0;
        let mut acc_r = 0.0;
        for voice in self.voices.iter_mut() {
            let dry = voice.osc.process();
            let wet = voice.delay.process(dry);
            let (l, r) = voice.pan.process(wet / n);
            acc_l += l;
            acc_r += r;
        }
        let gain = self.core.gain_linear();
        let l = self.core.apply_tail(acc_l) * gain;
        let r = self.core.apply_tail(acc_r) * gain;
        (l, r)
    }

    fn retune(&mut self) {
        let n = self.voices.len();
        for (i, voice) in self.voices.iter_mut().enumerate() {
            let cents = voice_offset_cents(i, n, self.spread_cents);
            voice.osc.set("frequency", self.base_freq * 2f64.powf(cents / 1200.0), 30.0);
        }
    }
}

fn voice_offset_cents(index: usize, count: usize, spread_cents: f64) -> f64 {
    if count <= 1 {
        return 0.0;
    }
    let t = index as f64 / (count - 1) as f64 - 0.5;
    t * spread_cents * 2.0
}

fn build_voice(index: usize, count: usize, freq: f64, spread_cents: f64, intensity: f64) -> Voice {
    let cents = voice_offset_cents(index, count, spread_cents);
    let mut osc = Oscillator::new(Waveform::Sawtooth, freq * 2f64.powf(cents / 1200.0), DEFAULT_SAMPLE_RATE);
    osc.set("amplitude", intensity.clamp(0.0, 1.0) * 0.4, 0.0);
    let pan_pos = if count <= 1 {
        0.0
    } else {
        (index as f64 / (count - 1) as f64) * 2.0 - 1.0
    };
    Voice {
        osc,
        pan: Panner::new(pan_pos, 1.0),
        delay: Delay::new(0.01 + 0.003 * index as f64, 0.15, 0.2, DEFAULT_SAMPLE_RATE),
    }
}

impl BasePreset for HarmonicSwarm {
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
                self.retune();
            }
            ("spread_cents", Some(v)) => {
                self.spread_cents = v;
                self.retune();
            }
            _ => {}
        }
        Ok(())
    }

    fn tick(&mut self, dt_secs: f64) {
        self.core.tick(dt_secs);
    }
}

pub struct HarmonicSwarmFactory;

impl PresetFactory for HarmonicSwarmFactory {
    fn name(&self) -> &'static str {
        "harmonic_swarm"
    }

    fn param_schema(&self) -> ParamSchema {
        let mut schema = ParamSchema::new();
        schema.insert("freq".into(), ParamMeta::new(ParamValue::Float(220.0)));
        schema.insert("spread_cents".into(), ParamMeta::new(ParamValue::Float(15.0)));
        schema.insert("voices".into(), ParamMeta::new(ParamValue::Int(5)));
        schema
    }

    fn construct(
        &self,
        intensity: f64,
        duration: f64,
        params: &ParamMap,
    ) -> Result<Box<dyn BasePreset>> {
        Ok(Box::new(HarmonicSwarm::new(intensity, duration, params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swarm_renders_finite_stereo() {
        let params = ParamMap::new();
        let mut swarm = HarmonicSwarm::new(0.7, 1.0, &params);
        swarm.play().unwrap();
        for _ in 0..200 {
            let (l, r) = swarm.render();
            assert!(l.is_finite() && r.is_finite());
        }
    }

    #[test]
    fn test_voice_offsets_are_symmetric_about_zero() {
        let offsets: Vec<f64> = (0..5).map(|i| voice_offset_cents(i, 5, 20.0)).collect();
        let sum: f64 = offsets.iter().sum();
        assert!(sum.abs() < 1e-9);
    }
}

//! Shared scaffolding every preset kind embeds: lifecycle tracking, the
//! click-free fade envelope, and the optional reverb/chorus/panner tail.
//! Generalizes the teacher's `Instrument` (one struct holding an envelope,
//! filter, optional delay/reverb/distortion, volume and pan) into a live,
//! steppable voice rather than a static preset table entry.

use crate::dsp::chorus::Chorus;
use crate::dsp::envelope::{FadeEnvelope, FadeStage};
use crate::dsp::panner::Panner;
use crate::dsp::reverb::Reverb;
use crate::error::{MaestroError, Result};

use super::{PresetLifecycle, UniversalOptions};

#[derive(Debug)]
pub struct PresetCore {
    pub lifecycle: PresetLifecycle,
    pub envelope: FadeEnvelope,
    pub panner: Panner,
    pub gain_db: f64,
    pub reverb: Option<Reverb>,
    pub chorus: Option<Chorus>,
    pub duration_secs: f64,
    elapsed_secs: f64,
}

impl PresetCore {
    pub fn new(opts: UniversalOptions, duration_secs: f64, sample_rate: f64) -> Self {
        Self {
            lifecycle: PresetLifecycle::Building,
            envelope: FadeEnvelope::new(15.0, 250.0),
            panner: Panner::new(0.0, opts.stereo_w),
            gain_db: opts.gain_db,
            reverb: opts.enable_reverb.then(|| Reverb::new(0.7, 0.5, 0.35, sample_rate)),
            chorus: opts.enable_chorus.then(|| Chorus::new(0.6, 6.0, 0.3, sample_rate)),
            duration_secs,
            elapsed_secs: 0.0,
        }
    }

    pub fn gain_linear(&self) -> f64 {
        10f64.powf(self.gain_db / 20.0)
    }

    /// Runs a single channel's sample through the voice's optional reverb
    /// and chorus tail, without touching panning or gain.
    pub fn apply_tail(&mut self, dry: f64) -> f64 {
        let mut wet = dry;
        if let Some(reverb) = self.reverb.as_mut() {
            wet = reverb.process(wet);
        }
        if let Some(chorus) = self.chorus.as_mut() {
            wet = chorus.process(wet);
        }
        wet
    }

    /// Runs a mono dry sample through the tail, panner, and output gain —
    /// the common path for single-source preset kinds.
    pub fn finish(&mut self, dry: f64) -> (f64, f64) {
        let wet = self.apply_tail(dry);
        self.panner.process(wet * self.gain_linear())
    }

    pub fn begin_play(&mut self) -> Result<()> {
        if self.lifecycle != PresetLifecycle::Building {
            return Err(MaestroError::Other(
                "play() called on a preset that is already live".into(),
            ));
        }
        self.lifecycle = PresetLifecycle::FadingIn;
        self.envelope.start();
        Ok(())
    }

    pub fn begin_stop(&mut self, fade_ms: f64) {
        self.lifecycle = PresetLifecycle::FadingOut;
        self.envelope.set_release_ms(fade_ms);
        self.envelope.release();
    }

    /// Advances the voice by one control tick (seconds); the envelope's
    /// internal clock runs in milliseconds.
    pub fn tick(&mut self, dt_secs: f64) {
        let dt_ms = dt_secs * 1000.0;
        match self.lifecycle {
            PresetLifecycle::FadingIn => {
                self.envelope.advance(dt_ms);
                if self.envelope.stage() == FadeStage::Sustaining {
                    self.lifecycle = PresetLifecycle::Playing;
                }
            }
            PresetLifecycle::Playing => {
                self.elapsed_secs += dt_secs;
                if self.duration_secs.is_finite() && self.elapsed_secs >= self.duration_secs {
                    self.begin_stop(40.0);
                }
                self.envelope.advance(dt_ms);
            }
            PresetLifecycle::FadingOut => {
                self.envelope.advance(dt_ms);
                if self.envelope.is_dead() {
                    self.lifecycle = PresetLifecycle::Dead;
                }
            }
            PresetLifecycle::Building | PresetLifecycle::Dead => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_then_stop_reaches_dead() {
        let mut core = PresetCore::new(UniversalOptions::default(), 1.0, 48_000.0);
        core.begin_play().unwrap();
        for _ in 0..50 {
            core.tick(0.01);
        }
        assert_eq!(core.lifecycle, PresetLifecycle::Playing);
        core.begin_stop(30.0);
        for _ in 0..50 {
            core.tick(0.01);
        }
        assert_eq!(core.lifecycle, PresetLifecycle::Dead);
    }

    #[test]
    fn test_double_play_errors() {
        let mut core = PresetCore::new(UniversalOptions::default(), 1.0, 48_000.0);
        core.begin_play().unwrap();
        assert!(core.begin_play().is_err());
    }
}

//! Biquad-style state-variable filter (low/high/band-pass).
//!
//! Adapted from the teacher's `filter.rs` state-variable design; cutoff and
//! resonance are now driven through [`Smoothed`] instead of a fixed one-pole
//! smoother, so every change respects the caller's requested `slew_ms`
//! rather than a hardcoded smoothing constant.

use super::smoothed::Smoothed;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

#[derive(Debug, Clone)]
pub struct Biquad {
    pub kind: FilterKind,
    cutoff: Smoothed,
    resonance: Smoothed,
    sample_rate: f64,
    low: f64,
    high: f64,
    band: f64,
}

impl Biquad {
    pub fn new(kind: FilterKind, cutoff_hz: f64, resonance: f64, sample_rate: f64) -> Self {
        Self {
            kind,
            cutoff: Smoothed::new(cutoff_hz.clamp(20.0, 20_000.0), sample_rate),
            resonance: Smoothed::new(resonance.clamp(0.0, 0.99), sample_rate),
            sample_rate,
            low: 0.0,
            high: 0.0,
            band: 0.0,
        }
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f64, slew_ms: f64) {
        self.cutoff.set_target(cutoff_hz.clamp(20.0, 20_000.0), slew_ms);
    }

    pub fn set_resonance(&mut self, resonance: f64, slew_ms: f64) {
        self.resonance.set_target(resonance.clamp(0.0, 0.99), slew_ms);
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let cutoff = self.cutoff.tick();
        let resonance = self.resonance.tick();

        let f = 2.0 * (PI * cutoff / self.sample_rate).sin();
        let q = 1.0 - resonance;

        self.low += f * self.band;
        self.high = input - self.low - q * self.band;
        self.band += f * self.high;

        if !self.low.is_finite() || self.low.abs() > 10.0 {
            self.low = 0.0;
            self.high = 0.0;
            self.band = 0.0;
            return input;
        }

        let output = match self.kind {
            FilterKind::LowPass => self.low,
            FilterKind::HighPass => self.high,
            FilterKind::BandPass => self.band,
        };
        output.clamp(-2.0, 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowpass_stays_bounded() {
        let mut f = Biquad::new(FilterKind::LowPass, 800.0, 0.4, 48_000.0);
        for i in 0..2000 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            let out = f.process(input);
            assert!(out.is_finite());
            assert!((-2.0..=2.0).contains(&out));
        }
    }

    #[test]
    fn test_each_filter_kind_processes() {
        for kind in [FilterKind::LowPass, FilterKind::HighPass, FilterKind::BandPass] {
            let mut f = Biquad::new(kind, 1000.0, 0.2, 48_000.0);
            for _ in 0..256 {
                assert!(f.process(0.5).is_finite());
            }
        }
    }
}

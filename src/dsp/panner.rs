//! Equal-power stereo panner, backing the universal `stereo_w` preset option.
//!
//! Not present in the teacher as a standalone node; grounded on the
//! constant-power law used throughout the pack (e.g. the teacher's
//! `Instrument` stereo fan-out and `reedrosenbluth-oscen`'s mixer gains).

use std::f64::consts::PI;

#[derive(Debug, Clone, Copy)]
pub struct Panner {
    pub position: f64,
    pub width: f64,
}

impl Panner {
    pub fn new(position: f64, width: f64) -> Self {
        Self {
            position: position.clamp(-1.0, 1.0),
            width: width.clamp(0.0, 1.0),
        }
    }

    pub fn set_position(&mut self, position: f64) {
        self.position = position.clamp(-1.0, 1.0);
    }

    /// Returns (left_gain, right_gain) for a single mono source.
    pub fn gains(&self) -> (f64, f64) {
        let angle = (self.position + 1.0) * 0.25 * PI;
        (angle.cos(), angle.sin())
    }

    /// Spreads a mono sample into a stereo pair, `width` blending toward
    /// full decorrelation at 1.0 and mono-summed at 0.0.
    pub fn process(&self, input: f64) -> (f64, f64) {
        let (l_gain, r_gain) = self.gains();
        let wet_l = input * l_gain;
        let wet_r = input * r_gain;
        let mono = input * std::f64::consts::FRAC_1_SQRT_2;
        (
            mono * (1.0 - self.width) + wet_l * self.width,
            mono * (1.0 - self.width) + wet_r * self.width,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_pan_is_balanced() {
        let p = Panner::new(0.0, 1.0);
        let (l, r) = p.gains();
        assert!((l - r).abs() < 1e-9);
    }

    #[test]
    fn test_hard_left_silences_right() {
        let p = Panner::new(-1.0, 1.0);
        let (_, r) = p.gains();
        assert!(r < 1e-9);
    }

    #[test]
    fn test_zero_width_collapses_to_mono() {
        let p = Panner::new(1.0, 0.0);
        let (l, r) = p.process(1.0);
        assert!((l - r).abs() < 1e-9);
    }
}

//! Noise sources for noise-bed presets: white and pink (1/f).
//!
//! The pink generator uses the Voss-McCartney algorithm, adapted from the
//! teacher's `synthesis::noise::PinkNoise` (rows of independently-updated
//! white generators summed together), rewritten against `rand` 0.9's `rng()`
//! API rather than a hand-seeded RNG.

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseColor {
    White,
    Pink,
}

#[derive(Debug, Clone)]
pub struct NoiseSource {
    color: NoiseColor,
    rows: [f64; 7],
    running_sum: f64,
    updates: u32,
}

impl NoiseSource {
    pub fn new(color: NoiseColor) -> Self {
        Self {
            color,
            rows: [0.0; 7],
            running_sum: 0.0,
            updates: 0,
        }
    }

    pub fn process(&mut self) -> f64 {
        let white = rand::rng().random_range(-1.0..=1.0);
        match self.color {
            NoiseColor::White => white,
            NoiseColor::Pink => {
                for (i, row) in self.rows.iter_mut().enumerate() {
                    if self.updates & (1 << i) == 0 {
                        self.running_sum -= *row;
                        *row = rand::rng().random_range(-1.0..=1.0);
                        self.running_sum += *row;
                        break;
                    }
                }
                self.updates = self.updates.wrapping_add(1);
                (white + self.running_sum) / 8.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_noise_is_bounded() {
        let mut n = NoiseSource::new(NoiseColor::White);
        for _ in 0..1000 {
            let s = n.process();
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_pink_noise_is_bounded() {
        let mut n = NoiseSource::new(NoiseColor::Pink);
        for _ in 0..1000 {
            let s = n.process();
            assert!(s.is_finite());
            assert!((-1.0..=1.0).contains(&s));
        }
    }
}

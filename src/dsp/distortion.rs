//! Waveshaping: soft-clip drive and a bit-crusher, both adapted from the
//! teacher's `effects::Distortion`/`effects::BitCrusher`.

#[derive(Debug, Clone, Copy)]
pub struct Distortion {
    pub drive: f64,
    pub mix: f64,
}

impl Distortion {
    pub fn new(drive: f64, mix: f64) -> Self {
        Self {
            drive: drive.max(1.0),
            mix: mix.clamp(0.0, 1.0),
        }
    }

    pub fn process(&self, input: f64) -> f64 {
        if self.mix < 1e-4 {
            return input;
        }
        let amplified = input * self.drive;
        let distorted = amplified.tanh();
        let normalized = distorted / self.drive.sqrt();
        input * (1.0 - self.mix) + normalized * self.mix
    }
}

#[derive(Debug, Clone)]
pub struct BitCrusher {
    pub bit_depth: f64,
    pub rate_divisor: f64,
    pub mix: f64,
    hold_sample: f64,
    counter: f64,
}

impl BitCrusher {
    pub fn new(bit_depth: f64, rate_divisor: f64, mix: f64) -> Self {
        Self {
            bit_depth: bit_depth.clamp(1.0, 16.0),
            rate_divisor: rate_divisor.max(1.0),
            mix: mix.clamp(0.0, 1.0),
            hold_sample: 0.0,
            counter: 0.0,
        }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        self.counter += 1.0;
        if self.counter >= self.rate_divisor {
            self.hold_sample = input.clamp(-2.0, 2.0);
            self.counter = 0.0;
        }
        let levels = 2f64.powf(self.bit_depth);
        let quantized = (self.hold_sample * levels).round() / levels;
        input * (1.0 - self.mix) + quantized * self.mix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distortion_softens_peaks() {
        let d = Distortion::new(8.0, 1.0);
        let out = d.process(1.0);
        assert!(out.abs() <= 1.0 + 1e-6);
    }

    #[test]
    fn test_bitcrusher_quantizes() {
        let mut bc = BitCrusher::new(2.0, 1.0, 1.0);
        let out = bc.process(0.37);
        // 2-bit => 4 levels, output should land on a coarse grid
        let levels = 2f64.powf(2.0);
        let expected = (0.37_f64.clamp(-2.0, 2.0) * levels).round() / levels;
        assert!((out - expected).abs() < 1e-9);
    }
}

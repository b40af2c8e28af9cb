//! Oscillator node — a phase accumulator driving a [`Waveform`].

use super::smoothed::Smoothed;
use super::waveform::Waveform;

/// A single oscillator voice with a slew-limited frequency and amplitude.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    frequency: Smoothed,
    amplitude: Smoothed,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency_hz: f64, sample_rate: f64) -> Self {
        Self {
            waveform,
            frequency: Smoothed::new(frequency_hz, sample_rate),
            amplitude: Smoothed::new(1.0, sample_rate),
            phase: 0.0,
            sample_rate,
        }
    }

    /// Advance the phase accumulator by one sample and return the output.
    pub fn process(&mut self) -> f64 {
        let freq = self.frequency.tick();
        let amp = self.amplitude.tick();
        let out = self.waveform.sample(self.phase) * amp;
        self.phase = (self.phase + freq / self.sample_rate).rem_euclid(1.0);
        out
    }

    /// Update a named parameter, slew-limited over `slew_ms` milliseconds.
    /// Presets address oscillators by key since a preset may own several
    /// (carrier/modulator, per-voice swarm members) behind one dispatch site.
    pub fn set(&mut self, key: &str, value: f64, slew_ms: f64) {
        match key {
            "frequency" => self.frequency.set_target(value, slew_ms),
            "amplitude" => self.amplitude.set_target(value, slew_ms),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oscillator_stays_bounded() {
        let mut osc = Oscillator::new(Waveform::Sine, 440.0, 48_000.0);
        for _ in 0..1000 {
            let sample = osc.process();
            assert!((-1.0..=1.0).contains(&sample));
        }
    }

    #[test]
    fn test_frequency_slew_is_gradual() {
        let mut osc = Oscillator::new(Waveform::Sine, 100.0, 48_000.0);
        osc.set("frequency", 1000.0, 20.0);
        // Immediately after the slew begins the frequency should not have
        // jumped all the way yet.
        osc.process();
        assert!(osc.frequency.current() < 1000.0);
    }
}

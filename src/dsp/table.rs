//! In-memory wavetable recorder/reader pair.
//!
//! The core never touches a file system for sample data — loading WAV files
//! is the audio I/O server's job and explicitly out of scope. What the core
//! needs is a way to record a short in-memory buffer (synthesized once at
//! preset construction, as `presets::sample_voice` does) and read it back
//! with looping and fractional pitch, the way the teacher's `Sample`
//! (`sample.rs`) stores decoded frames for playback — minus the WAV
//! decoding.

use std::sync::Arc;

#[derive(Debug, Default)]
pub struct TableRecorder {
    buffer: Vec<f64>,
}

impl TableRecorder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn push(&mut self, sample: f64) {
        self.buffer.push(sample);
    }

    /// Freeze the recorded buffer into a shareable table.
    pub fn finish(self) -> Arc<Vec<f64>> {
        Arc::new(self.buffer)
    }
}

#[derive(Debug, Clone)]
pub struct TableReader {
    table: Arc<Vec<f64>>,
    position: f64,
    rate: f64,
    looping: bool,
}

impl TableReader {
    pub fn new(table: Arc<Vec<f64>>, looping: bool) -> Self {
        Self {
            table,
            position: 0.0,
            rate: 1.0,
            looping,
        }
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate.max(0.01);
    }

    pub fn finished(&self) -> bool {
        !self.looping && self.position >= self.table.len() as f64
    }

    /// Advance by one sample and return a linearly-interpolated value.
    pub fn process(&mut self) -> f64 {
        if self.table.is_empty() {
            return 0.0;
        }
        let len = self.table.len();
        let pos = if self.looping {
            self.position.rem_euclid(len as f64)
        } else {
            self.position.min((len - 1) as f64)
        };
        let i0 = pos.floor() as usize % len;
        let i1 = (i0 + 1) % len;
        let frac = pos.fract();
        let value = self.table[i0] * (1.0 - frac) + self.table[i1] * frac;
        self.position += self.rate;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_then_read_back() {
        let mut rec = TableRecorder::new();
        for i in 0..8 {
            rec.push(i as f64 / 8.0);
        }
        let table = rec.finish();
        let mut reader = TableReader::new(table, true);
        for _ in 0..16 {
            let v = reader.process();
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_non_looping_reader_finishes() {
        let table = Arc::new(vec![0.1, 0.2, 0.3]);
        let mut reader = TableReader::new(table, false);
        for _ in 0..10 {
            reader.process();
        }
        assert!(reader.finished());
    }
}

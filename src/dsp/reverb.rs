//! Comb-filter reverb, adapted from the teacher's `effects::Reverb`.

#[derive(Debug, Clone)]
pub struct Reverb {
    pub room_size: f64,
    pub damping: f64,
    pub mix: f64,
    comb_buffers: Vec<Vec<f64>>,
    comb_positions: Vec<usize>,
    filter_state: Vec<f64>,
}

const BASE_DELAYS: [usize; 8] = [1557, 1617, 1491, 1422, 1277, 1356, 1188, 1116];

impl Reverb {
    pub fn new(room_size: f64, damping: f64, mix: f64, sample_rate: f64) -> Self {
        let room_size = room_size.clamp(0.0, 1.0);
        let scale = 1.0 + room_size * 2.0;
        let comb_buffers: Vec<Vec<f64>> = BASE_DELAYS
            .iter()
            .map(|&delay| {
                let size = ((delay as f64 * scale * sample_rate) / 44_100.0).max(1.0) as usize;
                vec![0.0; size]
            })
            .collect();
        let n = comb_buffers.len();
        Self {
            room_size,
            damping: damping.clamp(0.0, 1.0),
            mix: mix.clamp(0.0, 1.0),
            comb_positions: vec![0; n],
            filter_state: vec![0.0; n],
            comb_buffers,
        }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        if self.mix < 1e-4 {
            return input;
        }
        let feedback = 0.5 + self.room_size * 0.48;
        let mut output = 0.0;
        for i in 0..self.comb_buffers.len() {
            let buffer = &mut self.comb_buffers[i];
            let pos = self.comb_positions[i];
            let delayed = buffer[pos];
            self.filter_state[i] = delayed * (1.0 - self.damping) + self.filter_state[i] * self.damping;
            buffer[pos] = input + self.filter_state[i] * feedback;
            self.comb_positions[i] = (pos + 1) % buffer.len();
            output += delayed;
        }
        output /= self.comb_buffers.len() as f64;
        input * (1.0 - self.mix) + output * self.mix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverb_output_finite() {
        let mut r = Reverb::new(0.7, 0.5, 0.6, 48_000.0);
        for i in 0..4000 {
            let input = if i % 100 == 0 { 1.0 } else { 0.0 };
            let out = r.process(input);
            assert!(out.is_finite());
        }
    }
}

//! Engine-wide configuration
//!
//! A plain struct constructed in-process, not read from a file or the
//! environment — the core takes no CLI flags, config files, or env vars
//! (the host process owns all of that). Mirrors the teacher's
//! `AudioEngine::with_buffer_size` constructor-parameter style rather than
//! a global singleton.

/// Tunable knobs shared across the compositor, arranger and scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Scheduler quantum in beats at which arrangement/parameter updates are issued.
    pub block_beats: f64,
    /// Tempo bounds in BPM that the global tempo random-walks within.
    pub tempo_range: (f64, f64),
    /// Target integrated loudness (LUFS) the auto-mixer aims each part at.
    pub target_lufs: f64,
    /// Capacity of the bounded audio command queue.
    pub command_queue_depth: usize,
    /// Sample rate used for the auto-mixer's cached sine-stub renders.
    pub analysis_sample_rate: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            block_beats: 8.0,
            tempo_range: (60.0, 240.0),
            target_lufs: -14.0,
            command_queue_depth: 256,
            analysis_sample_rate: 48_000,
        }
    }
}

impl EngineConfig {
    pub fn clamp_tempo(&self, bpm: f64) -> f64 {
        bpm.clamp(self.tempo_range.0, self.tempo_range.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.block_beats, 8.0);
        assert_eq!(cfg.target_lufs, -14.0);
    }

    #[test]
    fn test_clamp_tempo() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.clamp_tempo(300.0), 240.0);
        assert_eq!(cfg.clamp_tempo(10.0), 60.0);
        assert_eq!(cfg.clamp_tempo(120.0), 120.0);
    }
}

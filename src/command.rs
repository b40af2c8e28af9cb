//! The audio engine command protocol (`spec.md` §6) — the only outbound
//! interface from the core. The real-time device callback, sample-rate
//! conversion, and everything else downstream of this queue are the
//! out-of-scope "audio I/O server" collaborator; the core only ever posts
//! [`AudioCommand`]s into an [`AudioSink`].

use crate::error::{MaestroError, Result};
use crate::presets::{ParamMap, ParamValue};

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    /// Instantiate the named preset with the given params, fade in,
    /// attach to master.
    PlayPreset { preset: String, params: ParamMap },
    /// Begin fade-out; destroy when done.
    StopPreset { preset: String, fade_ms: f64 },
    /// Slew a parameter live.
    SetParam { preset: String, key: String, value: ParamValue },
    /// Parametric EQ from the spectral mixer.
    SetEqGain { band_hz: f64, gain: f64 },
}

/// The engine surface the core posts commands into. Single-producer
/// (control side) / single-consumer (audio side), bounded, non-blocking
/// on the producer (`spec.md` §5) — `post` must never suspend the caller.
pub trait AudioSink: Send + Sync {
    /// Attempt to enqueue `cmd`. Per `spec.md` §7 `EngineBackpressure`: a
    /// full queue drops the command for this block rather than blocking
    /// or panicking — callers log the returned error at warning level and
    /// move on.
    fn post(&self, cmd: AudioCommand) -> Result<()>;
}

/// A bounded [`AudioSink`] backed by a `tokio::sync::mpsc` channel.
/// `try_send` never awaits, matching the audio-side's non-blocking
/// requirement; a full channel becomes `EngineBackpressure`.
pub struct QueueSink {
    sender: tokio::sync::mpsc::Sender<AudioCommand>,
}

impl QueueSink {
    pub fn new(depth: usize) -> (Self, tokio::sync::mpsc::Receiver<AudioCommand>) {
        let (sender, receiver) = tokio::sync::mpsc::channel(depth.max(1));
        (Self { sender }, receiver)
    }
}

impl AudioSink for QueueSink {
    fn post(&self, cmd: AudioCommand) -> Result<()> {
        let label = command_label(&cmd);
        self.sender
            .try_send(cmd)
            .map_err(|_| MaestroError::EngineBackpressure(label))
    }
}

fn command_label(cmd: &AudioCommand) -> String {
    match cmd {
        AudioCommand::PlayPreset { preset, .. } => format!("play_preset({preset})"),
        AudioCommand::StopPreset { preset, .. } => format!("stop_preset({preset})"),
        AudioCommand::SetParam { preset, key, .. } => format!("set_param({preset}.{key})"),
        AudioCommand::SetEqGain { band_hz, .. } => format!("set_eq_gain({band_hz})"),
    }
}

/// Test/inspection double: records every posted command instead of
/// forwarding it anywhere, used by the arrangement and maestro test
/// suites to assert on what would have been sent.
#[cfg(test)]
pub struct RecordingSink {
    pub commands: std::sync::Mutex<Vec<AudioCommand>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { commands: std::sync::Mutex::new(Vec::new()) }
    }
}

#[cfg(test)]
impl AudioSink for RecordingSink {
    fn post(&self, cmd: AudioCommand) -> Result<()> {
        self.commands.lock().unwrap().push(cmd);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_sink_drops_when_full() {
        let (sink, _rx) = QueueSink::new(1);
        assert!(sink
            .post(AudioCommand::SetEqGain { band_hz: 1000.0, gain: 1.0 })
            .is_ok());
        let err = sink
            .post(AudioCommand::SetEqGain { band_hz: 2000.0, gain: 1.0 })
            .unwrap_err();
        assert!(matches!(err, MaestroError::EngineBackpressure(_)));
    }

    #[test]
    fn test_recording_sink_captures_commands() {
        let sink = RecordingSink::new();
        sink.post(AudioCommand::StopPreset { preset: "x".into(), fade_ms: 10.0 }).unwrap();
        assert_eq!(sink.commands.lock().unwrap().len(), 1);
    }
}

//! Error types for the maestro-core engine
//!
//! Unified error handling for every operation in the core that can fail.
//! Per the engine's error-handling design, most of these variants are never
//! propagated: zone loops catch them locally, log a warning, and continue.
//! Only [`MaestroError::Fatal`] is meant to unwind a zone's control loop.

use std::fmt;

/// Main error type for the maestro-core engine
#[derive(Debug, Clone)]
pub enum MaestroError {
    /// A melody file failed to parse, was missing a usable `frequency`, or had no hands
    MalformedMelody(String),

    /// A command referenced a preset kind the registry doesn't know about
    UnknownPreset(String),

    /// `enter_zone` was called on a name that already had an active loop
    ZoneAlreadyActive(String),

    /// Harmonic analysis was asked to describe a span with no notes in it
    AnalysisDegenerate(String),

    /// A stepped parameter would have left its `[0.5x, 2x]` window
    ParameterOutOfRange { param: String, value: f64 },

    /// The audio command queue was full; the command for this block was dropped
    EngineBackpressure(String),

    /// Melody directory or preset module I/O failed
    IoError(String),

    /// The audio device itself failed; this is the one variant the control
    /// side treats as terminal.
    Fatal(String),

    /// Generic error for cases not covered above
    Other(String),
}

impl fmt::Display for MaestroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaestroError::MalformedMelody(msg) => write!(f, "malformed melody: {}", msg),
            MaestroError::UnknownPreset(name) => write!(f, "unknown preset kind: {}", name),
            MaestroError::ZoneAlreadyActive(name) => {
                write!(f, "zone '{}' already active, replacing", name)
            }
            MaestroError::AnalysisDegenerate(msg) => write!(f, "degenerate analysis: {}", msg),
            MaestroError::ParameterOutOfRange { param, value } => write!(
                f,
                "parameter '{}' value {} out of range, clamped",
                param, value
            ),
            MaestroError::EngineBackpressure(cmd) => {
                write!(f, "command queue full, dropped {}", cmd)
            }
            MaestroError::IoError(msg) => write!(f, "io error: {}", msg),
            MaestroError::Fatal(msg) => write!(f, "fatal engine error: {}", msg),
            MaestroError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for MaestroError {}

impl From<std::io::Error> for MaestroError {
    fn from(err: std::io::Error) -> Self {
        MaestroError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for MaestroError {
    fn from(err: serde_json::Error) -> Self {
        MaestroError::MalformedMelody(err.to_string())
    }
}

impl From<String> for MaestroError {
    fn from(err: String) -> Self {
        MaestroError::Other(err)
    }
}

impl From<&str> for MaestroError {
    fn from(err: &str) -> Self {
        MaestroError::Other(err.to_string())
    }
}

/// Result type alias for maestro-core operations
pub type Result<T> = std::result::Result<T, MaestroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MaestroError::UnknownPreset("wobble".to_string());
        assert_eq!(err.to_string(), "unknown preset kind: wobble");
    }

    #[test]
    fn test_out_of_range_display() {
        let err = MaestroError::ParameterOutOfRange {
            param: "cutoff".to_string(),
            value: 9000.0,
        };
        assert_eq!(
            err.to_string(),
            "parameter 'cutoff' value 9000 out of range, clamped"
        );
    }

    #[test]
    fn test_from_string() {
        let err: MaestroError = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MaestroError = io_err.into();
        assert!(matches!(err, MaestroError::IoError(_)));
    }
}

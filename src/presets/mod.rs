//! The DSP preset framework: a uniform lifecycle contract over the graph
//! primitives in [`crate::dsp`], generalized from the teacher's static
//! `Instrument` catalogue (`instruments/mod.rs`, `instruments/pads.rs`) into
//! live, steppable, fade-managed voices.

pub mod drone;
pub mod gated_hits;
pub mod harmonic_swarm;
pub mod impulse_tap;
pub mod kinds;
pub mod kinds_table;
pub mod lead;
pub mod noise_bed;
pub mod pad;
pub mod sample_voice;

use std::collections::BTreeMap;

use crate::error::{MaestroError, Result};

/// A single preset parameter value, mirroring the command protocol's
/// `Map<String, Value>` fields (`play_preset`, `set_param`).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    /// Categorical choice, e.g. a filter band name. Never stepped (§4.6).
    List(Vec<String>),
    /// A melodic preset's `notes`/`durations` sequence. Never stepped.
    FloatList(Vec<f64>),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float_list(&self) -> Option<&[f64]> {
        match self {
            ParamValue::FloatList(v) => Some(v),
            _ => None,
        }
    }
}

pub type ParamMap = BTreeMap<String, ParamValue>;

/// Describes one declared parameter: its default (the nominal center for
/// random-walk stepping) and what kind of stepping rule applies.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamMeta {
    pub default: ParamValue,
}

impl ParamMeta {
    pub fn new(default: ParamValue) -> Self {
        Self { default }
    }
}

pub type ParamSchema = BTreeMap<String, ParamMeta>;

/// Universal construction options every preset kind recognizes in addition
/// to its own declared parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniversalOptions {
    pub enable_reverb: bool,
    pub enable_chorus: bool,
    pub stereo_w: f64,
    pub gain_db: f64,
}

impl Default for UniversalOptions {
    fn default() -> Self {
        Self {
            enable_reverb: false,
            enable_chorus: false,
            stereo_w: 1.0,
            gain_db: 0.0,
        }
    }
}

impl UniversalOptions {
    pub fn from_params(params: &ParamMap) -> Self {
        let mut opts = Self::default();
        if let Some(v) = params.get("enable_reverb").and_then(ParamValue::as_bool) {
            opts.enable_reverb = v;
        }
        if let Some(v) = params.get("enable_chorus").and_then(ParamValue::as_bool) {
            opts.enable_chorus = v;
        }
        if let Some(v) = params.get("stereo_w").and_then(ParamValue::as_f64) {
            opts.stereo_w = v.clamp(0.0, 1.0);
        }
        if let Some(v) = params.get("gain_db").and_then(ParamValue::as_f64) {
            opts.gain_db = v;
        }
        opts
    }
}

/// A live preset instance's position in the build/play/fade/reclaim cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetLifecycle {
    Building,
    FadingIn,
    Playing,
    FadingOut,
    Dead,
}

/// Uniform lifecycle contract implemented by every preset kind.
///
/// `play` is idempotent only in the sense that calling it a second time is
/// an error (`Fatal` would be too strong — callers treat it as a logic bug
/// and drop the command).
pub trait BasePreset: Send {
    fn lifecycle(&self) -> PresetLifecycle;

    /// Instantiate the graph, wire it to the output bus, begin the fade-in.
    fn play(&mut self) -> Result<()>;

    /// Begin the fade-out; nodes are destroyed once it completes.
    fn stop(&mut self, fade_ms: f64) -> Result<()>;

    /// Update a single declared parameter via smoothed scalars.
    fn set(&mut self, key: &str, value: ParamValue) -> Result<()>;

    /// Advance internal envelopes/lifecycle by one control tick (seconds).
    fn tick(&mut self, dt_secs: f64);

    fn is_dead(&self) -> bool {
        self.lifecycle() == PresetLifecycle::Dead
    }
}

/// Constructs preset instances and describes their parameter schema; one
/// implementor per preset kind, registered in [`crate::registry`].
pub trait PresetFactory: Send + Sync {
    fn name(&self) -> &'static str;

    /// Declared parameters eligible for random-walk stepping. Universal
    /// options (`enable_reverb`, …) are not included here.
    fn param_schema(&self) -> ParamSchema;

    /// True if this kind's constructor requires `notes`/`durations` —
    /// the Maestro scheduler's melodic/static partition (spec §4.6).
    fn is_melodic(&self) -> bool {
        false
    }

    fn construct(
        &self,
        intensity: f64,
        duration: f64,
        params: &ParamMap,
    ) -> Result<Box<dyn BasePreset>>;
}

pub(crate) fn require_float(params: &ParamMap, key: &str, default: f64) -> f64 {
    params
        .get(key)
        .and_then(ParamValue::as_f64)
        .unwrap_or(default)
}

pub(crate) fn clamp_intensity(intensity: f64) -> f64 {
    intensity.clamp(0.0, 1.0)
}

pub(crate) fn unknown_param(kind: &str, key: &str) -> MaestroError {
    MaestroError::Other(format!("preset '{kind}' has no parameter '{key}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universal_options_defaults() {
        let opts = UniversalOptions::default();
        assert!(!opts.enable_reverb);
        assert_eq!(opts.stereo_w, 1.0);
    }

    #[test]
    fn test_universal_options_from_params() {
        let mut params = ParamMap::new();
        params.insert("enable_reverb".into(), ParamValue::Bool(true));
        params.insert("stereo_w".into(), ParamValue::Float(0.4));
        let opts = UniversalOptions::from_params(&params);
        assert!(opts.enable_reverb);
        assert_eq!(opts.stereo_w, 0.4);
    }
}

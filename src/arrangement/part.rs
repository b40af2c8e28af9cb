//! The `Part` data model: a role-keyed bundle of notes/durations/
//! intensities, optionally enriched with mix settings by the auto-mixer.

use std::collections::BTreeMap;

/// Post-mix settings the auto-mixer attaches to a part (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartMix {
    pub gain_db: f64,
    pub enable_reverb: bool,
    pub enable_chorus: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub notes: Vec<f64>,
    pub durations: Vec<f64>,
    pub intensity: Vec<f64>,
    pub mix: Option<PartMix>,
}

impl Part {
    pub fn new(notes: Vec<f64>, durations: Vec<f64>, intensity: Vec<f64>) -> Self {
        debug_assert_eq!(notes.len(), durations.len());
        debug_assert_eq!(notes.len(), intensity.len());
        Self { notes, durations, intensity, mix: None }
    }

    pub fn total_duration(&self) -> f64 {
        self.durations.iter().sum()
    }
}

pub type PartMap = BTreeMap<String, Part>;

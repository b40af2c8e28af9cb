//! Static discovery table standing in for the source's module-introspection
//! scan (`spec.md` §4.3/§9): every compiled-in preset kind, listed once.
//!
//! Adding a ninth preset kind means adding one line here — the closest a
//! statically-compiled crate gets to "drop a new module in and it's
//! picked up automatically".

use std::sync::Arc;

use super::drone::TwoFreqDronesFactory;
use super::gated_hits::GatedNoiseHitsFactory;
use super::harmonic_swarm::HarmonicSwarmFactory;
use super::impulse_tap::ImpulseTapFactory;
use super::lead::ClippedSineLeadFactory;
use super::noise_bed::FilteredNoiseBedFactory;
use super::pad::FmChorusPadFactory;
use super::sample_voice::SamplePlayerVoiceFactory;
use super::PresetFactory;

pub fn discover() -> Vec<Arc<dyn PresetFactory>> {
    vec![
        Arc::new(TwoFreqDronesFactory),
        Arc::new(GatedNoiseHitsFactory),
        Arc::new(HarmonicSwarmFactory),
        Arc::new(ImpulseTapFactory),
        Arc::new(ClippedSineLeadFactory),
        Arc::new(FilteredNoiseBedFactory),
        Arc::new(FmChorusPadFactory),
        Arc::new(SamplePlayerVoiceFactory),
    ]
}

//! The Maestro scheduler (C6): one cooperative async task per zone, each
//! driving its own slice of the preset registry in tempo-synchronized
//! blocks and re-issuing the arrangement pipeline whenever melodic presets
//! are in play.
//!
//! Grounded on the teacher's `AudioEngine` run-loop shape (a driving loop
//! that owns its own timing) generalized from one global loop to many
//! independent per-zone tasks, and on `sequences::generative::random_walk`
//! for the parameter-stepping math now in [`zone`].

pub mod zone;

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use rand::SeedableRng;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use zone::{step_globals, step_params, Globals};

use crate::arrangement::Arranger;
use crate::command::{AudioCommand, AudioSink};
use crate::compositor::Compositor;
use crate::config::EngineConfig;
use crate::error::{MaestroError, Result};
use crate::presets::ParamMap;
use crate::registry::PresetRegistry;

const LEAVE_FADE_MS: f64 = 250.0;

/// Introspection snapshot of one zone (`spec.md` §9 supplemented feature),
/// split into the melodic/static partition the scheduler itself computes
/// each block.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSnapshot {
    pub name: String,
    pub preset_kinds: Vec<String>,
    pub melodic: Vec<String>,
    pub static_presets: Vec<String>,
}

struct ZoneHandle {
    preset_kinds: Vec<String>,
    active_presets: Arc<StdMutex<Vec<String>>>,
    task: JoinHandle<()>,
}

/// Owns the zone table and hands out commands through a shared
/// [`AudioSink`]. The zone table itself is mutated only by the control
/// thread calling `enter_zone`/`leave_zone` (`spec.md` §5); each zone's
/// loop otherwise runs independently.
pub struct Maestro {
    registry: Arc<PresetRegistry>,
    compositor: Arc<AsyncMutex<Compositor>>,
    sink: Arc<dyn AudioSink>,
    config: EngineConfig,
    zones: StdMutex<HashMap<String, ZoneHandle>>,
}

impl Maestro {
    pub fn new(
        registry: Arc<PresetRegistry>,
        compositor: Compositor,
        sink: Arc<dyn AudioSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            compositor: Arc::new(AsyncMutex::new(compositor)),
            sink,
            config,
            zones: StdMutex::new(HashMap::new()),
        }
    }

    /// Launches a new loop for `name` driving `presets`. A zone already
    /// active under that name is cancelled first (`ZoneAlreadyActive`,
    /// replacement semantics — `spec.md` §7).
    pub fn enter_zone(&self, name: &str, presets: Vec<String>) -> Result<()> {
        if self.zones.lock().unwrap().contains_key(name) {
            log::warn!("{}", MaestroError::ZoneAlreadyActive(name.to_string()));
            self.cancel_zone(name);
        }

        let active_presets = Arc::new(StdMutex::new(Vec::new()));
        let task = tokio::spawn(run_zone_loop(
            name.to_string(),
            presets.clone(),
            self.registry.clone(),
            self.compositor.clone(),
            self.sink.clone(),
            self.config,
            active_presets.clone(),
        ));

        self.zones.lock().unwrap().insert(
            name.to_string(),
            ZoneHandle { preset_kinds: presets, active_presets, task },
        );
        Ok(())
    }

    /// Alias for [`Maestro::enter_zone`] (`spec.md` §4.6).
    pub fn set_zone(&self, name: &str, presets: Vec<String>) -> Result<()> {
        self.enter_zone(name, presets)
    }

    /// Cancels `name`'s loop and fades out every preset instance it owned,
    /// rather than killing them abruptly (`spec.md` §5 cancellation).
    pub fn leave_zone(&self, name: &str) {
        self.cancel_zone(name);
    }

    fn cancel_zone(&self, name: &str) {
        let handle = self.zones.lock().unwrap().remove(name);
        if let Some(handle) = handle {
            for preset in handle.active_presets.lock().unwrap().iter() {
                if let Err(e) = self.sink.post(AudioCommand::StopPreset {
                    preset: preset.clone(),
                    fade_ms: LEAVE_FADE_MS,
                }) {
                    log::warn!("failed to fade out {preset} on zone leave: {e}");
                }
            }
            handle.task.abort();
        }
    }

    pub fn zone_snapshot(&self, name: &str) -> Option<ZoneSnapshot> {
        let zones = self.zones.lock().unwrap();
        let handle = zones.get(name)?;
        let (melodic, static_presets): (Vec<String>, Vec<String>) = handle
            .preset_kinds
            .iter()
            .cloned()
            .partition(|kind| self.registry.is_melodic(kind).unwrap_or(false));
        Some(ZoneSnapshot {
            name: name.to_string(),
            preset_kinds: handle.preset_kinds.clone(),
            melodic,
            static_presets,
        })
    }

    pub fn zone_names(&self) -> Vec<String> {
        self.zones.lock().unwrap().keys().cloned().collect()
    }
}

/// The per-zone cooperative loop: steps globals, partitions presets,
/// random-steps and re-plays static presets, optionally renders the
/// arrangement pipeline, then sleeps for one block (`spec.md` §4.6).
async fn run_zone_loop(
    name: String,
    preset_kinds: Vec<String>,
    registry: Arc<PresetRegistry>,
    compositor: Arc<AsyncMutex<Compositor>>,
    sink: Arc<dyn AudioSink>,
    config: EngineConfig,
    active_presets: Arc<StdMutex<Vec<String>>>,
) {
    // A thread-local `rand::rng()` is `!Send` and can't be held across an
    // `.await` in a spawned task; `StdRng` is both `Send` and a CSPRNG, so
    // each zone loop seeds its own.
    let mut rng = rand::rngs::StdRng::from_os_rng();
    let mut globals = Globals::new((config.tempo_range.0 + config.tempo_range.1) / 2.0);
    let mut arranger = Arranger::new(config.analysis_sample_rate, config.target_lufs);
    let mut static_state: HashMap<String, ParamMap> = HashMap::new();

    loop {
        step_globals(&mut globals, config.block_beats, config.tempo_range, &mut rng);

        let (melodic, static_presets): (Vec<String>, Vec<String>) = preset_kinds
            .iter()
            .cloned()
            .partition(|kind| registry.is_melodic(kind).unwrap_or(false));

        let mut owned = static_presets.clone();

        // Step 3-4: random-step and re-enqueue every static preset.
        for kind in &static_presets {
            let Some(schema) = registry.param_schema(kind) else {
                log::warn!("{}", MaestroError::UnknownPreset(kind.clone()));
                continue;
            };
            let entry = static_state.entry(kind.clone()).or_default();
            let params = step_params(&schema, entry, &mut rng);
            if let Err(e) = sink.post(AudioCommand::PlayPreset { preset: kind.clone(), params }) {
                log::warn!("{e}");
            }
        }

        // Step 5: melodic presets drive the arrangement pipeline.
        if !melodic.is_empty() {
            let mut compositor = compositor.lock().await;
            if let Err(e) = arranger.render_block(
                &mut compositor,
                config.block_beats,
                crate::arrangement::progression::DEFAULT_BAR_BEATS,
                None,
                globals.tempo_bpm,
                sink.as_ref(),
            ) {
                log::warn!("arrangement pipeline failed for zone '{name}': {e}");
            }
            owned.extend(["melody".to_string(), "bass".to_string(), "piano".to_string()]);
        }

        *active_presets.lock().unwrap() = owned;

        // Step 6.
        let beat_time = if globals.tempo_bpm > 0.0 { 60.0 / globals.tempo_bpm } else { 0.5 };
        let sleep_secs = config.block_beats * beat_time;
        tokio::time::sleep(std::time::Duration::from_secs_f64(sleep_secs.max(0.0))).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::RecordingSink;
    use std::collections::BTreeMap;

    fn test_maestro() -> Maestro {
        let registry = Arc::new(PresetRegistry::new());
        let compositor = Compositor::from_melodies(BTreeMap::new());
        let sink: Arc<dyn AudioSink> = Arc::new(RecordingSink::new());
        Maestro::new(registry, compositor, sink, EngineConfig::default())
    }

    #[tokio::test]
    async fn test_enter_then_leave_zone_removes_it() {
        let maestro = test_maestro();
        maestro.enter_zone("ambient", vec!["two_freq_drones".to_string()]).unwrap();
        assert!(maestro.zone_names().contains(&"ambient".to_string()));
        maestro.leave_zone("ambient");
        assert!(!maestro.zone_names().contains(&"ambient".to_string()));
    }

    #[tokio::test]
    async fn test_reentering_same_zone_replaces_prior_loop() {
        let maestro = test_maestro();
        maestro.enter_zone("lead", vec!["clipped_sine_lead".to_string()]).unwrap();
        maestro.enter_zone("lead", vec!["fm_chorus_pad".to_string()]).unwrap();
        let snapshot = maestro.zone_snapshot("lead").unwrap();
        assert_eq!(snapshot.preset_kinds, vec!["fm_chorus_pad".to_string()]);
        maestro.leave_zone("lead");
    }

    #[tokio::test]
    async fn test_zone_snapshot_partitions_melodic_and_static() {
        let maestro = test_maestro();
        maestro
            .enter_zone(
                "mixed",
                vec!["clipped_sine_lead".to_string(), "two_freq_drones".to_string()],
            )
            .unwrap();
        let snapshot = maestro.zone_snapshot("mixed").unwrap();
        assert_eq!(snapshot.melodic, vec!["clipped_sine_lead".to_string()]);
        assert_eq!(snapshot.static_presets, vec!["two_freq_drones".to_string()]);
        maestro.leave_zone("mixed");
    }
}

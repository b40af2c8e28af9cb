//! # maestro-core
//!
//! Core engine for an always-on generative music system: a preset
//! framework of click-free synthesis graphs, a preset registry, a melody
//! repository (the Compositor), a harmonic-analysis/orchestration/
//! auto-mix pipeline (the arrangement pipeline), and a zone-based
//! scheduler (Maestro) that drives the whole thing in tempo-synchronized
//! blocks. The engine only ever *decides* what to play; rendering audio
//! is an external collaborator reached through [`command::AudioSink`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use maestro_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), maestro_core::error::MaestroError> {
//! let registry = Arc::new(PresetRegistry::new());
//! let compositor = Compositor::load_dir("melodies")?;
//! let (sink, _rx) = QueueSink::new(256);
//! let maestro = Maestro::new(registry, compositor, Arc::new(sink), EngineConfig::default());
//! maestro.enter_zone("ambient", vec!["two_freq_drones".to_string()])?;
//! # Ok(())
//! # }
//! ```

pub mod arrangement;
pub mod command;
pub mod compositor;
pub mod config;
pub mod dsp;
pub mod error;
pub mod maestro;
pub mod offload;
pub mod presets;
pub mod registry;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::arrangement::Arranger;
    pub use crate::command::{AudioCommand, AudioSink, QueueSink};
    pub use crate::compositor::{Compositor, Melody};
    pub use crate::config::EngineConfig;
    pub use crate::error::{MaestroError, Result};
    pub use crate::maestro::{Maestro, ZoneSnapshot};
    pub use crate::offload::AsyncOffload;
    pub use crate::presets::{BasePreset, ParamMap, ParamValue, PresetFactory};
    pub use crate::registry::PresetRegistry;
}

//! Per-zone state and the pure stepping logic the zone loop drives each
//! block (`spec.md` §4.6 steps 1–4). Kept free of `tokio` so the actual
//! random-walk math can be unit tested without spinning up a runtime.

use rand::Rng;

use crate::presets::{ParamMap, ParamSchema, ParamValue};

/// Per-zone tempo/energy state. Written only by that zone's own loop and
/// read only by parameter generation within the same loop — never shared
/// across zones or threads (`spec.md` §5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Globals {
    pub tempo_bpm: f64,
    pub energy: f64,
    pub phase: f64,
}

impl Globals {
    pub fn new(tempo_bpm: f64) -> Self {
        Self { tempo_bpm, energy: 0.7, phase: 0.0 }
    }
}

/// `spec.md` §4.6 step 1: tempo random-walks by up to ±7% per block,
/// clamped to `tempo_range`; energy is a slow sinusoid driven by a phase
/// that advances `dt / (32 * beat_time)` per block.
pub fn step_globals(globals: &mut Globals, block_beats: f64, tempo_range: (f64, f64), rng: &mut impl Rng) {
    let span = globals.tempo_bpm * 0.07;
    let delta = rng.random_range(-span..=span);
    globals.tempo_bpm = (globals.tempo_bpm + delta).clamp(tempo_range.0, tempo_range.1);

    let beat_time = if globals.tempo_bpm > 0.0 { 60.0 / globals.tempo_bpm } else { 0.5 };
    let block_time = block_beats * beat_time;
    globals.phase += block_time / (32.0 * beat_time);
    globals.energy = 0.7 + 0.3 * (std::f64::consts::TAU * globals.phase).sin();
}

/// `spec.md` §4.6 step 3: random-steps a single declared value relative to
/// its current value, clamped to `[0.5x, 2x]` of its *default* (or `[0,1]`
/// when the default is exactly zero).
pub fn step_value(default: &ParamValue, current: &ParamValue, rng: &mut impl Rng) -> ParamValue {
    match (default, current) {
        (ParamValue::Int(default), ParamValue::Int(current)) => {
            let (lo, hi) = clamp_window(*default as f64);
            let delta: i64 = if rng.random_bool(0.5) { 1 } else { -1 };
            let stepped = (*current + delta) as f64;
            ParamValue::Int(stepped.clamp(lo, hi).round() as i64)
        }
        (ParamValue::Float(default), ParamValue::Float(current)) => {
            let (lo, hi) = clamp_window(*default);
            let span = if current.abs() > 1e-9 { 0.1 * current.abs() } else { 0.1 };
            let delta = rng.random_range(-span..=span);
            let stepped = (current + delta).clamp(lo, hi);
            ParamValue::Float((stepped * 1000.0).round() / 1000.0)
        }
        (ParamValue::Bool(_), ParamValue::Bool(current)) => ParamValue::Bool(!current),
        // Lists (categorical choices, melodic note/duration sequences) are
        // never stepped.
        (_, current) => current.clone(),
    }
}

fn clamp_window(default: f64) -> (f64, f64) {
    if default.abs() < 1e-9 {
        (0.0, 1.0)
    } else {
        let a = default * 0.5;
        let b = default * 2.0;
        (a.min(b), a.max(b))
    }
}

/// Steps every declared parameter of one preset in place, returning the
/// new `ParamMap` to post alongside the next `play_preset` command.
/// Parameters present in `current` but absent from `schema` (universal
/// options like `gain_db`) pass through unstepped.
pub fn step_params(schema: &ParamSchema, current: &mut ParamMap, rng: &mut impl Rng) -> ParamMap {
    for (key, meta) in schema {
        let existing = current.entry(key.clone()).or_insert_with(|| meta.default.clone());
        *existing = step_value(&meta.default, existing, rng);
    }
    current.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::ParamMeta;

    #[test]
    fn test_step_globals_stays_in_tempo_range() {
        let mut rng = rand::rng();
        let mut globals = Globals::new(120.0);
        for _ in 0..1000 {
            step_globals(&mut globals, 8.0, (60.0, 240.0), &mut rng);
            assert!(globals.tempo_bpm >= 60.0 && globals.tempo_bpm <= 240.0);
            assert!(globals.energy >= 0.4 && globals.energy <= 1.0);
        }
    }

    #[test]
    fn test_s6_int_param_stays_in_half_to_double_window() {
        let mut rng = rand::rng();
        let default = ParamValue::Int(100);
        let mut current = default.clone();
        for _ in 0..10_000 {
            current = step_value(&default, &current, &mut rng);
            if let ParamValue::Int(v) = current {
                assert!(v >= 50 && v <= 200, "value {v} escaped window");
            }
        }
    }

    #[test]
    fn test_float_param_stays_in_window_and_rounds_to_3_decimals() {
        let mut rng = rand::rng();
        let default = ParamValue::Float(10.0);
        let mut current = default.clone();
        for _ in 0..5_000 {
            current = step_value(&default, &current, &mut rng);
            if let ParamValue::Float(v) = current {
                assert!(v >= 5.0 && v <= 20.0);
                let rounded = (v * 1000.0).round() / 1000.0;
                assert!((v - rounded).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_zero_default_uses_unit_window() {
        let mut rng = rand::rng();
        let default = ParamValue::Float(0.0);
        let mut current = default.clone();
        for _ in 0..1000 {
            current = step_value(&default, &current, &mut rng);
            if let ParamValue::Float(v) = current {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_bool_always_flips() {
        let mut rng = rand::rng();
        let mut current = ParamValue::Bool(false);
        for _ in 0..10 {
            current = step_value(&ParamValue::Bool(true), &current, &mut rng);
        }
        // Flipped 10 times from false: even count returns to false.
        assert_eq!(current, ParamValue::Bool(false));
    }

    #[test]
    fn test_list_param_never_stepped() {
        let mut rng = rand::rng();
        let default = ParamValue::List(vec!["a".into(), "b".into()]);
        let current = default.clone();
        let stepped = step_value(&default, &current, &mut rng);
        assert_eq!(stepped, current);
    }

    #[test]
    fn test_step_params_covers_whole_schema() {
        let mut rng = rand::rng();
        let mut schema = ParamSchema::new();
        schema.insert("freq".into(), ParamMeta::new(ParamValue::Float(440.0)));
        schema.insert("voices".into(), ParamMeta::new(ParamValue::Int(4)));
        let mut current = ParamMap::new();
        let stepped = step_params(&schema, &mut current, &mut rng);
        assert!(stepped.contains_key("freq"));
        assert!(stepped.contains_key("voices"));
    }
}

//! Melody file format: JSON-with-comments parsing into typed [`Melody`]
//! data (`spec.md` §4.4, §6).
//!
//! Grounded on the crate's `serde`/`serde_json` dependency (added for this
//! purpose — the teacher has no JSON support at all) for the structural
//! parse; comment stripping is hand-rolled since `serde_json` doesn't
//! tolerate `//`/`/* */` comments.

use serde_json::{Map, Value};

use crate::error::{MaestroError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub frequency_hz: f64,
    pub duration_beats: f64,
    pub intensity: f64,
}

pub const DEFAULT_INTENSITY: f64 = 0.8;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hand {
    pub events: Vec<NoteEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Melody {
    pub title: Option<String>,
    pub tempo_bpm: Option<f64>,
    pub time_signature: (u32, u32),
    pub hands: Vec<Hand>,
    pub meta: Map<String, Value>,
}

impl Melody {
    /// Parse one melody file's JSON-with-comments text.
    ///
    /// `MalformedMelody` (per `spec.md` §7) if the text doesn't parse as
    /// JSON, or if every hand ends up empty after skipping unusable
    /// events.
    pub fn parse(text: &str) -> Result<Self> {
        let stripped = strip_json_comments(text);
        let value: Value = serde_json::from_str(&stripped)?;
        let obj = value
            .as_object()
            .ok_or_else(|| MaestroError::MalformedMelody("top level is not a JSON object".into()))?;

        let title = obj.get("title").and_then(Value::as_str).map(str::to_string);
        let tempo_bpm = obj.get("tempo").and_then(Value::as_f64);
        let time_signature = obj
            .get("time_signature")
            .and_then(Value::as_str)
            .and_then(parse_time_signature)
            .unwrap_or((4, 4));

        let hands = if let Some(hands_value) = obj.get("hands").and_then(Value::as_array) {
            hands_value.iter().map(parse_hand).collect()
        } else if let Some(notes_value) = obj.get("notes").and_then(Value::as_array) {
            vec![parse_hand(notes_value)]
        } else {
            Vec::new()
        };

        let non_empty: Vec<Hand> = hands.into_iter().filter(|h| !h.events.is_empty()).collect();
        if non_empty.is_empty() {
            return Err(MaestroError::MalformedMelody(
                "melody has no hands with usable events".into(),
            ));
        }

        let mut meta = obj.clone();
        meta.remove("hands");
        meta.remove("notes");

        Ok(Melody {
            title,
            tempo_bpm,
            time_signature,
            hands: non_empty,
            meta,
        })
    }
}

fn parse_time_signature(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let num = parts.next()?.trim().parse().ok()?;
    let den = parts.next()?.trim().parse().ok()?;
    Some((num, den))
}

fn parse_hand(events: &[Value]) -> Hand {
    let events = events.iter().filter_map(parse_event).collect();
    Hand { events }
}

/// Events with a missing or unparseable `frequency` are skipped
/// (`spec.md` §4.4). `duration_beats`/`duration` default to 1 beat if
/// absent; `intensity` defaults to 0.8.
fn parse_event(value: &Value) -> Option<NoteEvent> {
    let obj = value.as_object()?;
    let frequency_hz = obj.get("frequency").and_then(Value::as_f64)?;
    let duration_beats = obj
        .get("duration_beats")
        .or_else(|| obj.get("duration"))
        .and_then(Value::as_f64)
        .filter(|d| *d > 0.0)
        .unwrap_or(1.0);
    let intensity = obj
        .get("intensity")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_INTENSITY);
    Some(NoteEvent { frequency_hz, duration_beats, intensity })
}

/// Strips `//` line comments and `/* */` block comments from `text`,
/// leaving string literal contents untouched (a `//` or `/*` inside a
/// quoted JSON string is not a comment).
pub fn strip_json_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_and_block_comments() {
        let text = r#"{
            // a comment
            "tempo": 96, /* inline */
            "notes": []
        }"#;
        let stripped = strip_json_comments(text);
        let value: Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(value["tempo"], 96);
    }

    #[test]
    fn test_comment_markers_inside_strings_survive() {
        let text = r#"{"title": "A // not a comment /* still not */"}"#;
        let stripped = strip_json_comments(text);
        let value: Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(value["title"], "A // not a comment /* still not */");
    }

    #[test]
    fn test_s1_two_note_melody_parses() {
        let text = r#"{
            "tempo": 120,
            "time_signature": "4/4",
            "hands": [[
                {"frequency": 440, "duration_beats": 1},
                {"frequency": 523.25, "duration_beats": 1}
            ]]
        }"#;
        let melody = Melody::parse(text).unwrap();
        assert_eq!(melody.tempo_bpm, Some(120.0));
        assert_eq!(melody.time_signature, (4, 4));
        assert_eq!(melody.hands.len(), 1);
        assert_eq!(melody.hands[0].events.len(), 2);
    }

    #[test]
    fn test_legacy_top_level_notes_become_single_hand() {
        let text = r#"{"notes": [{"frequency": 220, "duration_beats": 2}]}"#;
        let melody = Melody::parse(text).unwrap();
        assert_eq!(melody.hands.len(), 1);
        assert_eq!(melody.hands[0].events[0].duration_beats, 2.0);
    }

    #[test]
    fn test_missing_frequency_is_skipped() {
        let text = r#"{"notes": [{"duration_beats": 1}, {"frequency": 440, "duration_beats": 1}]}"#;
        let melody = Melody::parse(text).unwrap();
        assert_eq!(melody.hands[0].events.len(), 1);
    }

    #[test]
    fn test_default_intensity_is_point_eight() {
        let text = r#"{"notes": [{"frequency": 440}]}"#;
        let melody = Melody::parse(text).unwrap();
        assert_eq!(melody.hands[0].events[0].intensity, DEFAULT_INTENSITY);
    }

    #[test]
    fn test_all_hands_empty_is_malformed() {
        let text = r#"{"hands": [[], []]}"#;
        assert!(Melody::parse(text).is_err());
    }
}

//! Emotion definitions: named, ordered keyframe sequences.
//!
//! Interchange format is a JSON array:
//! `[{ "id", "label", "keyframes": [{ "durationMs", "params": { ..pose.. } }] }]`

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::motion::pose::PartialPose;

// ── Error Types ────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EmotionError {
    #[error("emotion id is empty")]
    EmptyId,
    #[error("emotion '{0}' has no keyframes")]
    NoKeyframes(String),
    #[error("malformed emotion JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Types ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    /// Interpolation window; 0 applies the target immediately.
    #[serde(deserialize_with = "lenient_duration")]
    pub duration_ms: u32,
    #[serde(default)]
    pub params: PartialPose,
}

impl Keyframe {
    pub fn new(duration_ms: u32, params: PartialPose) -> Self {
        Self {
            duration_ms,
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionDefinition {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Free-text hint listed to the assistant next to the id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

impl EmotionDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>, keyframes: Vec<Keyframe>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keyframes,
        }
    }

    /// Whether the definition can be played at all.
    pub fn is_playable(&self) -> bool {
        !self.keyframes.is_empty()
    }

    /// Sum of all keyframe windows.
    pub fn total_duration_ms(&self) -> u64 {
        self.keyframes.iter().map(|k| k.duration_ms as u64).sum()
    }

    pub fn validate(&self) -> Result<(), EmotionError> {
        if self.id.trim().is_empty() {
            return Err(EmotionError::EmptyId);
        }
        if self.keyframes.is_empty() {
            return Err(EmotionError::NoKeyframes(self.id.clone()));
        }
        Ok(())
    }
}

/// Parse an emotion file body.
///
/// Only a body that is not a JSON array is an error. Entries are read one by
/// one: unreadable entries and blank ids are skipped with a warning, a
/// repeated id replaces the earlier entry, and entries without keyframes are
/// kept (playing them is a no-op) so a later save does not lose drafts.
pub fn parse_emotions(json: &str) -> Result<Vec<EmotionDefinition>, EmotionError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut defs: Vec<EmotionDefinition> = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let def = match serde_json::from_value::<EmotionDefinition>(entry) {
            Ok(def) => def,
            Err(e) => {
                tracing::warn!("[Emotion] skipping entry {}: {}", index, e);
                continue;
            }
        };
        if let Err(e) = def.validate() {
            match e {
                EmotionError::NoKeyframes(_) => tracing::debug!("[Emotion] {}", e),
                _ => {
                    tracing::warn!("[Emotion] skipping entry {}: {}", index, e);
                    continue;
                }
            }
        }
        if let Some(pos) = defs.iter().position(|d| d.id == def.id) {
            tracing::warn!("[Emotion] '{}' defined twice, keeping the later one", def.id);
            defs.remove(pos);
        }
        defs.push(def);
    }
    Ok(defs)
}

/// Hand-edited files sometimes carry negative or fractional durations;
/// clamp to a whole, non-negative millisecond count.
fn lenient_duration<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw <= 0.0 {
        return Ok(0);
    }
    Ok(raw.round().min(u32::MAX as f64) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::pose::PoseKey;

    const SAMPLE: &str = r#"[
        {
            "id": "happy",
            "label": "Happy",
            "keyframes": [
                { "durationMs": 200, "params": { "mouthForm": 1, "eyeSmile": 0.8 } },
                { "durationMs": 400, "params": { "cheek": 0.6 } }
            ]
        },
        { "id": "neutral", "label": "Neutral", "keyframes": [{ "durationMs": 0, "params": {} }] }
    ]"#;

    #[test]
    fn parses_interchange_format() {
        let defs = parse_emotions(SAMPLE).unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].keyframes[0].duration_ms, 200);
        assert_eq!(defs[0].keyframes[0].params.get(PoseKey::EyeSmile), Some(0.8));
        assert_eq!(defs[0].total_duration_ms(), 600);
        assert!(defs[1].keyframes[0].params.is_empty());
    }

    #[test]
    fn clamps_bad_durations() {
        let json = r#"[{ "id": "x", "label": "X", "keyframes": [
            { "durationMs": -50, "params": {} },
            { "durationMs": 99.6, "params": {} }
        ] }]"#;
        let defs = parse_emotions(json).unwrap();
        assert_eq!(defs[0].keyframes[0].duration_ms, 0);
        assert_eq!(defs[0].keyframes[1].duration_ms, 100);
    }

    #[test]
    fn keeps_emotions_without_keyframes() {
        let json = r#"[
            { "id": "wink", "label": "Wink", "keyframes": [{ "durationMs": 120, "params": { "eyeOpen": 0 } }] },
            { "id": "draft", "label": "Draft", "keyframes": [] }
        ]"#;
        let defs = parse_emotions(json).unwrap();
        let ids: Vec<_> = defs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["wink", "draft"]);
        assert!(!defs[1].is_playable());
    }

    #[test]
    fn later_duplicate_wins() {
        let json = r#"[
            { "id": "a", "label": "A", "keyframes": [{ "durationMs": 0, "params": {} }] },
            { "id": "b", "label": "B", "keyframes": [{ "durationMs": 0, "params": {} }] },
            { "id": "a", "label": "A2", "keyframes": [{ "durationMs": 0, "params": {} }] }
        ]"#;
        let defs = parse_emotions(json).unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[1].id, "a");
        assert_eq!(defs[1].label, "A2");
    }

    #[test]
    fn tolerates_missing_labels_and_skips_broken_entries() {
        let json = r#"[
            { "id": "wink", "keyframes": [{ "durationMs": 0, "params": {} }] },
            { "id": "   ", "label": "Blank", "keyframes": [{ "durationMs": 0, "params": {} }] },
            { "label": "No id" },
            42
        ]"#;
        let defs = parse_emotions(json).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].id, "wink");
        assert_eq!(defs[0].label, "");
    }

    #[test]
    fn validate_flags_missing_keyframes() {
        let def = EmotionDefinition::new("blank", "Blank", vec![]);
        assert!(matches!(def.validate(), Err(EmotionError::NoKeyframes(id)) if id == "blank"));
        assert!(matches!(
            EmotionDefinition::new(" ", "", vec![]).validate(),
            Err(EmotionError::EmptyId)
        ));
    }

    #[test]
    fn rejects_non_arrays() {
        assert!(matches!(
            parse_emotions(r#"{ "id": "x" }"#),
            Err(EmotionError::Json(_))
        ));
    }

    #[test]
    fn serializes_camel_case() {
        let def = EmotionDefinition::new(
            "wink",
            "Wink",
            vec![Keyframe::new(
                120,
                PartialPose {
                    eye_open: Some(0.0),
                    ..Default::default()
                },
            )],
        );
        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(value["keyframes"][0]["durationMs"], 120);
        assert_eq!(value["keyframes"][0]["params"]["eyeOpen"], 0.0);
    }
}

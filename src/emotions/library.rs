//! Emotion Library: the owning collection of emotion definitions plus the
//! current selection, hotkey mapping and file persistence.

use std::path::Path;

use anyhow::{Context, Result};

use crate::emotions::definition::{parse_emotions, EmotionDefinition, Keyframe};
use crate::emotions::presets::default_emotions;

pub const NEUTRAL_ID: &str = "neutral";

/// Keys bound to emotions, in library order.
pub const EMOTION_HOTKEYS: [char; 12] = ['a', 's', 'd', 'f', 'g', 'h', 'j', 'k', 'l', 'q', 'w', 'e'];

/// Duration given to keyframes appended from the studio.
const NEW_KEYFRAME_MS: u32 = 300;

#[derive(Debug, Clone)]
pub struct EmotionLibrary {
    emotions: Vec<EmotionDefinition>,
    selected: Option<String>,
}

impl Default for EmotionLibrary {
    fn default() -> Self {
        Self::new(default_emotions())
    }
}

impl EmotionLibrary {
    /// An empty list falls back to the built-in emotions.
    pub fn new(emotions: Vec<EmotionDefinition>) -> Self {
        let emotions = if emotions.is_empty() {
            default_emotions()
        } else {
            emotions
        };
        let selected = emotions
            .iter()
            .find(|e| e.id == NEUTRAL_ID)
            .or_else(|| emotions.first())
            .map(|e| e.id.clone());
        Self { emotions, selected }
    }

    pub fn emotions(&self) -> &[EmotionDefinition] {
        &self.emotions
    }

    pub fn get(&self, id: &str) -> Option<&EmotionDefinition> {
        self.emotions.iter().find(|e| e.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&EmotionDefinition> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    /// `neutral` if present, otherwise the first emotion.
    pub fn neutral(&self) -> Option<&EmotionDefinition> {
        self.get(NEUTRAL_ID).or_else(|| self.emotions.first())
    }

    /// Select an emotion and return the definition to play.
    ///
    /// Picking the emotion that is already selected toggles back to neutral.
    /// Unknown ids resolve to neutral.
    pub fn select(&mut self, id: &str) -> Option<&EmotionDefinition> {
        let neutral_id = self.neutral().map(|e| e.id.clone());
        let target = if self.selected.as_deref() == Some(id) && neutral_id.as_deref() != Some(id) {
            neutral_id.clone()
        } else {
            Some(id.to_string())
        };

        let chosen = target
            .as_deref()
            .and_then(|t| self.get(t))
            .or_else(|| self.neutral())
            .map(|e| e.id.clone())?;
        tracing::debug!("[Emotion] selected '{}' (requested '{}')", chosen, id);
        self.selected = Some(chosen);
        self.selected()
    }

    /// Insert or replace by id and select it. A blank id becomes
    /// `custom-<unix millis>`. Returns the id the definition was stored under.
    pub fn upsert(&mut self, mut emotion: EmotionDefinition) -> String {
        let trimmed = emotion.id.trim();
        emotion.id = if trimmed.is_empty() {
            format!("custom-{}", chrono::Utc::now().timestamp_millis())
        } else {
            trimmed.to_string()
        };
        let id = emotion.id.clone();
        self.emotions.retain(|e| e.id != id);
        self.emotions.push(emotion);
        self.selected = Some(id.clone());
        tracing::info!("[Emotion] saved '{}'", id);
        id
    }

    /// Remove by id. The selection moves to neutral if it pointed at the
    /// removed emotion.
    pub fn remove(&mut self, id: &str) -> Option<EmotionDefinition> {
        let pos = self.emotions.iter().position(|e| e.id == id)?;
        let removed = self.emotions.remove(pos);
        if self.selected.as_deref() == Some(id) {
            self.selected = self.neutral().map(|e| e.id.clone());
        }
        Some(removed)
    }

    /// Emotions paired with their hotkeys, in library order.
    pub fn hotkeys(&self) -> impl Iterator<Item = (char, &EmotionDefinition)> {
        EMOTION_HOTKEYS.iter().copied().zip(self.emotions.iter())
    }

    pub fn emotion_for_hotkey(&self, key: char) -> Option<&EmotionDefinition> {
        let key = key.to_ascii_lowercase();
        self.hotkeys().find(|(k, _)| *k == key).map(|(_, e)| e)
    }

    // ── Studio Editing ─────────────────────────────────

    /// Append a keyframe copying the last one's params.
    pub fn add_keyframe(emotion: &mut EmotionDefinition) {
        let params = emotion
            .keyframes
            .last()
            .map(|k| k.params.clone())
            .unwrap_or_default();
        emotion.keyframes.push(Keyframe::new(NEW_KEYFRAME_MS, params));
    }

    /// Remove a keyframe; the last remaining one is kept.
    pub fn remove_keyframe(emotion: &mut EmotionDefinition, index: usize) -> bool {
        if emotion.keyframes.len() <= 1 || index >= emotion.keyframes.len() {
            return false;
        }
        emotion.keyframes.remove(index);
        true
    }

    // ── Persistence ────────────────────────────────────

    /// Load from a JSON file, falling back to the built-in emotions when
    /// the file is missing or invalid. Keeps `previous_selection` if the
    /// loaded set still contains it.
    pub fn load(path: &Path, previous_selection: Option<&str>) -> Self {
        let emotions = match std::fs::read_to_string(path) {
            Ok(body) => match parse_emotions(&body) {
                Ok(defs) => {
                    tracing::info!(
                        "[Emotion] loaded {} emotions from {}",
                        defs.len(),
                        path.display()
                    );
                    defs
                }
                Err(e) => {
                    tracing::warn!(
                        "[Emotion] invalid emotion file {}: {} — using defaults",
                        path.display(),
                        e
                    );
                    default_emotions()
                }
            },
            Err(_) => {
                tracing::info!(
                    "[Emotion] no emotion file at {} — using defaults",
                    path.display()
                );
                default_emotions()
            }
        };

        let mut library = Self::new(emotions);
        if let Some(prev) = previous_selection {
            if library.get(prev).is_some() {
                library.selected = Some(prev.to_string());
            } else {
                library.selected = library.emotions.first().map(|e| e.id.clone());
            }
        }
        library
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.emotions)
            .context("serializing emotions")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(
            "[Emotion] saved {} emotions to {}",
            self.emotions.len(),
            path.display()
        );
        Ok(())
    }
}

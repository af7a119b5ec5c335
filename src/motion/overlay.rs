//! Overlay effects: single-parameter toggles layered over the face
//! (heart eyes, blush, anger mark, ...).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::rig::{set_if_exists, ParameterSink};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayEffect {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub param_id: String,
    /// Value written when the effect is on.
    #[serde(default = "default_on_value")]
    pub value: f32,
}

fn default_on_value() -> f32 {
    1.0
}

impl OverlayEffect {
    fn new(id: &str, label: &str, param_id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            description: Some(description.to_string()),
            param_id: param_id.to_string(),
            value: default_on_value(),
        }
    }
}

pub fn default_overlays() -> Vec<OverlayEffect> {
    vec![
        OverlayEffect::new("overlay1", "Heart eyes", "Button1", "heart-shaped pupils"),
        OverlayEffect::new("overlay2", "White eyes", "Button2", "eyes rolled back to white"),
        OverlayEffect::new("overlay3", "Dark face", "Button7", "shadow over the face"),
        OverlayEffect::new("overlay4", "Blush", "Button3", "blushing cheeks"),
        OverlayEffect::new("overlay5", "Anger mark", "Button4", "anger vein on the forehead"),
        OverlayEffect::new("overlay6", "Coat", "Button5", "put on or take off the coat"),
        OverlayEffect::new("overlay7", "Eye patch", "Button6", "put on or take off the eye patch"),
    ]
}

/// Current on/off value of every overlay parameter.
#[derive(Debug, Clone)]
pub struct OverlayBoard {
    effects: Vec<OverlayEffect>,
    states: HashMap<String, f32>,
}

impl Default for OverlayBoard {
    fn default() -> Self {
        Self::new(default_overlays())
    }
}

impl OverlayBoard {
    pub fn new(effects: Vec<OverlayEffect>) -> Self {
        let states = effects.iter().map(|e| (e.param_id.clone(), 0.0)).collect();
        Self { effects, states }
    }

    pub fn effects(&self) -> &[OverlayEffect] {
        &self.effects
    }

    pub fn value(&self, param_id: &str) -> Option<f32> {
        self.states.get(param_id).copied()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.effects
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| self.value(&e.param_id))
            .is_some_and(|v| v != 0.0)
    }

    /// Flip the effect bound to number key `index` (1-based).
    pub fn toggle(&mut self, index: usize) -> Option<&OverlayEffect> {
        let effect = index.checked_sub(1).and_then(|i| self.effects.get(i))?;
        let slot = self.states.entry(effect.param_id.clone()).or_insert(0.0);
        *slot = if *slot == effect.value { 0.0 } else { effect.value };
        Some(effect)
    }

    /// Turn on exactly the listed ids and everything else off.
    pub fn set_active<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted: Vec<S> = ids.into_iter().collect();
        for effect in &self.effects {
            let on = wanted.iter().any(|id| id.as_ref() == effect.id);
            self.states
                .insert(effect.param_id.clone(), if on { effect.value } else { 0.0 });
        }
    }

    pub fn apply<S: ParameterSink + ?Sized>(&self, sink: &mut S) {
        if !sink.is_alive() {
            return;
        }
        for effect in &self.effects {
            let value = self.value(&effect.param_id).unwrap_or(0.0);
            set_if_exists(sink, &effect.param_id, value);
        }
    }
}

//! System-prompt sections that tell the assistant which avatar cues exist
//! and how to answer so [`parse_assistant_reply`](super::parse_assistant_reply)
//! can read the result.
//!
//! Persona wording is left to the caller; this module only renders the
//! catalogue of emotions and overlays, the optional user profile and the
//! reply format.

use crate::emotions::{EmotionDefinition, EmotionLibrary};
use crate::motion::{OverlayBoard, OverlayEffect};

pub const REPLY_FORMAT_PROMPT: &str = r#"Reply format:
- Always answer with bare JSON and nothing outside it.
{ "messages": [
    { "type": "reply", "text": "<main answer>" },
    { "type": "comment", "text": "<light remark, if it fits>" },
    { "type": "question", "text": "<follow-up question, if it fits>" }
  ],
  "emotionId": "<emotion id>",
  "overlays": ["<overlay id>"],
  "userNotes": [{ "text": "<something learned about the user>" }]
}

- messages: at least one reply. comment and question are optional; at most two questions.
- emotionId: the one emotion that best fits the answer.
- overlays: expression effects to show, may be empty.
- userNotes: facts about the user worth remembering."#;

const DESCRIPTION_SEPARATOR: &str = " — ";

/// `- id: label`, followed by the description when there is one.
pub fn emotion_line(emotion: &EmotionDefinition) -> String {
    let mut line = format!("- {}: {}", emotion.id, emotion.label);
    push_description(&mut line, emotion.description.as_deref());
    line
}

/// `- id (paramId) hotkey: N: label` plus the description, `hotkey` being
/// the 1-based number key that toggles the overlay.
pub fn overlay_line(effect: &OverlayEffect, hotkey: Option<usize>) -> String {
    let mut line = format!("- {} ({})", effect.id, effect.param_id);
    if let Some(key) = hotkey {
        line.push_str(&format!(" hotkey: {}", key));
    }
    line.push_str(&format!(": {}", effect.label));
    push_description(&mut line, effect.description.as_deref());
    line
}

fn push_description(line: &mut String, description: Option<&str>) {
    if let Some(desc) = description.map(str::trim).filter(|d| !d.is_empty()) {
        line.push_str(DESCRIPTION_SEPARATOR);
        line.push_str(desc);
    }
}

/// Render the cue catalogue appended after the persona text.
///
/// `user_profile` is the stored profile as JSON text; blank profiles are
/// left out.
pub fn render_cue_prompt(
    library: &EmotionLibrary,
    overlays: &OverlayBoard,
    user_profile: Option<&str>,
) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(profile) = user_profile.map(str::trim).filter(|p| !p.is_empty()) {
        sections.push(format!("User profile (JSON):\n{}", profile));
    }

    sections.push(REPLY_FORMAT_PROMPT.to_string());

    let emotions: Vec<String> = library.emotions().iter().map(emotion_line).collect();
    sections.push(format!("Emotions:\n{}", emotions.join("\n")));

    let effects: Vec<String> = overlays
        .effects()
        .iter()
        .enumerate()
        .map(|(i, effect)| overlay_line(effect, Some(i + 1)))
        .collect();
    sections.push(format!("Overlay effects:\n{}", effects.join("\n")));

    sections.join("\n\n")
}

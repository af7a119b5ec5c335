//! Assistant reply decoding.
//!
//! The assistant is prompted to answer with bare JSON:
//! `{ "messages": [{ "type": "reply"|"comment"|"question", "text" }],
//!    "emotionId", "overlays": [..], "userNotes": [{ "text" }] }`.
//! Models drift from that shape, so every field is read leniently and a
//! reply that is not JSON at all is shown as-is.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Reply,
    Comment,
    Question,
}

impl MessageKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "reply" => Some(MessageKind::Reply),
            "comment" => Some(MessageKind::Comment),
            "question" => Some(MessageKind::Question),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNote {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantReply {
    /// Chat bubbles in display order. Never empty after parsing.
    pub messages: Vec<ReplyMessage>,
    pub emotion_id: Option<String>,
    /// `None` leaves the overlays as they are; `Some(vec![])` clears them.
    pub overlays: Option<Vec<String>>,
    pub user_notes: Vec<UserNote>,
}

impl AssistantReply {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|m| m.text.as_str())
    }
}

/// Decode a raw assistant reply. Never fails: anything unreadable becomes a
/// single reply bubble holding the raw text.
pub fn parse_assistant_reply(raw: &str) -> AssistantReply {
    let body = strip_code_fences(raw);
    let parsed = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::debug!("[Chat] reply is not a JSON object, showing raw text");
            return AssistantReply {
                messages: vec![reply(raw)],
                ..Default::default()
            };
        }
    };

    let messages: Vec<ReplyMessage> = parsed
        .get("messages")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|m| {
                    let kind = m.get("type").and_then(Value::as_str).and_then(MessageKind::parse)?;
                    let text = m.get("text").and_then(Value::as_str)?;
                    Some(ReplyMessage {
                        kind,
                        text: text.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let messages = if messages.is_empty() {
        // legacy single-answer shape, else the raw body
        let answer = parsed.get("answer").and_then(Value::as_str).unwrap_or(raw);
        vec![reply(answer)]
    } else {
        messages
    };

    let emotion_id = parsed
        .get("emotionId")
        .and_then(Value::as_str)
        .map(str::to_string);

    let overlays = parsed.get("overlays").and_then(Value::as_array).map(|ids| {
        ids.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    });

    let user_notes = parsed
        .get("userNotes")
        .and_then(Value::as_array)
        .map(|notes| {
            notes
                .iter()
                .filter_map(|n| n.get("text").and_then(Value::as_str))
                .map(|text| UserNote {
                    text: text.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    AssistantReply {
        messages,
        emotion_id,
        overlays,
        user_notes,
    }
}

/// Fold newly reported notes into `existing`, skipping exact duplicates.
/// Returns how many were added.
pub fn merge_user_notes(existing: &mut Vec<UserNote>, incoming: &[UserNote]) -> usize {
    let before = existing.len();
    for note in incoming {
        if !existing.iter().any(|n| n.text == note.text) {
            existing.push(note.clone());
        }
    }
    existing.len() - before
}

fn reply(text: &str) -> ReplyMessage {
    ReplyMessage {
        kind: MessageKind::Reply,
        text: text.to_string(),
    }
}

fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    }
}

//! Chat-side glue: telling the assistant which avatar cues exist, and
//! decoding the structured replies it produces into those cues.

pub mod prompt;
pub mod reply;

pub use prompt::{render_cue_prompt, REPLY_FORMAT_PROMPT};
pub use reply::{
    merge_user_notes, parse_assistant_reply, AssistantReply, MessageKind, ReplyMessage, UserNote,
};

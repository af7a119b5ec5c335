//! Emotion definitions, the built-in set and the owning library.

pub mod definition;
pub mod library;
pub mod presets;

pub use definition::{parse_emotions, EmotionDefinition, EmotionError, Keyframe};
pub use library::{EmotionLibrary, EMOTION_HOTKEYS, NEUTRAL_ID};
pub use presets::default_emotions;

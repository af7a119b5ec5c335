//! Parameter animation engine: blink, gaze, pose blending and emotion
//! playback over a [`crate::rig::ParameterSink`].

pub mod blink;
pub mod gaze;
pub mod overlay;
pub mod playback;
pub mod pose;


pub use blink::{BlinkAnimator, BlinkPhase, BlinkTiming};
pub use gaze::{GazeAnimator, GazeInput, GazeMode, GazeTuning, Vec2};
pub use overlay::{OverlayBoard, OverlayEffect};
pub use playback::{EmotionPlayer, PlaybackHandle, PlaybackStatus};
pub use pose::{PartialPose, Pose, PoseKey};

pub mod chat;
pub mod config;
pub mod driver;
pub mod emotions;
pub mod motion;
pub mod rig;

pub use chat::{parse_assistant_reply, render_cue_prompt, AssistantReply};
pub use config::{AvatarConfig, TrackingConfig};
pub use driver::{run_frame_loop, AvatarDriver, FrameReport, PointerState};
pub use emotions::{EmotionDefinition, EmotionLibrary, Keyframe};
pub use motion::{PartialPose, PlaybackHandle, PlaybackStatus, Pose, PoseKey, Vec2};
pub use rig::{Clock, ManualClock, MemoryRig, ParameterSink, RigError, SystemClock};

use tracing_subscriber::{fmt, EnvFilter};

/// Install the fmt subscriber, filtered by `RUST_LOG` (default
/// `avatar_motion=info`). Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("avatar_motion=info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

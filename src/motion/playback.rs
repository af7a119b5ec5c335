//! Emotion playback: walks an emotion's keyframes over wall-clock time,
//! blending from the rig's current pose and writing the result every frame.
//!
//! An [`EmotionPlayer`] belongs to exactly one rig and owns at most one
//! in-flight playback; starting another cancels the first before the new
//! snapshot is taken. Callers receive a [`PlaybackHandle`] they can poll or
//! cancel from anywhere.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::emotions::{EmotionDefinition, Keyframe};
use crate::motion::pose::Pose;
use crate::rig::{Clock, ParameterSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Running,
    Finished,
    Cancelled,
}

impl PlaybackStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => PlaybackStatus::Running,
            1 => PlaybackStatus::Finished,
            _ => PlaybackStatus::Cancelled,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            PlaybackStatus::Running => 0,
            PlaybackStatus::Finished => 1,
            PlaybackStatus::Cancelled => 2,
        }
    }
}

/// Shared view of one playback's lifecycle.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    emotion_id: Arc<str>,
    status: Arc<AtomicU8>,
}

impl PlaybackHandle {
    fn new(emotion_id: &str) -> Self {
        Self {
            emotion_id: Arc::from(emotion_id),
            status: Arc::new(AtomicU8::new(PlaybackStatus::Running.as_u8())),
        }
    }

    pub fn emotion_id(&self) -> &str {
        &self.emotion_id
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.status() == PlaybackStatus::Running
    }

    /// Stop the playback before its next frame. No-op once it has ended.
    pub fn cancel(&self) {
        self.finish(PlaybackStatus::Cancelled);
    }

    fn finish(&self, status: PlaybackStatus) {
        let _ = self.status.compare_exchange(
            PlaybackStatus::Running.as_u8(),
            status.as_u8(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

struct ActivePlayback {
    handle: PlaybackHandle,
    frames: Vec<Keyframe>,
    index: usize,
    from: Pose,
    frame_started_at: f64,
}

pub struct EmotionPlayer {
    clock: Arc<dyn Clock>,
    active: Option<ActivePlayback>,
}

impl EmotionPlayer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            active: None,
        }
    }

    /// The in-flight playback, if any.
    pub fn current(&self) -> Option<&PlaybackHandle> {
        self.active
            .as_ref()
            .map(|a| &a.handle)
            .filter(|h| h.is_running())
    }

    pub fn is_playing(&self) -> bool {
        self.current().is_some()
    }

    /// Start `emotion`, replacing anything already playing.
    ///
    /// Returns `None` (and leaves the current playback untouched) when the
    /// rig is gone or the emotion has no keyframes.
    pub fn play<S: ParameterSink + ?Sized>(
        &mut self,
        sink: &S,
        emotion: &EmotionDefinition,
    ) -> Option<PlaybackHandle> {
        if !sink.is_alive() || !emotion.is_playable() {
            tracing::debug!("[Emotion] ignoring play of '{}'", emotion.id);
            return None;
        }
        self.cancel();

        let handle = PlaybackHandle::new(&emotion.id);
        self.active = Some(ActivePlayback {
            handle: handle.clone(),
            frames: emotion.keyframes.clone(),
            index: 0,
            from: Pose::snapshot(sink),
            frame_started_at: self.clock.now_ms(),
        });
        tracing::debug!(
            "[Emotion] playing '{}' ({} keyframes)",
            emotion.id,
            emotion.keyframes.len()
        );
        Some(handle)
    }

    /// Cancel the in-flight playback, if any.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            if active.handle.is_running() {
                tracing::debug!("[Emotion] cancelled '{}'", active.handle.emotion_id());
            }
            active.handle.cancel();
        }
    }

    /// Advance one animation frame: write the blended pose and move to the
    /// next keyframe once the current one completes.
    pub fn tick<S: ParameterSink + ?Sized>(&mut self, sink: &mut S) -> Option<PlaybackStatus> {
        let active = self.active.as_mut()?;

        if !active.handle.is_running() {
            let status = active.handle.status();
            self.active = None;
            return Some(status);
        }
        if !sink.is_alive() {
            tracing::debug!(
                "[Emotion] rig gone, dropping '{}'",
                active.handle.emotion_id()
            );
            active.handle.cancel();
            self.active = None;
            return Some(PlaybackStatus::Cancelled);
        }

        let now = self.clock.now_ms();
        let frame = &active.frames[active.index];
        let progress = if frame.duration_ms == 0 {
            1.0
        } else {
            ((now - active.frame_started_at) / frame.duration_ms as f64).clamp(0.0, 1.0) as f32
        };
        let mixed = active.from.mix(&frame.params, progress);
        mixed.apply(sink);

        if progress >= 1.0 {
            active.from = mixed;
            active.index += 1;
            active.frame_started_at = now;
            if active.index >= active.frames.len() {
                tracing::debug!("[Emotion] finished '{}'", active.handle.emotion_id());
                active.handle.finish(PlaybackStatus::Finished);
                self.active = None;
                return Some(PlaybackStatus::Finished);
            }
        }
        Some(PlaybackStatus::Running)
    }
}

impl Drop for EmotionPlayer {
    fn drop(&mut self) {
        self.cancel();
    }
}

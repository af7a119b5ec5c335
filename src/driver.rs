//! Avatar Driver: the per-frame orchestrator.
//!
//! Each frame the driver advances the emotion playback, then the blink
//! animator, then the gaze animator (which echoes the blink value to both
//! eyes so the lids always land last). Chat replies and hotkeys enter here
//! as emotion selections and overlay changes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::chat::AssistantReply;
use crate::config::AvatarConfig;
use crate::emotions::EmotionLibrary;
use crate::motion::{
    BlinkAnimator, EmotionPlayer, GazeAnimator, GazeInput, OverlayBoard, PlaybackHandle,
    PlaybackStatus, Vec2,
};
use crate::rig::{Clock, ParameterSink};

/// Upper bound on the per-frame delta (about 100 ms at 60 fps).
pub const MAX_FRAME_DELTA: f32 = 6.0;

/// What one frame produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub delta: f32,
    pub eye_open: f32,
    pub attention: f32,
    pub playback: Option<PlaybackStatus>,
}

pub struct AvatarDriver {
    clock: Arc<dyn Clock>,
    config: AvatarConfig,
    blink: BlinkAnimator,
    gaze: GazeAnimator,
    player: EmotionPlayer,
    overlays: OverlayBoard,
    library: EmotionLibrary,
    last_frame_at: Option<f64>,
}

impl AvatarDriver {
    pub fn new(clock: Arc<dyn Clock>, config: AvatarConfig, library: EmotionLibrary) -> Self {
        let blink = BlinkAnimator::new(clock.clone(), config.blink.clone());
        let gaze = GazeAnimator::new(clock.clone(), config.gaze.clone());
        Self::assemble(clock, config, library, blink, gaze)
    }

    /// Same as [`AvatarDriver::new`] with seeded blink and glance schedules.
    pub fn with_seed(
        clock: Arc<dyn Clock>,
        config: AvatarConfig,
        library: EmotionLibrary,
        seed: u64,
    ) -> Self {
        let blink = BlinkAnimator::with_seed(clock.clone(), config.blink.clone(), seed);
        let gaze = GazeAnimator::with_seed(clock.clone(), config.gaze.clone(), seed.wrapping_add(1));
        Self::assemble(clock, config, library, blink, gaze)
    }

    fn assemble(
        clock: Arc<dyn Clock>,
        config: AvatarConfig,
        library: EmotionLibrary,
        blink: BlinkAnimator,
        gaze: GazeAnimator,
    ) -> Self {
        Self {
            player: EmotionPlayer::new(clock.clone()),
            clock,
            config,
            blink,
            gaze,
            overlays: OverlayBoard::default(),
            library,
            last_frame_at: None,
        }
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    pub fn library(&self) -> &EmotionLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut EmotionLibrary {
        &mut self.library
    }

    pub fn overlays(&self) -> &OverlayBoard {
        &self.overlays
    }

    pub fn gaze(&self) -> &GazeAnimator {
        &self.gaze
    }

    pub fn blink(&self) -> &BlinkAnimator {
        &self.blink
    }

    pub fn current_playback(&self) -> Option<&PlaybackHandle> {
        self.player.current()
    }

    /// Run one frame against `sink`.
    ///
    /// `pointer` and `viewport_center` are in viewport pixels; the tracking
    /// center is the viewport center shifted by the configured head offset.
    pub fn tick<S: ParameterSink + ?Sized>(
        &mut self,
        sink: &mut S,
        pointer: Vec2,
        viewport_center: Vec2,
    ) -> FrameReport {
        let now = self.clock.now_ms();
        let delta = match self.last_frame_at {
            Some(prev) => ((now - prev) / self.config.frame_ms())
                .clamp(0.0, MAX_FRAME_DELTA as f64) as f32,
            None => 1.0,
        };
        self.last_frame_at = Some(now);

        let playback = self.player.tick(sink);
        let eye_open = self.blink.update(sink, delta);
        let tracking = &self.config.tracking;
        self.gaze.update(GazeInput {
            sink,
            delta,
            center: tracking.center(viewport_center),
            pointer,
            track_radius: tracking.radius(),
            blink_open: eye_open,
        });

        FrameReport {
            delta,
            eye_open,
            attention: self.gaze.attention(),
            playback,
        }
    }

    /// Select `id` in the library (with toggle-to-neutral) and play it.
    pub fn play_emotion<S: ParameterSink + ?Sized>(
        &mut self,
        sink: &S,
        id: &str,
    ) -> Option<PlaybackHandle> {
        let emotion = self.library.select(id)?;
        self.player.play(sink, emotion)
    }

    /// Play the emotion bound to a hotkey, if any.
    pub fn play_hotkey<S: ParameterSink + ?Sized>(
        &mut self,
        sink: &S,
        key: char,
    ) -> Option<PlaybackHandle> {
        let id = self.library.emotion_for_hotkey(key)?.id.clone();
        self.play_emotion(sink, &id)
    }

    pub fn toggle_overlay<S: ParameterSink + ?Sized>(&mut self, sink: &mut S, index: usize) -> bool {
        let toggled = self.overlays.toggle(index).is_some();
        if toggled {
            self.overlays.apply(sink);
        }
        toggled
    }

    /// Apply the avatar cues carried by an assistant reply.
    pub fn apply_reply<S: ParameterSink + ?Sized>(
        &mut self,
        sink: &mut S,
        reply: &AssistantReply,
    ) -> Option<PlaybackHandle> {
        if let Some(ids) = &reply.overlays {
            self.overlays.set_active(ids);
            self.overlays.apply(sink);
        }
        let id = reply.emotion_id.as_deref()?;
        tracing::debug!("[Driver] reply asks for emotion '{}'", id);
        self.play_emotion(sink, id)
    }

    pub fn stop_emotion(&mut self) {
        self.player.cancel();
    }
}

// ── Frame Loop ─────────────────────────────────────────

/// Latest pointer position and viewport center, published by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub pointer: Vec2,
    pub viewport_center: Vec2,
}

/// Drive `driver` at the configured frame rate until shutdown is signalled
/// (`true` sent, or the sender dropped) or the rig goes away. Returns the
/// number of frames run.
pub async fn run_frame_loop<S: ParameterSink + ?Sized>(
    driver: &mut AvatarDriver,
    sink: &mut S,
    pointer: watch::Receiver<PointerState>,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    let period = Duration::from_secs_f64(driver.config().frame_ms() / 1000.0);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frames = 0u64;

    tracing::info!("[Driver] Frame loop started ({:?} per frame)", period);
    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {
                if !sink.is_alive() {
                    tracing::info!("[Driver] Rig gone, stopping frame loop");
                    break;
                }
                let state = *pointer.borrow();
                driver.tick(sink, state.pointer, state.viewport_center);
                frames += 1;
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    driver.stop_emotion();
    tracing::info!("[Driver] Frame loop stopped after {} frames", frames);
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::parse_assistant_reply;
    use crate::motion::GazeMode;
    use crate::rig::{ManualClock, MemoryRig, RigError, SystemClock};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn setup() -> (Arc<ManualClock>, AvatarDriver, MemoryRig) {
        let clock = Arc::new(ManualClock::new(0.0));
        let driver = AvatarDriver::with_seed(
            clock.clone(),
            AvatarConfig::default(),
            EmotionLibrary::default(),
            3,
        );
        let mut rig = MemoryRig::cubism_standard();
        for id in ["Button1", "Button2", "Button3", "Button4", "Button5", "Button6", "Button7"] {
            rig.insert(id, 0.0);
        }
        (clock, driver, rig)
    }

    #[test]
    fn delta_follows_elapsed_time() {
        let (clock, mut driver, mut rig) = setup();
        let center = Vec2::new(400.0, 300.0);
        assert_eq!(driver.tick(&mut rig, center, center).delta, 1.0);
        clock.advance(FRAME_MS * 2.0);
        let report = driver.tick(&mut rig, center, center);
        assert!((report.delta - 2.0).abs() < 1e-4, "delta {}", report.delta);
    }

    #[test]
    fn delta_is_capped_after_a_stall() {
        let (clock, mut driver, mut rig) = setup();
        let center = Vec2::new(400.0, 300.0);
        driver.tick(&mut rig, center, center);
        clock.advance(1_000.0);
        assert_eq!(driver.tick(&mut rig, center, center).delta, MAX_FRAME_DELTA);
        clock.advance(FRAME_MS);
        let report = driver.tick(&mut rig, center, center);
        assert!((report.delta - 1.0).abs() < 1e-4, "delta {}", report.delta);
    }

    #[test]
    fn head_offset_shifts_the_tracking_center() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut config = AvatarConfig::default();
        config.tracking.head_offset_y = -200.0;
        config.tracking.track_radius = 100.0;
        let mut driver =
            AvatarDriver::with_seed(clock.clone(), config, EmotionLibrary::default(), 1);
        let mut rig = MemoryRig::cubism_standard();
        let center = Vec2::new(400.0, 300.0);

        // the viewport center is 200px below the head: outside the radius
        for _ in 0..120 {
            clock.advance(FRAME_MS);
            driver.tick(&mut rig, center, center);
        }
        assert_eq!(driver.gaze().mode(), GazeMode::Idle);

        for _ in 0..120 {
            clock.advance(FRAME_MS);
            driver.tick(&mut rig, Vec2::new(400.0, 100.0), center);
        }
        assert_eq!(driver.gaze().mode(), GazeMode::Tracking);
        assert!(driver.gaze().attention() > 0.9);
    }

    #[test]
    fn blink_lands_on_both_eyes_after_emotion() {
        let (clock, mut driver, mut rig) = setup();
        let center = Vec2::ZERO;
        // surprised widens the eyes; the blink value must still win
        driver.play_emotion(&rig, "surprised").unwrap();
        clock.advance(FRAME_MS);
        let report = driver.tick(&mut rig, center, center);
        assert_eq!(rig.value("ParamEyeLOpen"), Some(report.eye_open));
        assert_eq!(rig.value("ParamEyeROpen"), Some(report.eye_open));
    }

    #[test]
    fn emotion_plays_to_completion_through_ticks() {
        let (clock, mut driver, mut rig) = setup();
        let handle = driver.play_emotion(&rig, "happy").unwrap();
        for _ in 0..40 {
            clock.advance(FRAME_MS);
            driver.tick(&mut rig, Vec2::ZERO, Vec2::ZERO);
        }
        assert_eq!(handle.status(), PlaybackStatus::Finished);
        assert_eq!(rig.value("ParamMouthForm"), Some(1.0));
        assert_eq!(driver.library().selected_id(), Some("happy"));
    }

    #[test]
    fn hotkey_toggles_back_to_neutral() {
        let (_clock, mut driver, rig) = setup();
        let first = driver.play_hotkey(&rig, 's').unwrap();
        assert_eq!(first.emotion_id(), "happy");
        let second = driver.play_hotkey(&rig, 'S').unwrap();
        assert_eq!(second.emotion_id(), "neutral");
        assert_eq!(first.status(), PlaybackStatus::Cancelled);
        assert!(driver.play_hotkey(&rig, 'z').is_none());
    }

    #[test]
    fn reply_drives_emotion_and_overlays() {
        let (_clock, mut driver, mut rig) = setup();
        driver.toggle_overlay(&mut rig, 1);
        assert_eq!(rig.value("Button1"), Some(1.0));

        let reply = parse_assistant_reply(
            r#"{ "messages": [{ "type": "reply", "text": "yay" }],
                 "emotionId": "happy", "overlays": ["overlay4"] }"#,
        );
        let handle = driver.apply_reply(&mut rig, &reply).unwrap();
        assert_eq!(handle.emotion_id(), "happy");
        assert_eq!(rig.value("Button1"), Some(0.0));
        assert_eq!(rig.value("Button3"), Some(1.0));
    }

    #[test]
    fn reply_without_cues_changes_nothing() {
        let (_clock, mut driver, mut rig) = setup();
        driver.toggle_overlay(&mut rig, 2);
        let reply = parse_assistant_reply("plain words");
        assert!(driver.apply_reply(&mut rig, &reply).is_none());
        assert!(driver.overlays().is_active("overlay2"));
        assert!(driver.current_playback().is_none());
    }

    // ── Frame loop ──

    /// Rig that disappears after a fixed number of liveness checks.
    struct FadingRig {
        inner: MemoryRig,
        checks_left: std::cell::Cell<u32>,
    }

    impl ParameterSink for FadingRig {
        fn set_parameter(&mut self, id: &str, value: f32) -> Result<(), RigError> {
            self.inner.set_parameter(id, value)
        }

        fn get_parameter(&self, id: &str) -> Result<f32, RigError> {
            self.inner.get_parameter(id)
        }

        fn is_alive(&self) -> bool {
            let left = self.checks_left.get();
            self.checks_left.set(left.saturating_sub(1));
            left > 0
        }
    }

    fn loop_driver() -> AvatarDriver {
        AvatarDriver::with_seed(
            Arc::new(SystemClock::new()),
            AvatarConfig::default(),
            EmotionLibrary::default(),
            9,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn frame_loop_runs_until_shutdown() {
        let mut driver = loop_driver();
        let mut rig = MemoryRig::cubism_standard();
        let center = Vec2::new(400.0, 300.0);
        let (_pointer_tx, pointer_rx) = watch::channel(PointerState {
            pointer: Vec2::new(450.0, 300.0),
            viewport_center: center,
        });
        let (stop_tx, stop_rx) = watch::channel(false);

        let (frames, _) = tokio::join!(
            run_frame_loop(&mut driver, &mut rig, pointer_rx, stop_rx),
            async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                let _ = stop_tx.send(true);
            }
        );

        assert!((110..=125).contains(&frames), "ran {} frames", frames);
        assert_eq!(driver.gaze().mode(), GazeMode::Tracking);
        assert_eq!(driver.gaze().attention(), 1.0);
        assert!(rig.value("ParamAngleX").unwrap() > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn frame_loop_follows_pointer_updates() {
        let mut driver = loop_driver();
        let mut rig = MemoryRig::cubism_standard();
        let center = Vec2::new(400.0, 300.0);
        let (pointer_tx, pointer_rx) = watch::channel(PointerState {
            pointer: Vec2::new(2000.0, 300.0),
            viewport_center: center,
        });
        let (stop_tx, stop_rx) = watch::channel(false);

        tokio::join!(
            run_frame_loop(&mut driver, &mut rig, pointer_rx, stop_rx),
            async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                let _ = pointer_tx.send(PointerState {
                    pointer: Vec2::new(300.0, 300.0),
                    viewport_center: center,
                });
                tokio::time::sleep(Duration::from_secs(2)).await;
                drop(stop_tx);
            }
        );

        assert_eq!(driver.gaze().mode(), GazeMode::Tracking);
        assert!(rig.value("ParamAngleX").unwrap() < -10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn frame_loop_stops_when_rig_goes_away() {
        let mut driver = loop_driver();
        let mut rig = FadingRig {
            inner: MemoryRig::cubism_standard(),
            checks_left: std::cell::Cell::new(30),
        };
        let (_pointer_tx, pointer_rx) = watch::channel(PointerState::default());
        let (_stop_tx, stop_rx) = watch::channel(false);

        let frames = run_frame_loop(&mut driver, &mut rig, pointer_rx, stop_rx).await;
        assert!(frames > 0 && frames < 30, "ran {} frames", frames);
    }
}

//! Gaze Animator: head and eye follow-through with an attention ramp.
//!
//! Inside the tracking radius the avatar turns toward the pointer at full
//! attention. Outside it relaxes to straight ahead, except for occasional
//! idle glances toward wherever the pointer happens to be.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::rig::{set_if_exists, Clock, ParameterSink};

/// Radius floor, in pointer units.
pub const MIN_TRACK_RADIUS: f32 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Rates and amplitudes. Rates are per unit of frame delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeTuning {
    pub tracking_blend: f32,
    pub glance_blend: f32,
    pub idle_blend: f32,
    pub tracking_attention_rate: f32,
    pub glance_attention_rate: f32,
    pub idle_attention_rate: f32,
    pub glance_attention: f32,
    pub glance_duration_ms: f64,
    pub min_glance_interval_ms: f64,
    pub max_glance_interval_ms: f64,
    /// Head angle (degrees) at full offset and full attention.
    pub head_range: f32,
    /// Eyeball travel at full offset and full attention.
    pub eye_range: f32,
}

impl Default for GazeTuning {
    fn default() -> Self {
        Self {
            tracking_blend: 0.08,
            glance_blend: 0.03,
            idle_blend: 0.02,
            tracking_attention_rate: 0.06,
            glance_attention_rate: 0.035,
            idle_attention_rate: 0.02,
            glance_attention: 0.6,
            glance_duration_ms: 2200.0,
            min_glance_interval_ms: 10_000.0,
            max_glance_interval_ms: 18_000.0,
            head_range: 30.0,
            eye_range: 0.35,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GazeMode {
    Idle,
    Tracking,
}

/// Per-tick inputs supplied by the driver.
pub struct GazeInput<'a, S: ParameterSink + ?Sized> {
    pub sink: &'a mut S,
    /// Frame delta in ticker units (1.0 ≈ one 60 Hz frame).
    pub delta: f32,
    pub center: Vec2,
    pub pointer: Vec2,
    pub track_radius: f32,
    /// Eye openness from the blink animator, echoed to both eyes.
    pub blink_open: f32,
}

pub struct GazeAnimator {
    clock: Arc<dyn Clock>,
    rng: StdRng,
    tuning: GazeTuning,
    attention: f32,
    mode: GazeMode,
    smooth_target: Vec2,
    next_glance_at: f64,
    glance_end_at: f64,
    glance_target: Vec2,
}

impl GazeAnimator {
    pub fn new(clock: Arc<dyn Clock>, tuning: GazeTuning) -> Self {
        Self::with_rng(clock, tuning, StdRng::from_entropy())
    }

    pub fn with_seed(clock: Arc<dyn Clock>, tuning: GazeTuning, seed: u64) -> Self {
        Self::with_rng(clock, tuning, StdRng::seed_from_u64(seed))
    }

    fn with_rng(clock: Arc<dyn Clock>, tuning: GazeTuning, rng: StdRng) -> Self {
        let next_glance_at = clock.now_ms() + tuning.min_glance_interval_ms;
        Self {
            clock,
            rng,
            tuning,
            attention: 0.0,
            mode: GazeMode::Idle,
            smooth_target: Vec2::ZERO,
            next_glance_at,
            glance_end_at: 0.0,
            glance_target: Vec2::ZERO,
        }
    }

    pub fn attention(&self) -> f32 {
        self.attention
    }

    pub fn mode(&self) -> GazeMode {
        self.mode
    }

    pub fn smoothed_target(&self) -> Vec2 {
        self.smooth_target
    }

    pub fn is_glancing(&self) -> bool {
        self.clock.now_ms() < self.glance_end_at
    }

    pub fn next_glance_at(&self) -> f64 {
        self.next_glance_at
    }

    pub fn update<S: ParameterSink + ?Sized>(&mut self, input: GazeInput<'_, S>) {
        let GazeInput {
            sink,
            delta,
            center,
            pointer,
            track_radius,
            blink_open,
        } = input;
        if !sink.is_alive() {
            return;
        }
        let delta = delta.max(0.0);

        let dx = pointer.x - center.x;
        let dy = pointer.y - center.y;
        let radius = track_radius.max(MIN_TRACK_RADIUS);
        let within = dx.hypot(dy) <= radius;
        let offset = Vec2::new((dx / radius).clamp(-1.0, 1.0), (dy / radius).clamp(-1.0, 1.0));

        let now = self.clock.now_ms();
        let (active, target_attention, glancing) = if within {
            self.mode = GazeMode::Tracking;
            self.next_glance_at = now + self.glance_interval();
            (offset, 1.0, false)
        } else {
            if now >= self.next_glance_at {
                self.glance_target = offset;
                self.glance_end_at = now + self.tuning.glance_duration_ms;
                self.next_glance_at = now + self.glance_interval();
                tracing::debug!(
                    "[Gaze] glance toward ({:.2}, {:.2})",
                    offset.x,
                    offset.y
                );
            }
            if now < self.glance_end_at {
                (self.glance_target, self.tuning.glance_attention, true)
            } else {
                self.mode = GazeMode::Idle;
                (Vec2::ZERO, 0.0, false)
            }
        };

        let t = &self.tuning;
        let (blend, rate) = if within {
            (t.tracking_blend, t.tracking_attention_rate)
        } else if glancing {
            (t.glance_blend, t.glance_attention_rate)
        } else {
            (t.idle_blend, t.idle_attention_rate)
        };

        let k = (blend * delta).min(1.0);
        self.smooth_target.x = damp(self.smooth_target.x, active.x, k);
        self.smooth_target.y = damp(self.smooth_target.y, active.y, k);

        let step = rate * delta;
        let attention = if self.attention < target_attention {
            (self.attention + step).min(target_attention)
        } else {
            (self.attention - step).max(target_attention)
        };
        self.attention = attention.clamp(0.0, 1.0);

        let head = self.tuning.head_range * self.attention;
        let eyes = self.tuning.eye_range * self.attention;
        let s = self.smooth_target;
        set_if_exists(sink, "ParamAngleX", s.x * head);
        set_if_exists(sink, "ParamAngleY", -s.y * head);
        set_if_exists(sink, "ParamEyeBallX", s.x * eyes);
        set_if_exists(sink, "ParamEyeBallY", -s.y * eyes);
        set_if_exists(sink, "ParamEyeLOpen", blink_open);
        set_if_exists(sink, "ParamEyeROpen", blink_open);
    }

    fn glance_interval(&mut self) -> f64 {
        let (lo, hi) = (
            self.tuning.min_glance_interval_ms,
            self.tuning.max_glance_interval_ms,
        );
        if hi > lo {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }
}

fn damp(current: f32, target: f32, k: f32) -> f32 {
    current + (target - current) * k
}

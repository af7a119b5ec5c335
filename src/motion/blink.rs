//! Blink Animator: involuntary blinking as a wall-clock state machine.
//!
//! idle → closing → closed → opening → settle → idle. Each phase ends at an
//! absolute timestamp; the animator returns the eye openness for the current
//! instant and nudges the pupil scale for a little life around the blink.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::rig::{set_if_exists, Clock, ParameterSink};

const PUPIL_IDS: [&str; 2] = ["ParamEyeBallScaleX", "ParamEyeBallScaleY"];

/// Pupil scale pushed while the lid is shut.
const PUPIL_CLOSED: f32 = 1.08;
/// Pupil scale right after the lid reopens.
const PUPIL_REOPENED: f32 = 0.90;

/// Phase durations and the idle interval range, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkTiming {
    pub min_interval_ms: f64,
    pub max_interval_ms: f64,
    pub closing_ms: f64,
    pub closed_ms: f64,
    pub opening_ms: f64,
    pub settle_ms: f64,
}

impl Default for BlinkTiming {
    fn default() -> Self {
        Self {
            min_interval_ms: 2200.0,
            max_interval_ms: 5800.0,
            closing_ms: 120.0,
            closed_ms: 80.0,
            opening_ms: 140.0,
            settle_ms: 120.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Idle,
    Closing,
    Closed,
    Opening,
    Settle,
}

pub struct BlinkAnimator {
    clock: Arc<dyn Clock>,
    rng: StdRng,
    timing: BlinkTiming,
    phase: BlinkPhase,
    phase_started_at: f64,
    phase_ends_at: f64,
    next_blink_at: f64,
}

impl BlinkAnimator {
    pub fn new(clock: Arc<dyn Clock>, timing: BlinkTiming) -> Self {
        Self::with_rng(clock, timing, StdRng::from_entropy())
    }

    /// Deterministic schedule for tests and replays.
    pub fn with_seed(clock: Arc<dyn Clock>, timing: BlinkTiming, seed: u64) -> Self {
        Self::with_rng(clock, timing, StdRng::seed_from_u64(seed))
    }

    fn with_rng(clock: Arc<dyn Clock>, timing: BlinkTiming, rng: StdRng) -> Self {
        let mut animator = Self {
            clock,
            rng,
            timing,
            phase: BlinkPhase::Idle,
            phase_started_at: 0.0,
            phase_ends_at: 0.0,
            next_blink_at: 0.0,
        };
        let now = animator.clock.now_ms();
        animator.schedule_next(now);
        animator
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    /// Timestamp at which the next involuntary blink starts.
    pub fn next_blink_at(&self) -> f64 {
        self.next_blink_at
    }

    /// Advance the state machine and return eye openness in [0,1].
    ///
    /// `_delta` is accepted for symmetry with the other per-frame updates;
    /// phases are timed against the clock, not accumulated deltas.
    pub fn update<S: ParameterSink + ?Sized>(&mut self, sink: &mut S, _delta: f32) -> f32 {
        if !sink.is_alive() {
            return 1.0;
        }
        let now = self.clock.now_ms();

        if self.phase == BlinkPhase::Idle && now >= self.next_blink_at {
            self.enter(BlinkPhase::Closing, now, self.timing.closing_ms);
            tracing::trace!("[Blink] closing at {:.0}ms", now);
        }

        let eye_open = match self.phase {
            BlinkPhase::Idle => 1.0,
            BlinkPhase::Closing => {
                let t = self.progress(now);
                write_pupil(sink, 1.0 + (PUPIL_CLOSED - 1.0) * t);
                if now >= self.phase_ends_at {
                    self.enter(BlinkPhase::Closed, now, self.timing.closed_ms);
                }
                1.0 - t
            }
            BlinkPhase::Closed => {
                write_pupil(sink, PUPIL_CLOSED);
                if now >= self.phase_ends_at {
                    self.enter(BlinkPhase::Opening, now, self.timing.opening_ms);
                }
                0.0
            }
            BlinkPhase::Opening => {
                let t = self.progress(now);
                write_pupil(sink, PUPIL_CLOSED + (PUPIL_REOPENED - PUPIL_CLOSED) * t);
                if now >= self.phase_ends_at {
                    self.enter(BlinkPhase::Settle, now, self.timing.settle_ms);
                }
                t
            }
            BlinkPhase::Settle => {
                let t = self.progress(now);
                write_pupil(sink, PUPIL_REOPENED + (1.0 - PUPIL_REOPENED) * t);
                if now >= self.phase_ends_at {
                    self.schedule_next(now);
                }
                1.0
            }
        };

        eye_open.clamp(0.0, 1.0)
    }

    fn enter(&mut self, phase: BlinkPhase, now: f64, duration_ms: f64) {
        self.phase = phase;
        self.phase_started_at = now;
        self.phase_ends_at = now + duration_ms.max(0.0);
    }

    fn schedule_next(&mut self, now: f64) {
        let (lo, hi) = (self.timing.min_interval_ms, self.timing.max_interval_ms);
        let interval = if hi > lo { self.rng.gen_range(lo..hi) } else { lo };
        self.next_blink_at = now + interval;
        self.phase = BlinkPhase::Idle;
        self.phase_started_at = now;
        self.phase_ends_at = 0.0;
        tracing::debug!("[Blink] next blink in {:.0}ms", interval);
    }

    /// Linear progress through the current phase, in [0,1].
    fn progress(&self, now: f64) -> f32 {
        let total = self.phase_ends_at - self.phase_started_at;
        if total <= 0.0 || now >= self.phase_ends_at {
            return 1.0;
        }
        ((now - self.phase_started_at) / total).clamp(0.0, 1.0) as f32
    }
}

fn write_pupil<S: ParameterSink + ?Sized>(sink: &mut S, scale: f32) {
    for id in PUPIL_IDS {
        set_if_exists(sink, id, scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::{ManualClock, MemoryRig};

    fn setup(seed: u64) -> (Arc<ManualClock>, BlinkAnimator) {
        let clock = Arc::new(ManualClock::new(0.0));
        let blink = BlinkAnimator::with_seed(clock.clone(), BlinkTiming::default(), seed);
        (clock, blink)
    }

    #[test]
    fn first_blink_lands_in_the_idle_window() {
        for seed in 0..32 {
            let (_clock, blink) = setup(seed);
            let at = blink.next_blink_at();
            assert!((2200.0..5800.0).contains(&at), "seed {} scheduled at {}", seed, at);
        }
    }

    #[test]
    fn stays_open_while_idle() {
        let (clock, mut blink) = setup(1);
        let mut rig = MemoryRig::cubism_standard();
        clock.set(blink.next_blink_at() - 1.0);
        assert_eq!(blink.update(&mut rig, 1.0), 1.0);
        assert_eq!(blink.phase(), BlinkPhase::Idle);
        assert!(rig.writes().is_empty());
    }

    #[test]
    fn walks_through_a_full_cycle() {
        let (clock, mut blink) = setup(7);
        let mut rig = MemoryRig::cubism_standard();
        let start = blink.next_blink_at();

        clock.set(start);
        assert_eq!(blink.update(&mut rig, 1.0), 1.0);
        assert_eq!(blink.phase(), BlinkPhase::Closing);

        clock.set(start + 60.0);
        let half = blink.update(&mut rig, 1.0);
        assert!((half - 0.5).abs() < 1e-4, "got {}", half);

        let closed_at = start + 120.0;
        clock.set(closed_at);
        assert_eq!(blink.update(&mut rig, 1.0), 0.0);
        assert_eq!(blink.phase(), BlinkPhase::Closed);

        clock.set(closed_at + 40.0);
        assert_eq!(blink.update(&mut rig, 1.0), 0.0);
        assert_eq!(rig.value("ParamEyeBallScaleX"), Some(1.08));

        let opening_at = closed_at + 80.0;
        clock.set(opening_at);
        assert_eq!(blink.update(&mut rig, 1.0), 0.0);
        assert_eq!(blink.phase(), BlinkPhase::Opening);

        clock.set(opening_at + 70.0);
        let rising = blink.update(&mut rig, 1.0);
        assert!((rising - 0.5).abs() < 1e-4, "got {}", rising);

        let settle_at = opening_at + 140.0;
        clock.set(settle_at);
        assert_eq!(blink.update(&mut rig, 1.0), 1.0);
        assert_eq!(blink.phase(), BlinkPhase::Settle);

        clock.set(settle_at + 60.0);
        assert_eq!(blink.update(&mut rig, 1.0), 1.0);

        let idle_at = settle_at + 120.0;
        clock.set(idle_at);
        assert_eq!(blink.update(&mut rig, 1.0), 1.0);
        assert_eq!(blink.phase(), BlinkPhase::Idle);
        assert_eq!(rig.value("ParamEyeBallScaleY"), Some(1.0));
        assert!(blink.next_blink_at() >= idle_at + 2200.0);
    }

    #[test]
    fn torn_down_rig_reads_as_open_and_freezes_state() {
        let (clock, mut blink) = setup(3);
        let mut rig = MemoryRig::cubism_standard();
        rig.destroy();
        clock.set(blink.next_blink_at() + 10.0);
        assert_eq!(blink.update(&mut rig, 1.0), 1.0);
        assert_eq!(blink.phase(), BlinkPhase::Idle);
    }

    #[test]
    fn missing_pupil_params_do_not_stall_the_cycle() {
        let (clock, mut blink) = setup(5);
        let mut rig = MemoryRig::with_parameters([("ParamEyeLOpen", 1.0)]);
        let start = blink.next_blink_at();
        for step in 0..=60 {
            clock.set(start + step as f64 * 10.0);
            blink.update(&mut rig, 1.0);
        }
        assert_eq!(blink.phase(), BlinkPhase::Idle);
    }
}

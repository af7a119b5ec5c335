//! Wall-clock source for animators.
//!
//! Blink phases, glance windows and keyframe progress are all computed by
//! comparing timestamps, never by accumulating per-frame deltas, so each
//! animator holds a shared clock.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;

/// Milliseconds on a monotonic timeline with an arbitrary origin.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> f64;
}

/// Monotonic clock anchored at construction time.
///
/// Reads tokio's clock, so it follows paused/advanced time inside
/// `#[tokio::test(start_paused = true)]` and real time everywhere else.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for tests and offline rendering.
#[derive(Debug, Default)]
pub struct ManualClock {
    // f64 bit pattern
    now_bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now_bits: AtomicU64::new(start_ms.to_bits()),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now_bits.store(ms.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, ms: f64) {
        self.set(self.now_ms() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.now_bits.load(Ordering::SeqCst))
    }
}

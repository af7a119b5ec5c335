//! Parameter Sink: the read/write surface exposed by a rig runtime.
//!
//! Rigs differ in which parameter ids they ship, so an unknown id is a
//! routine outcome rather than a failure. The helpers in this module are
//! the only place where sink errors are observed, and they swallow them.

use thiserror::Error;

// ── Error Types ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RigError {
    #[error("unknown rig parameter: {0}")]
    UnknownParameter(String),
    #[error("rig has been torn down")]
    Destroyed,
}

// ── Sink Trait ─────────────────────────────────────────

/// Named numeric control channels of a face rig.
///
/// Animators never own a sink; they borrow it for the duration of one
/// update and check [`ParameterSink::is_alive`] before each batch of work.
pub trait ParameterSink {
    /// Write a parameter. Unknown ids return `Err`.
    fn set_parameter(&mut self, id: &str, value: f32) -> Result<(), RigError>;

    /// Read a parameter back. Unknown ids return `Err`.
    fn get_parameter(&self, id: &str) -> Result<f32, RigError>;

    /// `false` once the underlying model has been destroyed.
    fn is_alive(&self) -> bool {
        true
    }
}

// ── Tolerant Helpers ───────────────────────────────────

/// Write `value` to `id`, ignoring ids the rig does not support.
pub fn set_if_exists<S: ParameterSink + ?Sized>(sink: &mut S, id: &str, value: f32) {
    if let Err(e) = sink.set_parameter(id, value) {
        tracing::trace!("[Rig] skipped write {} = {}: {}", id, value, e);
    }
}

/// Read the first id in `ids` that yields a number, else `fallback`.
pub fn read_first<S: ParameterSink + ?Sized>(sink: &S, ids: &[&str], fallback: f32) -> f32 {
    ids.iter()
        .find_map(|id| sink.get_parameter(id).ok())
        .unwrap_or(fallback)
}

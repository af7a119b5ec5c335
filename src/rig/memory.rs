//! In-memory rig: a `ParameterSink` backed by a map of supported ids.
//!
//! Used for headless previews and throughout the test suite: every write is
//! recorded in order, unknown ids are rejected the way a real rig rejects
//! them, and the rig can be torn down mid-animation.

use std::collections::HashMap;

use super::sink::{ParameterSink, RigError};

/// Standard Cubism parameter ids with their resting values.
const CUBISM_STANDARD: &[(&str, f32)] = &[
    ("ParamAngleX", 0.0),
    ("ParamAngleY", 0.0),
    ("ParamAngleZ", 0.0),
    ("ParamEyeLOpen", 1.0),
    ("ParamEyeROpen", 1.0),
    ("ParamEyeLSmile", 0.0),
    ("ParamEyeRSmile", 0.0),
    ("ParamEyeBallX", 0.0),
    ("ParamEyeBallY", 0.0),
    ("ParamEyeBallScaleX", 1.0),
    ("ParamEyeBallScaleY", 1.0),
    ("ParamBrowLY", 0.0),
    ("ParamBrowRY", 0.0),
    ("ParamMouthForm", 0.0),
    ("ParamMouthOpenY", 0.0),
    ("ParamCheek", 0.0),
];

#[derive(Debug, Clone, Default)]
pub struct MemoryRig {
    values: HashMap<String, f32>,
    writes: Vec<(String, f32)>,
    destroyed: bool,
}

impl MemoryRig {
    /// A rig that supports exactly the given ids.
    pub fn with_parameters<I, K>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, f32)>,
        K: Into<String>,
    {
        Self {
            values: params.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            writes: Vec::new(),
            destroyed: false,
        }
    }

    /// A rig carrying the common Cubism 4 parameter set.
    pub fn cubism_standard() -> Self {
        Self::with_parameters(CUBISM_STANDARD.iter().copied())
    }

    /// Add (or reset) a supported parameter.
    pub fn insert(&mut self, id: impl Into<String>, value: f32) {
        self.values.insert(id.into(), value);
    }

    pub fn value(&self, id: &str) -> Option<f32> {
        self.values.get(id).copied()
    }

    /// Every accepted write, oldest first.
    pub fn writes(&self) -> &[(String, f32)] {
        &self.writes
    }

    /// Accepted writes to a single id, oldest first.
    pub fn writes_to(&self, id: &str) -> Vec<f32> {
        self.writes
            .iter()
            .filter(|(k, _)| k == id)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Simulate the host view discarding the model.
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }
}

impl ParameterSink for MemoryRig {
    fn set_parameter(&mut self, id: &str, value: f32) -> Result<(), RigError> {
        if self.destroyed {
            return Err(RigError::Destroyed);
        }
        match self.values.get_mut(id) {
            Some(slot) => {
                *slot = value;
                self.writes.push((id.to_string(), value));
                Ok(())
            }
            None => Err(RigError::UnknownParameter(id.to_string())),
        }
    }

    fn get_parameter(&self, id: &str) -> Result<f32, RigError> {
        if self.destroyed {
            return Err(RigError::Destroyed);
        }
        self.values
            .get(id)
            .copied()
            .ok_or_else(|| RigError::UnknownParameter(id.to_string()))
    }

    fn is_alive(&self) -> bool {
        !self.destroyed
    }
}

//! Shared config utilities for loading/saving JSON config files, and the
//! avatar's own tunables.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::motion::gaze::MIN_TRACK_RADIUS;
use crate::motion::{BlinkTiming, GazeTuning, Vec2};

/// Generic load for any Serde config type with a `Default` implementation.
/// Falls back to `T::default()` if the file is missing or unparsable.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path, label: &str) -> T {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<T>(&content) {
            Ok(config) => {
                tracing::info!("[{}] Loaded config from {}", label, path.display());
                config
            }
            Err(e) => {
                tracing::warn!(
                    "[{}] Failed to parse config {}: {} — using defaults",
                    label,
                    path.display(),
                    e
                );
                T::default()
            }
        },
        Err(_) => {
            tracing::info!(
                "[{}] No config file at {} — using defaults",
                label,
                path.display()
            );
            T::default()
        }
    }
}

/// Generic save for any Serde config type.
pub fn save_json_config<T: Serialize>(path: &Path, config: &T, label: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, json).context("Failed to write config file")?;
    tracing::info!("[{}] Saved config to {}", label, path.display());
    Ok(())
}

/// Per-user data directory (`<data_dir>/avatar-motion`).
pub fn default_data_dir() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("avatar-motion")
}

// ── Avatar Config ──────────────────────────────────────

/// Pointer-tracking geometry, in viewport pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub track_radius: f32,
    /// Offset of the model's head from the viewport center.
    pub head_offset_x: f32,
    pub head_offset_y: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            track_radius: 240.0,
            head_offset_x: 0.0,
            head_offset_y: 0.0,
        }
    }
}

impl TrackingConfig {
    pub fn center(&self, viewport_center: Vec2) -> Vec2 {
        Vec2::new(
            viewport_center.x + self.head_offset_x,
            viewport_center.y + self.head_offset_y,
        )
    }

    pub fn radius(&self) -> f32 {
        if self.track_radius.is_finite() {
            self.track_radius.max(MIN_TRACK_RADIUS)
        } else {
            MIN_TRACK_RADIUS
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub tracking: TrackingConfig,
    pub blink: BlinkTiming,
    pub gaze: GazeTuning,
    /// Reference frame rate for the per-frame delta (1.0 == one frame).
    pub frame_rate: f64,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            tracking: TrackingConfig::default(),
            blink: BlinkTiming::default(),
            gaze: GazeTuning::default(),
            frame_rate: 60.0,
        }
    }
}

impl AvatarConfig {
    const LABEL: &'static str = "AvatarConfig";

    pub fn load(path: &Path) -> Self {
        load_json_config(path, Self::LABEL)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json_config(path, self, Self::LABEL)
    }

    /// Milliseconds per frame; non-positive rates fall back to 60 fps.
    pub fn frame_ms(&self) -> f64 {
        if self.frame_rate.is_finite() && self.frame_rate > 0.0 {
            1000.0 / self.frame_rate
        } else {
            1000.0 / 60.0
        }
    }
}

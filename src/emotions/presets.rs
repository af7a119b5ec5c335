//! Built-in emotions.
//!
//! Hand-tuned expressions with a characteristic ease are stored as dense
//! keyframe runs: [`bake_curve`] samples the curve and the linear playback
//! between neighbouring samples reproduces it closely enough on screen.

use crate::emotions::{EmotionDefinition, Keyframe};
use crate::motion::pose::{lerp, PartialPose, PoseKey};

pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

pub fn ease_in_out_sine(t: f32) -> f32 {
    -((std::f32::consts::PI * t).cos() - 1.0) / 2.0
}

/// Sample `easing` from `from` to `to` into `steps` keyframes spanning
/// `duration_ms`. Only keys present in `to` are animated; missing `from`
/// values start at the key default.
pub fn bake_curve(
    from: &PartialPose,
    to: &PartialPose,
    duration_ms: u32,
    steps: u32,
    easing: fn(f32) -> f32,
) -> Vec<Keyframe> {
    let steps = steps.max(1);
    let base = duration_ms / steps;
    let remainder = duration_ms % steps;

    (1..=steps)
        .map(|i| {
            let eased = easing(i as f32 / steps as f32);
            let mut params = PartialPose::default();
            for key in to.keys() {
                let start = from.get(key).unwrap_or_else(|| key.default_value());
                let end = to.get(key).unwrap_or(start);
                params.set(key, Some(lerp(start, end, eased)));
            }
            // spread the leftover milliseconds over the first frames
            let duration = base + u32::from(i <= remainder);
            Keyframe::new(duration, params)
        })
        .collect()
}

fn neutral_pose() -> PartialPose {
    PartialPose {
        mouth_form: Some(0.0),
        mouth_open: Some(0.05),
        cheek: Some(0.0),
        eye_smile: Some(0.0),
        eye_open: Some(1.0),
        brow_y: Some(0.0),
        pupil_scale: Some(1.0),
        angle_z: Some(0.0),
        lower_lid: Some(0.0),
        ..Default::default()
    }
}

fn neutral() -> EmotionDefinition {
    EmotionDefinition::new("neutral", "Neutral", vec![Keyframe::new(0, neutral_pose())])
}

fn happy() -> EmotionDefinition {
    let peak = PartialPose {
        mouth_form: Some(1.0),
        mouth_open: Some(0.35),
        eye_smile: Some(0.8),
        cheek: Some(0.6),
        brow_y: Some(0.3),
        angle_z: Some(4.0),
        ..Default::default()
    };
    EmotionDefinition::new(
        "happy",
        "Happy",
        bake_curve(&neutral_pose(), &peak, 360, 6, ease_out_cubic),
    )
}

fn sad() -> EmotionDefinition {
    let low = PartialPose {
        mouth_form: Some(-0.8),
        mouth_open: Some(0.0),
        brow_y: Some(-0.6),
        eye_open: Some(0.7),
        lower_lid: Some(0.3),
        angle_y: Some(-6.0),
        ..Default::default()
    };
    EmotionDefinition::new(
        "sad",
        "Sad",
        bake_curve(&neutral_pose(), &low, 600, 8, ease_in_out_sine),
    )
}

fn surprised() -> EmotionDefinition {
    let jolt = PartialPose {
        eye_open: Some(1.3),
        brow_y: Some(0.9),
        mouth_open: Some(0.8),
        pupil_scale: Some(0.85),
        angle_y: Some(3.0),
        ..Default::default()
    };
    let settle = PartialPose {
        eye_open: Some(1.15),
        brow_y: Some(0.6),
        mouth_open: Some(0.5),
        pupil_scale: Some(0.95),
        angle_y: Some(0.0),
        ..Default::default()
    };
    let mut frames = bake_curve(&neutral_pose(), &jolt, 180, 4, ease_out_cubic);
    frames.extend(bake_curve(&jolt, &settle, 400, 4, ease_in_out_sine));
    EmotionDefinition::new("surprised", "Surprised", frames)
}

/// Emotions available before any file has been loaded.
pub fn default_emotions() -> Vec<EmotionDefinition> {
    vec![neutral(), happy(), sad(), surprised()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bake_curve_preserves_total_duration_and_endpoint() {
        let to = PartialPose {
            mouth_form: Some(1.0),
            ..Default::default()
        };
        let frames = bake_curve(&PartialPose::default(), &to, 361, 6, ease_out_cubic);
        assert_eq!(frames.len(), 6);
        assert_eq!(frames.iter().map(|f| f.duration_ms).sum::<u32>(), 361);
        assert_eq!(frames[0].duration_ms, 61);
        assert_eq!(frames.last().unwrap().params.get(PoseKey::MouthForm), Some(1.0));
        assert!(frames.iter().all(|f| f.params.keys().count() == 1));
    }

    #[test]
    fn bake_curve_follows_the_easing() {
        let to = PartialPose {
            cheek: Some(1.0),
            ..Default::default()
        };
        let frames = bake_curve(&PartialPose::default(), &to, 400, 4, ease_out_cubic);
        let first = frames[0].params.get(PoseKey::Cheek).unwrap();
        // ease-out front-loads the motion
        assert!(first > 0.25, "first sample {}", first);
    }

    #[test]
    fn easings_hit_their_endpoints() {
        for f in [ease_out_cubic as fn(f32) -> f32, ease_in_out_sine] {
            assert!(f(0.0).abs() < 1e-6);
            assert!((f(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn defaults_are_valid_and_start_with_neutral() {
        let defs = default_emotions();
        assert_eq!(defs[0].id, "neutral");
        assert_eq!(defs[0].keyframes[0].duration_ms, 0);
        for def in &defs {
            def.validate().unwrap();
        }
        let surprised = defs.iter().find(|d| d.id == "surprised").unwrap();
        assert_eq!(surprised.total_duration_ms(), 580);
    }
}

//! Pose model: the fixed set of semantic facial channels and their mapping
//! onto rig parameter ids.
//!
//! Rigs name the same control differently (`ParamMouthOpenY` vs
//! `ParamMouthOpen`), so every semantic key carries an ordered list of
//! candidate ids. Reads take the first candidate the rig answers for; writes
//! fan out to every candidate and let the rig ignore the ones it lacks.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::rig::{read_first, set_if_exists, ParameterSink};

macro_rules! pose_keys {
    ($( $variant:ident => $field:ident, $json:literal, $default:expr; )*) => {
        /// One semantic facial control channel.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PoseKey {
            $($variant),*
        }

        impl PoseKey {
            pub const ALL: &'static [PoseKey] = &[$(PoseKey::$variant),*];
            pub const COUNT: usize = Self::ALL.len();

            /// Key name as it appears in emotion JSON.
            pub fn name(self) -> &'static str {
                match self {
                    $(PoseKey::$variant => $json),*
                }
            }

            /// Value assumed when a rig exposes none of the candidates.
            pub fn default_value(self) -> f32 {
                match self {
                    $(PoseKey::$variant => $default),*
                }
            }

            fn index(self) -> usize {
                self as usize
            }
        }

        /// A pose where any channel may be left unspecified.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct PartialPose {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<f32>,
            )*
        }

        impl PartialPose {
            pub fn get(&self, key: PoseKey) -> Option<f32> {
                match key {
                    $(PoseKey::$variant => self.$field),*
                }
            }

            pub fn set(&mut self, key: PoseKey, value: Option<f32>) {
                match key {
                    $(PoseKey::$variant => self.$field = value),*
                }
            }
        }
    };
}

pose_keys! {
    MouthForm => mouth_form, "mouthForm", 0.0;
    MouthOpen => mouth_open, "mouthOpen", 0.0;
    MouthSmileLower => mouth_smile_lower, "mouthSmileLower", 0.0;
    MouthX => mouth_x, "mouthX", 0.0;
    Cheek => cheek, "cheek", 0.0;
    CheekPuff => cheek_puff, "cheekPuff", 0.0;
    EyeSmile => eye_smile, "eyeSmile", 0.0;
    EyeOpen => eye_open, "eyeOpen", 1.0;
    BrowY => brow_y, "browY", 0.0;
    BrowX => brow_x, "browX", 0.0;
    PupilScale => pupil_scale, "pupilScale", 1.0;
    AngleX => angle_x, "angleX", 0.0;
    AngleY => angle_y, "angleY", 0.0;
    AngleZ => angle_z, "angleZ", 0.0;
    LowerLid => lower_lid, "lowerLid", 0.0;
    TongueOut => tongue_out, "tongueOut", 0.0;
    JawOpen => jaw_open, "jawOpen", 0.0;
    MouthShrug => mouth_shrug, "mouthShrug", 0.0;
    MouthPucker => mouth_pucker, "mouthPucker", 0.0;
    EyeBallX => eye_ball_x, "eyeBallX", 0.0;
    EyeBallY => eye_ball_y, "eyeBallY", 0.0;
    EyeExpression1 => eye_expression1, "eyeExpression1", 0.0;
    EyeExpression2 => eye_expression2, "eyeExpression2", 0.0;
}

// ── Parameter Tables ───────────────────────────────────

impl PoseKey {
    /// Candidate ids tried, in order, when snapshotting the rig.
    pub fn read_ids(self) -> &'static [&'static str] {
        match self {
            PoseKey::EyeSmile => &["ParamEyeLSmile", "ParamEyeLForm", "ParamEyeLSmileLine"],
            PoseKey::EyeOpen => &["ParamEyeLOpen", "ParamEyeLFormEyeOpen"],
            PoseKey::LowerLid => &["ParamEyeLLower", "ParamEyeLowerLidL", "ParamEyeLSmile2"],
            PoseKey::BrowY => &["ParamBrowLY", "ParamBrowLForm", "ParamBrowY", "ParamBrowLPosY"],
            // Single-sided or symmetric channels read from the same list they write.
            _ => self.write_ids(),
        }
    }

    /// Every id a value for this key is written to. Two-sided channels
    /// (eyes, brows) cover both sides.
    pub fn write_ids(self) -> &'static [&'static str] {
        match self {
            PoseKey::MouthForm => &[
                "ParamMouthForm",
                "ParamMouthSmile",
                "ParamMouthFormSmile",
                "ParamMouthWidth",
            ],
            PoseKey::MouthOpen => &["ParamMouthOpenY", "ParamMouthOpen", "ParamMouthOpenSmile"],
            PoseKey::MouthSmileLower => {
                &["ParamMouthForm2", "ParamMouthSmileLower", "ParamMouthLower"]
            }
            PoseKey::MouthX => &["ParamMouthX"],
            PoseKey::Cheek => &["ParamCheek", "ParamFlush", "ParamCheekSmile"],
            PoseKey::CheekPuff => &["ParamCheekPuff"],
            PoseKey::EyeSmile => &[
                "ParamEyeLSmile",
                "ParamEyeLForm",
                "ParamEyeLSmileLine",
                "ParamEyeRSmile",
                "ParamEyeRForm",
                "ParamEyeRSmileLine",
            ],
            PoseKey::EyeOpen => &[
                "ParamEyeLOpen",
                "ParamEyeLFormEyeOpen",
                "ParamEyeROpen",
                "ParamEyeRFormEyeOpen",
            ],
            PoseKey::BrowY => &[
                "ParamBrowLY",
                "ParamBrowLForm",
                "ParamBrowY",
                "ParamBrowLPosY",
                "ParamBrowRY",
                "ParamBrowRForm",
                "ParamBrowRPosY",
            ],
            PoseKey::BrowX => &["ParamEyeBrowX"],
            PoseKey::PupilScale => &["ParamEyeBallScaleX", "ParamEyeBallScaleY"],
            PoseKey::AngleX => &["ParamAngleX"],
            PoseKey::AngleY => &["ParamAngleY"],
            PoseKey::AngleZ => &["ParamAngleZ"],
            PoseKey::LowerLid => &[
                "ParamEyeLLower",
                "ParamEyeLowerLidL",
                "ParamEyeLSmile2",
                "ParamEyeRLower",
                "ParamEyeLowerLidR",
                "ParamEyeRSmile2",
            ],
            PoseKey::TongueOut => &["ParamTongueOut"],
            PoseKey::JawOpen => &["JawOpen"],
            PoseKey::MouthShrug => &["MouthShrug"],
            PoseKey::MouthPucker => &["MouthPucker"],
            PoseKey::EyeBallX => &["ParamEyeBallX"],
            PoseKey::EyeBallY => &["ParamEyeBallY"],
            PoseKey::EyeExpression1 => &["ParamEyeExpression1"],
            PoseKey::EyeExpression2 => &["ParamEyeExpression2"],
        }
    }
}

// ── Full Pose ──────────────────────────────────────────

/// A value for every [`PoseKey`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose([f32; PoseKey::COUNT]);

impl Default for Pose {
    fn default() -> Self {
        let mut values = [0.0; PoseKey::COUNT];
        for key in PoseKey::ALL {
            values[key.index()] = key.default_value();
        }
        Pose(values)
    }
}

impl Index<PoseKey> for Pose {
    type Output = f32;

    fn index(&self, key: PoseKey) -> &f32 {
        &self.0[key.index()]
    }
}

impl IndexMut<PoseKey> for Pose {
    fn index_mut(&mut self, key: PoseKey) -> &mut f32 {
        &mut self.0[key.index()]
    }
}

impl Pose {
    /// Read the rig's current values through each key's candidate ids.
    pub fn snapshot<S: ParameterSink + ?Sized>(sink: &S) -> Pose {
        let mut pose = Pose::default();
        for &key in PoseKey::ALL {
            pose[key] = read_first(sink, key.read_ids(), key.default_value());
        }
        pose
    }

    /// Blend toward `target` by `t` in [0,1]. Keys missing from the target
    /// hold their current value.
    pub fn mix(&self, target: &PartialPose, t: f32) -> Pose {
        let t = t.clamp(0.0, 1.0);
        let mut out = *self;
        for &key in PoseKey::ALL {
            if let Some(to) = target.get(key) {
                out[key] = lerp(self[key], to, t);
            }
        }
        out
    }

    /// Write every channel to all of its candidate ids.
    pub fn apply<S: ParameterSink + ?Sized>(&self, sink: &mut S) {
        if !sink.is_alive() {
            return;
        }
        for &key in PoseKey::ALL {
            for id in key.write_ids() {
                set_if_exists(sink, id, self[key]);
            }
        }
    }

    pub fn to_partial(&self) -> PartialPose {
        let mut partial = PartialPose::default();
        for &key in PoseKey::ALL {
            partial.set(key, Some(self[key]));
        }
        partial
    }
}

impl PartialPose {
    /// Keys that carry a value, in table order.
    pub fn keys(&self) -> impl Iterator<Item = PoseKey> + '_ {
        PoseKey::ALL.iter().copied().filter(|k| self.get(*k).is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.keys().next().is_none()
    }
}

/// Exact at both ends: `lerp(a, b, 1.0) == b`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

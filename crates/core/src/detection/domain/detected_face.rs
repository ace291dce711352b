//! A single detector hit: bounding box plus five named keypoints.

use crate::shared::region::FaceBox;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keypoint {
    LeftEye,
    RightEye,
    Nose,
    MouthLeft,
    MouthRight,
}

impl Keypoint {
    pub const ALL: [Keypoint; 5] = [
        Keypoint::LeftEye,
        Keypoint::RightEye,
        Keypoint::Nose,
        Keypoint::MouthLeft,
        Keypoint::MouthRight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Keypoint::LeftEye => "left_eye",
            Keypoint::RightEye => "right_eye",
            Keypoint::Nose => "nose",
            Keypoint::MouthLeft => "mouth_left",
            Keypoint::MouthRight => "mouth_right",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceKeypoints {
    points: [Option<(f64, f64)>; 5],
}

impl FaceKeypoints {
    /// Builds keypoints from raw detector output ordered as [`Keypoint::ALL`].
    ///
    /// Points with x <= 0 are treated as invisible.
    pub fn from_points(points: [(f64, f64); 5]) -> Self {
        Self {
            points: points.map(|(x, y)| (x > 0.0).then_some((x, y))),
        }
    }

    pub fn get(&self, keypoint: Keypoint) -> Option<(f64, f64)> {
        self.points[keypoint as usize]
    }

    pub fn visible(&self) -> impl Iterator<Item = (Keypoint, (f64, f64))> + '_ {
        Keypoint::ALL
            .iter()
            .filter_map(|&k| self.get(k).map(|p| (k, p)))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub bbox: FaceBox,
    pub keypoints: FaceKeypoints,
    pub confidence: f64,
}

//! Landmark Model
//!
//! Per-frame facial geometry supplied by an external landmark model.
//! Feature contours may be given explicitly or recovered from a full
//! 68-point array; accessors hide the difference.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// 2-D landmark position in pixels
pub type Point = [f32; 2];

/// 68-point landmark index ranges
pub mod indices {
    use std::ops::Range;

    pub const RIGHT_EYEBROW: Range<usize> = 17..22;
    pub const LEFT_EYEBROW: Range<usize> = 22..27;
    pub const NOSE: Range<usize> = 27..36;
    pub const RIGHT_EYE: Range<usize> = 36..42;
    pub const LEFT_EYE: Range<usize> = 42..48;
    pub const MOUTH_OUTER: Range<usize> = 48..60;
    pub const MOUTH_INNER: Range<usize> = 60..68;

    /// Size of a full landmark array
    pub const FULL_COUNT: usize = 68;
}

/// Head orientation in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl HeadPose {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// Landmarks for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkData {
    /// 6-point eye contours: outer corner, upper lid x2, inner corner, lower lid x2
    pub left_eye: Option<Vec<Point>>,
    pub right_eye: Option<Vec<Point>>,
    /// 12-point outer lip contour
    pub mouth_outer: Option<Vec<Point>>,
    /// 8-point inner lip contour
    pub mouth_inner: Option<Vec<Point>>,
    /// 5-point eyebrows
    pub left_eyebrow: Option<Vec<Point>>,
    pub right_eyebrow: Option<Vec<Point>>,
    pub nose: Option<Vec<Point>>,
    /// Full 68-point array, used when a feature array is absent
    pub landmarks: Option<Vec<Point>>,
    pub head_pose: HeadPose,
    pub confidence: f32,
    pub frame_index: usize,
    pub timestamp_ms: f64,
}

impl LandmarkData {
    /// Empty landmarks for a frame (every feature falls back to neutral)
    pub fn new(frame_index: usize, timestamp_ms: f64) -> Self {
        Self {
            confidence: 1.0,
            frame_index,
            timestamp_ms,
            ..Default::default()
        }
    }

    /// Builder: attach a head pose
    pub fn with_head_pose(mut self, pose: HeadPose) -> Self {
        self.head_pose = pose;
        self
    }

    /// Builder: attach both eye contours
    pub fn with_eyes(mut self, left: Vec<Point>, right: Vec<Point>) -> Self {
        self.left_eye = Some(left);
        self.right_eye = Some(right);
        self
    }

    /// Builder: attach the outer mouth contour
    pub fn with_mouth_outer(mut self, mouth: Vec<Point>) -> Self {
        self.mouth_outer = Some(mouth);
        self
    }

    /// Builder: attach both eyebrows
    pub fn with_eyebrows(mut self, left: Vec<Point>, right: Vec<Point>) -> Self {
        self.left_eyebrow = Some(left);
        self.right_eyebrow = Some(right);
        self
    }

    /// Builder: attach a full 68-point array
    pub fn with_full(mut self, landmarks: Vec<Point>) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn left_eye(&self) -> Option<&[Point]> {
        self.feature(&self.left_eye, 6, indices::LEFT_EYE)
    }

    pub fn right_eye(&self) -> Option<&[Point]> {
        self.feature(&self.right_eye, 6, indices::RIGHT_EYE)
    }

    pub fn mouth_outer(&self) -> Option<&[Point]> {
        self.feature(&self.mouth_outer, 12, indices::MOUTH_OUTER)
    }

    pub fn mouth_inner(&self) -> Option<&[Point]> {
        self.feature(&self.mouth_inner, 8, indices::MOUTH_INNER)
    }

    pub fn left_eyebrow(&self) -> Option<&[Point]> {
        self.feature(&self.left_eyebrow, 5, indices::LEFT_EYEBROW)
    }

    pub fn right_eyebrow(&self) -> Option<&[Point]> {
        self.feature(&self.right_eyebrow, 5, indices::RIGHT_EYEBROW)
    }

    pub fn nose(&self) -> Option<&[Point]> {
        self.feature(&self.nose, 9, indices::NOSE)
    }

    /// Explicit array if it has the expected length, else the slice of the
    /// full array, else `None`.
    fn feature<'a>(
        &'a self,
        explicit: &'a Option<Vec<Point>>,
        expected: usize,
        range: Range<usize>,
    ) -> Option<&'a [Point]> {
        match explicit {
            Some(points) if points.len() == expected => Some(points.as_slice()),
            _ => self.landmarks.as_deref().and_then(|all| all.get(range)),
        }
    }
}

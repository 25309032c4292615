//! Facial Geometry Metrics
//!
//! Scalar measurements over landmark contours:
//! - Eye Aspect Ratio (EAR) for eyelid closure
//! - Smile ratio (mouth width over vertical opening)
//! - Eyebrow-to-eye vertical distance
//!
//! Missing geometry never errors. Per-frame accessors fall back to neutral
//! values (open eye, neutral mouth) so that a partial landmark stream still
//! yields a well-formed time series.

use ndarray::Array1;

use super::landmarks::{LandmarkData, Point};

/// EAR of a comfortably open eye
pub const NEUTRAL_EAR: f64 = 0.30;
/// Width/opening ratio of a relaxed mouth
pub const NEUTRAL_SMILE_RATIO: f64 = 2.0;

const MIN_EXTENT: f64 = 1e-9;

#[inline]
fn distance(a: Point, b: Point) -> f64 {
    let dx = a[0] as f64 - b[0] as f64;
    let dy = a[1] as f64 - b[1] as f64;
    (dx * dx + dy * dy).sqrt()
}

fn centroid_y(points: &[Point]) -> f64 {
    points.iter().map(|p| p[1] as f64).sum::<f64>() / points.len() as f64
}

/// Eye Aspect Ratio of a 6-point contour.
///
/// `(|p2 - p6| + |p3 - p5|) / (2 |p1 - p4|)`. `None` for a malformed contour
/// or a degenerate horizontal extent.
pub fn eye_aspect_ratio(eye: &[Point]) -> Option<f64> {
    if eye.len() != 6 {
        return None;
    }
    let horizontal = distance(eye[0], eye[3]);
    if horizontal < MIN_EXTENT {
        return None;
    }
    let v1 = distance(eye[1], eye[5]);
    let v2 = distance(eye[2], eye[4]);
    Some((v1 + v2) / (2.0 * horizontal))
}

/// Mean EAR over the available eyes, `NEUTRAL_EAR` when neither is usable
pub fn average_ear(landmarks: &LandmarkData) -> f64 {
    let left = landmarks.left_eye().and_then(eye_aspect_ratio);
    let right = landmarks.right_eye().and_then(eye_aspect_ratio);
    match (left, right) {
        (Some(l), Some(r)) => (l + r) / 2.0,
        (Some(v), None) | (None, Some(v)) => v,
        (None, None) => NEUTRAL_EAR,
    }
}

/// Mouth width over mean vertical opening of a 12-point outer contour
pub fn smile_ratio(mouth: &[Point]) -> Option<f64> {
    if mouth.len() < 12 {
        return None;
    }
    let width = distance(mouth[0], mouth[6]);
    let opening =
        (distance(mouth[2], mouth[10]) + distance(mouth[3], mouth[9]) + distance(mouth[4], mouth[8]))
            / 3.0;
    if opening < MIN_EXTENT || width < MIN_EXTENT {
        return None;
    }
    Some(width / opening)
}

/// Smile ratio of a frame, `NEUTRAL_SMILE_RATIO` when the mouth is unusable
pub fn mouth_smile_ratio(landmarks: &LandmarkData) -> f64 {
    landmarks
        .mouth_outer()
        .and_then(smile_ratio)
        .unwrap_or(NEUTRAL_SMILE_RATIO)
}

/// Vertical eyebrow-to-eye distance averaged over the sides that have both
/// contours (image y grows downward, so a raised brow increases it)
pub fn eyebrow_distance(landmarks: &LandmarkData) -> Option<f64> {
    let sides = [
        (landmarks.left_eye(), landmarks.left_eyebrow()),
        (landmarks.right_eye(), landmarks.right_eyebrow()),
    ];

    let mut total = 0.0;
    let mut count = 0usize;
    for (eye, brow) in sides {
        if let (Some(eye), Some(brow)) = (eye, brow) {
            total += centroid_y(eye) - centroid_y(brow);
            count += 1;
        }
    }

    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

/// Per-frame feature time series extracted once from a landmark sequence
#[derive(Debug, Clone)]
pub struct FeatureSeries {
    pub ear: Array1<f64>,
    pub smile_ratio: Array1<f64>,
    pub eyebrow_distance: Vec<Option<f64>>,
    pub yaw: Array1<f64>,
    pub pitch: Array1<f64>,
    /// Milliseconds, non-decreasing
    pub timestamps_ms: Array1<f64>,
    pub frame_indices: Vec<usize>,
}

impl FeatureSeries {
    /// Extract all series from a landmark sequence.
    ///
    /// When the supplied timestamps are not usable (decreasing, or all equal)
    /// they are synthesized from the frame position at `fps`.
    pub fn from_landmarks(sequence: &[LandmarkData], fps: f64) -> Self {
        let n = sequence.len();
        let supplied: Vec<f64> = sequence.iter().map(|lm| lm.timestamp_ms).collect();
        let monotonic = supplied.windows(2).all(|w| w[1] >= w[0]);
        let spans = n < 2 || supplied[n - 1] > supplied[0];

        let timestamps_ms = if monotonic && spans && supplied.iter().all(|t| t.is_finite()) {
            Array1::from_vec(supplied)
        } else {
            let step = 1000.0 / fps.max(1e-6);
            log::debug!("Synthesizing landmark timestamps at {:.1} fps", fps);
            Array1::from_iter((0..n).map(|i| i as f64 * step))
        };

        Self {
            ear: sequence.iter().map(average_ear).collect(),
            smile_ratio: sequence.iter().map(mouth_smile_ratio).collect(),
            eyebrow_distance: sequence.iter().map(eyebrow_distance).collect(),
            yaw: sequence.iter().map(|lm| lm.head_pose.yaw as f64).collect(),
            pitch: sequence.iter().map(|lm| lm.head_pose.pitch as f64).collect(),
            timestamps_ms,
            frame_indices: sequence.iter().map(|lm| lm.frame_index).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps_ms.is_empty()
    }

    /// Milliseconds between frames `from` and `to`
    #[inline]
    pub fn elapsed_ms(&self, from: usize, to: usize) -> f64 {
        self.timestamps_ms[to] - self.timestamps_ms[from]
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Eye contour centred at `(cx, cy)` with half-width `w` and lid half-opening `h`
    pub fn eye(cx: f32, cy: f32, w: f32, h: f32) -> Vec<Point> {
        vec![
            [cx - w, cy],
            [cx - w / 3.0, cy - h],
            [cx + w / 3.0, cy - h],
            [cx + w, cy],
            [cx + w / 3.0, cy + h],
            [cx - w / 3.0, cy + h],
        ]
    }

    /// Outer mouth contour with half-width `w` and half-opening `h`
    pub fn mouth(cx: f32, cy: f32, w: f32, h: f32) -> Vec<Point> {
        (0..12)
            .map(|i| {
                let angle = std::f32::consts::PI * i as f32 / 6.0;
                [cx - w * angle.cos(), cy - h * angle.sin()]
            })
            .collect()
    }

    /// Horizontal 5-point eyebrow at height `y`
    pub fn brow(cx: f32, y: f32) -> Vec<Point> {
        (0..5).map(|i| [cx - 20.0 + 10.0 * i as f32, y]).collect()
    }
}

//! Landmark model and facial geometry shared by the analyzers.

pub mod face_metrics;
pub mod landmarks;

pub use face_metrics::{
    average_ear, eye_aspect_ratio, eyebrow_distance, mouth_smile_ratio, smile_ratio, FeatureSeries,
    NEUTRAL_EAR, NEUTRAL_SMILE_RATIO,
};
pub use landmarks::{indices, HeadPose, LandmarkData, Point};

//! Liveness Detection Module
//!
//! Active challenges, passive analysis and spoof classification, fused by
//! `LivenessDetector` into a hashed verdict.

pub mod challenge_response;
pub mod detector;
mod frame_pipeline;
pub mod passive_analyzer;
pub mod result;
pub mod spoof_detector;
pub mod temporal_consistency;

pub use challenge_response::{
    ActiveChallengeDetector, ActiveScore, ChallengeGenerator, ChallengeResult, ChallengeType,
};
pub use detector::LivenessDetector;
pub use passive_analyzer::{PassiveAnalysisResult, PassiveAnalyzer};
pub use result::{compute_model_hash, compute_result_hash, Decision, LivenessResult, VeidRecord};
pub use spoof_detector::{SpoofDetectionResult, SpoofDetector, SpoofType};
pub use temporal_consistency::TemporalProfile;

//! # veid-liveness
//!
//! Face liveness detection for VEID identity verification.
//!
//! This crate provides:
//! - **Active challenges**: blink, smile, head turn, nod and eyebrow raise over a landmark stream
//! - **Passive analysis**: texture, relief, motion, reflection, moire and spectral balance
//! - **Spoof classification**: photo, screen, replay, 2-D/3-D mask and deepfake scores
//! - **Verdict**: weighted fusion with a SHA-256 result hash bound to the configuration
//!
//! Detection is a pure function of its inputs. Given the same frames,
//! landmarks and configuration, two detectors produce the same score,
//! reason codes and result hash regardless of thread count.
//!
//! ## Example
//!
//! ```ignore
//! use veid_liveness::{LivenessConfig, LivenessDetector};
//!
//! let detector = LivenessDetector::with_config(LivenessConfig::from_file("liveness.toml")?)?;
//! let result = detector.detect(&frames, Some(&faces), Some(&landmarks), None, None);
//! println!("{} ({:.4})", result.decision, result.liveness_score);
//! let record = result.to_veid_record();
//! ```

pub mod config;
mod error;
pub mod liveness;
pub mod reason_codes;
pub mod shared;

/// Version string bound into every model hash
pub const MODEL_VERSION: &str = "veid-liveness-1.0.0";

pub use config::{
    ChallengeConfig, ConfigError, DecisionConfig, LivenessConfig, PassiveConfig, PassiveWeights,
    SpoofConfig,
};
pub use error::LivenessError;
pub use liveness::{
    ActiveChallengeDetector, ActiveScore, ChallengeGenerator, ChallengeResult, ChallengeType,
    Decision, LivenessDetector, LivenessResult, PassiveAnalysisResult, PassiveAnalyzer,
    SpoofDetectionResult, SpoofDetector, SpoofType, VeidRecord,
};
pub use reason_codes::{ReasonCategory, ReasonCode, Severity};
pub use shared::{HeadPose, LandmarkData, Point};
pub use veid_signals::{FaceRegion, Frame};

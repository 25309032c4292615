//! Liveness Results and Verification Hashes
//!
//! The verdict record, its compact on-chain form, and the two SHA-256
//! digests that let independent verifiers confirm they reached the same
//! result under the same configuration.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

use super::challenge_response::ChallengeResult;
use super::passive_analyzer::PassiveAnalysisResult;
use super::spoof_detector::SpoofDetectionResult;
use crate::config::LivenessConfig;
use crate::reason_codes::{canonical_code_strings, ReasonCode};
use crate::MODEL_VERSION;

/// Number of reason codes carried by a `VeidRecord`
pub const RECORD_REASON_CODES: usize = 5;
/// Hex characters of the model hash carried by a `VeidRecord`
pub const RECORD_MODEL_HASH_CHARS: usize = 16;

/// Final verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Live,
    Spoof,
    Uncertain,
}

impl Decision {
    pub const fn as_str(self) -> &'static str {
        match self {
            Decision::Live => "live",
            Decision::Spoof => "spoof",
            Decision::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Liveness detection result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LivenessResult {
    pub is_live: bool,
    pub decision: Decision,
    /// Combined score after adjustments, in [0, 1]
    pub liveness_score: f64,
    pub confidence: f64,
    pub high_confidence: bool,

    pub active_score: f64,
    pub passive_score: f64,
    /// `1 - overall_spoof_score`
    pub spoof_score: f64,
    pub challenges_passed: bool,

    pub model_version: String,
    pub model_hash: String,
    /// Ordered most severe first, deduplicated
    pub reason_codes: Vec<ReasonCode>,
    pub result_hash: String,

    pub frames_analyzed: usize,
    /// Wall-clock time; not part of the hash
    pub processing_time_ms: f64,

    pub challenge_results: Vec<ChallengeResult>,
    pub passive_result: Option<PassiveAnalysisResult>,
    pub spoof_result: Option<SpoofDetectionResult>,
}

impl LivenessResult {
    /// Compact record for the downstream scoring layer
    pub fn to_veid_record(&self) -> VeidRecord {
        VeidRecord {
            liveness_score: (self.liveness_score.clamp(0.0, 1.0) * 10_000.0).round() as u32,
            is_live: self.is_live,
            decision: self.decision,
            confidence: (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u8,
            model_version: self.model_version.clone(),
            model_hash: self
                .model_hash
                .chars()
                .take(RECORD_MODEL_HASH_CHARS)
                .collect(),
            result_hash: self.result_hash.clone(),
            reason_codes: self
                .reason_codes
                .iter()
                .take(RECORD_REASON_CODES)
                .map(|c| c.as_str().to_string())
                .collect(),
        }
    }

    /// Recompute the result hash from the hashed fields and compare
    pub fn verify_hash(&self) -> bool {
        compute_result_hash(
            self.liveness_score,
            self.is_live,
            self.decision,
            &self.reason_codes,
            &self.model_hash,
        ) == self.result_hash
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Compact liveness record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VeidRecord {
    /// Basis points, 0-10000
    pub liveness_score: u32,
    pub is_live: bool,
    pub decision: Decision,
    /// Percent, 0-100
    pub confidence: u8,
    pub model_version: String,
    pub model_hash: String,
    pub result_hash: String,
    pub reason_codes: Vec<String>,
}

impl VeidRecord {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// SHA-256 over the model version and the canonical configuration bytes
pub fn compute_model_hash(config: &LivenessConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(MODEL_VERSION.as_bytes());
    hasher.update(config.canonical_bytes());
    hex::encode(hasher.finalize())
}

/// Canonical string bound by the result hash
pub fn result_hash_preimage(
    score: f64,
    is_live: bool,
    decision: Decision,
    reason_codes: &[ReasonCode],
    model_hash: &str,
) -> String {
    format!(
        "score={:.4};is_live={};decision={};reason_codes={};model_hash={}",
        score,
        is_live,
        decision.as_str(),
        canonical_code_strings(reason_codes).join(","),
        model_hash
    )
}

/// SHA-256 of the canonical result string, hex-encoded
pub fn compute_result_hash(
    score: f64,
    is_live: bool,
    decision: Decision,
    reason_codes: &[ReasonCode],
    model_hash: &str,
) -> String {
    let preimage = result_hash_preimage(score, is_live, decision, reason_codes, model_hash);
    hex::encode(Sha256::digest(preimage.as_bytes()))
}

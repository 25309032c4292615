//! Liveness Detection Core
//!
//! Fuses three independent opinions into one verdict:
//! - Active challenges over the landmark stream
//! - Passive cues over the raw frames
//! - Per-attack spoof classification
//!
//! The detector holds only immutable configuration, so one instance can
//! serve concurrent `detect` calls.

use std::path::Path;
use std::time::Instant;

use veid_signals::{FaceRegion, Frame};

use super::challenge_response::{ActiveChallengeDetector, ChallengeResult, ChallengeType};
use super::frame_pipeline::{join, FaceCrops};
use super::passive_analyzer::{PassiveAnalysisResult, PassiveAnalyzer};
use super::result::{compute_model_hash, compute_result_hash, Decision, LivenessResult};
use super::spoof_detector::{SpoofDetectionResult, SpoofDetector};
use crate::config::LivenessConfig;
use crate::error::LivenessError;
use crate::reason_codes::{order_reason_codes, ReasonCode};
use crate::shared::LandmarkData;
use crate::MODEL_VERSION;

/// Added to `1 - pass_threshold` so a threshold of 1 never divides by zero
const CONFIDENCE_EPSILON: f64 = 1e-6;
/// Active score when no challenge could be evaluated
const NEUTRAL_ACTIVE_SCORE: f64 = 0.5;

/// Outcome of the active stage
#[derive(Debug, Clone, Default)]
struct ActiveOutcome {
    score: f64,
    challenges_passed: bool,
    /// At least one challenge evaluated and every one of them passed
    all_passed: bool,
    failed_required: usize,
    results: Vec<ChallengeResult>,
    reason_codes: Vec<ReasonCode>,
}

/// Score, verdict and confidence after the decision policy
#[derive(Debug, Clone, Copy, PartialEq)]
struct Verdict {
    score: f64,
    decision: Decision,
    confidence: f64,
    high_confidence: bool,
}

/// Liveness Detector
pub struct LivenessDetector {
    config: LivenessConfig,
    model_hash: String,
    challenges: ActiveChallengeDetector,
    passive: PassiveAnalyzer,
    spoof: SpoofDetector,
}

impl LivenessDetector {
    /// Detector with the default configuration
    pub fn new() -> Self {
        Self::build(LivenessConfig::default())
    }

    /// Validate `config` and build a detector from it
    pub fn with_config(config: LivenessConfig) -> Result<Self, LivenessError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Load a TOML configuration, apply `VEID_LIVENESS_*` overrides and build
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, LivenessError> {
        let config = LivenessConfig::from_file_with_env(path)?;
        Ok(Self::build(config))
    }

    fn build(config: LivenessConfig) -> Self {
        let model_hash = compute_model_hash(&config);
        log::debug!("Liveness model {} hash {}", MODEL_VERSION, &model_hash[..16]);

        Self {
            challenges: ActiveChallengeDetector::with_config(config.challenge.clone())
                .with_frame_rate(config.target_fps),
            passive: PassiveAnalyzer::with_config(config.passive.clone()),
            spoof: SpoofDetector::with_config(config.spoof.clone()),
            model_hash,
            config,
        }
    }

    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }

    /// Hex SHA-256 of the model version and configuration
    pub fn model_hash(&self) -> &str {
        &self.model_hash
    }

    /// Run the full pipeline over one capture.
    ///
    /// `required` and `optional` override the configured challenge lists.
    /// Never fails: degenerate input yields an "uncertain" result that is
    /// still hashed.
    pub fn detect(
        &self,
        frames: &[Frame],
        face_regions: Option<&[FaceRegion]>,
        landmarks: Option<&[LandmarkData]>,
        required: Option<&[ChallengeType]>,
        optional: Option<&[ChallengeType]>,
    ) -> LivenessResult {
        let start = Instant::now();

        if frames.len() < self.config.min_frames_required {
            log::debug!(
                "Insufficient frames: {}/{}",
                frames.len(),
                self.config.min_frames_required
            );
            return self.short_circuit(frames.len(), ReasonCode::InsufficientFrames, start);
        }

        let max = self.config.max_frames;
        let frames = if frames.len() > max {
            log::warn!("Truncating {} frames to {}", frames.len(), max);
            &frames[..max]
        } else {
            frames
        };
        let face_regions = face_regions.map(|r| &r[..r.len().min(max)]);
        let landmarks = landmarks.map(|l| &l[..l.len().min(max)]);

        let required = required.unwrap_or(&self.config.required_challenges);
        let optional = optional.unwrap_or(&self.config.optional_challenges);

        let (active, (passive, spoof)) = join(
            || self.evaluate_active(landmarks, required, optional),
            || {
                let crops = FaceCrops::extract(frames, face_regions);
                join(
                    || self.passive.analyze_crops(&crops),
                    || self.spoof.analyze_crops(frames, &crops, landmarks),
                )
            },
        );

        let (passive, spoof) = match (passive, spoof) {
            (Ok(p), Ok(s)) => (p, s),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("Liveness analysis failed: {}", e);
                return self.short_circuit(frames.len(), ReasonCode::SystemProcessingError, start);
            }
        };

        let verdict = self.decide(&active, &passive, &spoof);
        let is_live = verdict.decision == Decision::Live;

        let reason_codes = order_reason_codes(
            active
                .reason_codes
                .iter()
                .chain(&passive.reason_codes)
                .chain(&spoof.reason_codes)
                .copied(),
        );

        let result_hash = compute_result_hash(
            verdict.score,
            is_live,
            verdict.decision,
            &reason_codes,
            &self.model_hash,
        );

        log::debug!(
            "Liveness: decision={} score={:.4} active={:.3} passive={:.3} spoof={:.3}",
            verdict.decision,
            verdict.score,
            active.score,
            passive.combined_score,
            1.0 - spoof.overall_spoof_score
        );

        LivenessResult {
            is_live,
            decision: verdict.decision,
            liveness_score: verdict.score,
            confidence: verdict.confidence,
            high_confidence: verdict.high_confidence,
            active_score: active.score,
            passive_score: passive.combined_score,
            spoof_score: 1.0 - spoof.overall_spoof_score,
            challenges_passed: active.challenges_passed,
            model_version: MODEL_VERSION.to_string(),
            model_hash: self.model_hash.clone(),
            reason_codes,
            result_hash,
            frames_analyzed: frames.len(),
            processing_time_ms: elapsed_ms(start),
            challenge_results: active.results,
            passive_result: Some(passive),
            spoof_result: Some(spoof),
        }
    }

    fn evaluate_active(
        &self,
        landmarks: Option<&[LandmarkData]>,
        required: &[ChallengeType],
        optional: &[ChallengeType],
    ) -> ActiveOutcome {
        let usable = landmarks
            .filter(|seq| seq.len() >= self.config.challenge.min_sequence_frames)
            .filter(|_| !(required.is_empty() && optional.is_empty()));

        let Some(sequence) = usable else {
            let mut outcome = ActiveOutcome {
                score: NEUTRAL_ACTIVE_SCORE,
                challenges_passed: required.is_empty(),
                ..Default::default()
            };
            if !required.is_empty() {
                outcome.reason_codes.push(ReasonCode::InsufficientLandmarks);
            }
            return outcome;
        };

        let mut requested: Vec<ChallengeType> = Vec::with_capacity(required.len() + optional.len());
        for &c in required.iter().chain(optional) {
            if !requested.contains(&c) {
                requested.push(c);
            }
        }

        let results = self.challenges.detect_all_challenges(&requested, sequence);
        let active = self
            .challenges
            .get_overall_active_score(&results, required, optional);

        let failed_required = required
            .iter()
            .filter(|&&c| !results.iter().any(|r| r.challenge_type == c && r.passed))
            .count();

        ActiveOutcome {
            score: active.score,
            challenges_passed: active.required_passed,
            all_passed: active.all_passed && !results.is_empty(),
            failed_required,
            results,
            reason_codes: active.reason_codes,
        }
    }

    /// Weighted combination, adjustments, clamp, then the decision ladder
    fn decide(
        &self,
        active: &ActiveOutcome,
        passive: &PassiveAnalysisResult,
        spoof: &SpoofDetectionResult,
    ) -> Verdict {
        let d = &self.config.decision;

        let mut score = d.active_weight * active.score
            + d.passive_weight * passive.combined_score
            + d.spoof_weight * (1.0 - spoof.overall_spoof_score);

        match active.failed_required {
            0 => {}
            1 => score -= d.single_failure_penalty,
            _ => score -= d.multiple_failure_penalty,
        }
        if spoof.is_spoof {
            score -= d.spoof_penalty;
        }
        if active.all_passed {
            score += d.all_challenges_bonus;
        }
        if passive.motion_score > d.motion_bonus_threshold {
            score += d.motion_bonus;
        }
        let score = score.clamp(0.0, 1.0);

        let decision = if spoof.is_spoof && spoof.confidence > d.spoof_override_confidence {
            Decision::Spoof
        } else if score >= d.pass_threshold && active.challenges_passed && !spoof.is_spoof {
            Decision::Live
        } else if score >= d.low_confidence_threshold && active.challenges_passed {
            Decision::Uncertain
        } else if spoof.is_spoof {
            Decision::Spoof
        } else {
            Decision::Uncertain
        };

        let confidence = if decision == Decision::Live {
            (score / d.pass_threshold).min(1.0)
        } else {
            ((1.0 - score) / (1.0 - d.pass_threshold + CONFIDENCE_EPSILON)).min(1.0)
        };

        Verdict {
            score,
            decision,
            confidence,
            high_confidence: decision == Decision::Live && score >= d.high_confidence_threshold,
        }
    }

    /// Uncertain, zero-score result carrying a single reason code
    fn short_circuit(&self, frames: usize, code: ReasonCode, start: Instant) -> LivenessResult {
        let reason_codes = vec![code];
        let result_hash = compute_result_hash(
            0.0,
            false,
            Decision::Uncertain,
            &reason_codes,
            &self.model_hash,
        );

        LivenessResult {
            is_live: false,
            decision: Decision::Uncertain,
            liveness_score: 0.0,
            confidence: 0.0,
            high_confidence: false,
            active_score: 0.0,
            passive_score: 0.0,
            spoof_score: 0.0,
            challenges_passed: false,
            model_version: MODEL_VERSION.to_string(),
            model_hash: self.model_hash.clone(),
            reason_codes,
            result_hash,
            frames_analyzed: frames,
            processing_time_ms: elapsed_ms(start),
            challenge_results: Vec::new(),
            passive_result: None,
            spoof_result: None,
        }
    }
}

impl Default for LivenessDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

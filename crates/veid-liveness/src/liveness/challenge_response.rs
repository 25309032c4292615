//! Challenge-Response Verification
//!
//! Verifies cooperative gestures (blink, smile, head turn, nod, eyebrow
//! raise) over an explicit landmark sequence. Detection is a pure function of
//! the sequence: nothing is accumulated between calls.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::ChallengeConfig;
use crate::reason_codes::ReasonCode;
use crate::shared::{FeatureSeries, LandmarkData};

/// Challenge types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeType {
    Blink,
    Smile,
    HeadTurnLeft,
    HeadTurnRight,
    HeadNod,
    EyebrowRaise,
}

impl ChallengeType {
    pub const ALL: [ChallengeType; 6] = [
        ChallengeType::Blink,
        ChallengeType::Smile,
        ChallengeType::HeadTurnLeft,
        ChallengeType::HeadTurnRight,
        ChallengeType::HeadNod,
        ChallengeType::EyebrowRaise,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ChallengeType::Blink => "blink",
            ChallengeType::Smile => "smile",
            ChallengeType::HeadTurnLeft => "head_turn_left",
            ChallengeType::HeadTurnRight => "head_turn_right",
            ChallengeType::HeadNod => "head_nod",
            ChallengeType::EyebrowRaise => "eyebrow_raise",
        }
    }

    /// Prompt shown to the user
    pub const fn instruction(self) -> &'static str {
        match self {
            ChallengeType::Blink => "Please blink your eyes",
            ChallengeType::Smile => "Please smile",
            ChallengeType::HeadTurnLeft => "Please turn your head left",
            ChallengeType::HeadTurnRight => "Please turn your head right",
            ChallengeType::HeadNod => "Please nod your head",
            ChallengeType::EyebrowRaise => "Please raise your eyebrows",
        }
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChallengeType::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown challenge type: {}", s))
    }
}

/// Outcome of one gesture test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeResult {
    pub challenge_type: ChallengeType,
    pub passed: bool,
    /// 0-1
    pub confidence: f64,
    /// `frame_index` of the landmark frame where the gesture was found
    pub detection_frame: Option<usize>,
    pub duration_ms: f64,
    pub reason_codes: Vec<ReasonCode>,
    /// Measurements (min EAR, peak ratio, baseline, peak delta, ...)
    pub details: BTreeMap<String, f64>,
}

impl ChallengeResult {
    fn new(challenge_type: ChallengeType) -> Self {
        Self {
            challenge_type,
            passed: false,
            confidence: 0.0,
            detection_frame: None,
            duration_ms: 0.0,
            reason_codes: Vec::new(),
            details: BTreeMap::new(),
        }
    }

    fn fail(mut self, code: ReasonCode, confidence: f64) -> Self {
        self.passed = false;
        self.confidence = confidence.clamp(0.0, 1.0);
        self.reason_codes.push(code);
        self
    }

    fn pass(mut self, confidence: f64, frame: usize, duration_ms: f64) -> Self {
        self.passed = true;
        self.confidence = confidence.clamp(0.0, 1.0);
        self.detection_frame = Some(frame);
        self.duration_ms = duration_ms;
        self
    }

    fn detail(&mut self, key: &str, value: f64) {
        self.details.insert(key.to_string(), value);
    }
}

/// Combined active-challenge score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveScore {
    pub score: f64,
    /// Every required challenge has a passing result
    pub required_passed: bool,
    /// Every required and optional challenge has a passing result
    pub all_passed: bool,
    /// Codes from failed required challenges
    pub reason_codes: Vec<ReasonCode>,
}

/// `0.5 + 0.5 * min(1, excess / scale)`
#[inline]
fn magnitude_confidence(excess: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.5;
    }
    0.5 + 0.5 * (excess / scale).clamp(0.0, 1.0)
}

/// Median of the first `count` values
fn baseline(values: impl Iterator<Item = f64>, count: usize) -> Option<f64> {
    let head: Vec<f64> = values.take(count).collect();
    if head.is_empty() {
        None
    } else {
        Some(veid_signals::dsp::stats::median(&head))
    }
}

/// Active challenge detector
pub struct ActiveChallengeDetector {
    config: ChallengeConfig,
    fps: f64,
}

impl ActiveChallengeDetector {
    pub fn new() -> Self {
        Self::with_config(ChallengeConfig::default())
    }

    pub fn with_config(config: ChallengeConfig) -> Self {
        Self { config, fps: 30.0 }
    }

    /// Frame rate used when landmark timestamps are unusable
    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn config(&self) -> &ChallengeConfig {
        &self.config
    }

    /// Evaluate one challenge over a landmark sequence
    pub fn detect_challenge(&self, challenge: ChallengeType, sequence: &[LandmarkData]) -> ChallengeResult {
        if sequence.len() < self.config.min_sequence_frames {
            let mut result = ChallengeResult::new(challenge);
            result.detail("frames", sequence.len() as f64);
            return result.fail(ReasonCode::ChallengeInsufficientData, 0.0);
        }

        let series = FeatureSeries::from_landmarks(sequence, self.fps);
        self.detect_in_series(challenge, &series)
    }

    /// Evaluate several challenges independently over the same sequence
    pub fn detect_all_challenges(
        &self,
        challenges: &[ChallengeType],
        sequence: &[LandmarkData],
    ) -> Vec<ChallengeResult> {
        if sequence.len() < self.config.min_sequence_frames {
            return challenges
                .iter()
                .map(|&c| self.detect_challenge(c, sequence))
                .collect();
        }

        let series = FeatureSeries::from_landmarks(sequence, self.fps);
        challenges
            .iter()
            .map(|&c| self.detect_in_series(c, &series))
            .collect()
    }

    fn detect_in_series(&self, challenge: ChallengeType, series: &FeatureSeries) -> ChallengeResult {
        let result = match challenge {
            ChallengeType::Blink => self.detect_blink(series),
            ChallengeType::Smile => self.detect_smile(series),
            ChallengeType::HeadTurnLeft => self.detect_head_turn(series, challenge, -1.0),
            ChallengeType::HeadTurnRight => self.detect_head_turn(series, challenge, 1.0),
            ChallengeType::HeadNod => self.detect_head_nod(series),
            ChallengeType::EyebrowRaise => self.detect_eyebrow_raise(series),
        };
        log::trace!(
            "challenge {} passed={} confidence={:.3}",
            challenge,
            result.passed,
            result.confidence
        );
        result
    }

    /// Combine challenge outcomes into one score.
    ///
    /// `0.7 * required_fraction + 0.3 * optional_fraction` (an empty set counts
    /// as fully passed), plus a 0.05 bonus when everything passed.
    pub fn get_overall_active_score(
        &self,
        results: &[ChallengeResult],
        required: &[ChallengeType],
        optional: &[ChallengeType],
    ) -> ActiveScore {
        let outcome = |c: ChallengeType| results.iter().find(|r| r.challenge_type == c);
        let passed = |c: ChallengeType| outcome(c).map_or(false, |r| r.passed);

        let fraction = |set: &[ChallengeType]| {
            if set.is_empty() {
                1.0
            } else {
                set.iter().filter(|&&c| passed(c)).count() as f64 / set.len() as f64
            }
        };

        let required_fraction = fraction(required);
        let optional_fraction = fraction(optional);
        let required_passed = required.iter().all(|&c| passed(c));
        let all_passed = required_passed && optional.iter().all(|&c| passed(c));

        let mut score = 0.7 * required_fraction + 0.3 * optional_fraction;
        if all_passed {
            score += 0.05;
        }

        let mut reason_codes = Vec::new();
        for &c in required {
            match outcome(c) {
                Some(r) if !r.passed => reason_codes.extend(r.reason_codes.iter().copied()),
                Some(_) => {}
                None => reason_codes.push(ReasonCode::ChallengeNotPerformed),
            }
        }

        ActiveScore {
            score: score.clamp(0.0, 1.0),
            required_passed,
            all_passed,
            reason_codes,
        }
    }

    fn detect_blink(&self, series: &FeatureSeries) -> ChallengeResult {
        let mut result = ChallengeResult::new(ChallengeType::Blink);
        let threshold = self.config.blink_ear_threshold;
        let ear = &series.ear;

        let min_ear = ear.iter().copied().fold(f64::INFINITY, f64::min);
        result.detail("min_ear", min_ear);
        result.detail("ear_threshold", threshold);

        let confidence = magnitude_confidence(threshold - min_ear, 0.5 * threshold);
        let mut run_start: Option<usize> = None;
        let mut last_timing: Option<f64> = None;

        for i in 0..ear.len() {
            if ear[i] < threshold {
                run_start.get_or_insert(i);
                continue;
            }
            let Some(start) = run_start.take() else {
                continue;
            };
            if i - start < self.config.blink_min_frames {
                continue;
            }

            let duration = series.elapsed_ms(start, i);
            if duration >= self.config.blink_min_duration_ms
                && duration <= self.config.blink_max_duration_ms
            {
                result.detail("duration_ms", duration);
                return result.pass(confidence, series.frame_indices[start], duration);
            }
            last_timing = Some(duration);
        }

        match last_timing {
            Some(duration) => {
                result.detail("duration_ms", duration);
                result.duration_ms = duration;
                let code = if duration < self.config.blink_min_duration_ms {
                    ReasonCode::BlinkTooFast
                } else {
                    ReasonCode::BlinkTooSlow
                };
                result.fail(code, confidence)
            }
            None => result.fail(ReasonCode::BlinkNotDetected, 0.0),
        }
    }

    fn detect_smile(&self, series: &FeatureSeries) -> ChallengeResult {
        let mut result = ChallengeResult::new(ChallengeType::Smile);
        let threshold = self.config.smile_ratio_threshold;
        let ratio = &series.smile_ratio;
        let n = ratio.len();

        let peak = ratio.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        result.detail("peak_ratio", peak);
        let confidence = magnitude_confidence(peak - threshold, 0.5 * threshold);

        let mut longest = 0.0f64;
        let mut any_run = false;
        let mut i = 0;
        while i < n {
            if ratio[i] <= threshold {
                i += 1;
                continue;
            }
            let start = i;
            while i + 1 < n && ratio[i + 1] > threshold {
                i += 1;
            }
            any_run = true;
            let duration = series.elapsed_ms(start, i);
            if duration >= self.config.smile_min_duration_ms {
                result.detail("duration_ms", duration);
                return result.pass(confidence, series.frame_indices[start], duration);
            }
            longest = longest.max(duration);
            i += 1;
        }

        if any_run {
            result.detail("duration_ms", longest);
            result.duration_ms = longest;
            result.fail(ReasonCode::SmileTooShort, confidence)
        } else {
            result.fail(ReasonCode::SmileNotDetected, 0.0)
        }
    }

    /// `direction` is -1 for left, +1 for right
    fn detect_head_turn(&self, series: &FeatureSeries, challenge: ChallengeType, direction: f64) -> ChallengeResult {
        let mut result = ChallengeResult::new(challenge);
        let threshold = self.config.head_turn_angle_threshold;
        let max_angle = self.config.head_turn_max_angle;
        let n = series.len();

        let Some(base) = baseline(series.yaw.iter().copied(), self.config.baseline_frames) else {
            return result.fail(ReasonCode::HeadTurnNotDetected, 0.0);
        };
        result.detail("baseline_yaw", base);

        let delta: Vec<f64> = series.yaw.iter().map(|&y| y - base).collect();
        let toward = |d: f64| d * direction >= threshold;
        let away = |d: f64| -d * direction >= threshold;

        let peak = delta
            .iter()
            .filter(|&&d| toward(d))
            .map(|d| d.abs())
            .fold(0.0f64, f64::max);
        result.detail("peak_delta", peak);
        let confidence = magnitude_confidence(peak.min(max_angle) - threshold, threshold);

        let mut excessive = false;
        let mut any_run = false;
        let mut i = 0;
        while i < n {
            if !toward(delta[i]) {
                i += 1;
                continue;
            }
            let start = i;
            while i + 1 < n && toward(delta[i + 1]) {
                i += 1;
            }
            any_run = true;
            let run_peak = delta[start..=i].iter().map(|d| d.abs()).fold(0.0f64, f64::max);
            let duration = series.elapsed_ms(start, i);
            if run_peak > max_angle {
                excessive = true;
            } else if duration >= self.config.head_turn_min_duration_ms {
                result.detail("duration_ms", duration);
                return result.pass(confidence, series.frame_indices[start], duration);
            }
            i += 1;
        }

        if excessive {
            result.fail(ReasonCode::HeadTurnExcessive, confidence)
        } else if delta.iter().any(|&d| away(d)) {
            result.fail(ReasonCode::WrongDirection, 0.0)
        } else if any_run {
            result.fail(ReasonCode::HeadTurnNotDetected, confidence)
        } else {
            result.fail(ReasonCode::HeadTurnNotDetected, 0.0)
        }
    }

    fn detect_head_nod(&self, series: &FeatureSeries) -> ChallengeResult {
        #[derive(Clone, Copy)]
        enum NodState {
            Neutral,
            Moved { since: usize, peak: f64 },
        }

        let mut result = ChallengeResult::new(ChallengeType::HeadNod);
        let threshold = self.config.nod_angle_threshold;

        let Some(base) = baseline(series.pitch.iter().copied(), self.config.baseline_frames) else {
            return result.fail(ReasonCode::HeadNodNotDetected, 0.0);
        };
        result.detail("baseline_pitch", base);

        let mut state = NodState::Neutral;
        let mut max_delta = 0.0f64;

        for (i, &pitch) in series.pitch.iter().enumerate() {
            let delta = (pitch - base).abs();
            max_delta = max_delta.max(delta);

            state = match state {
                NodState::Neutral if delta >= threshold => NodState::Moved { since: i, peak: delta },
                NodState::Neutral => NodState::Neutral,
                NodState::Moved { since, peak } if delta < threshold / 2.0 => {
                    let elapsed = series.elapsed_ms(since, i);
                    if elapsed >= self.config.nod_min_duration_ms {
                        result.detail("peak_delta", peak);
                        result.detail("duration_ms", elapsed);
                        let confidence = magnitude_confidence(peak - threshold, threshold);
                        return result.pass(confidence, series.frame_indices[since], elapsed);
                    }
                    NodState::Neutral
                }
                NodState::Moved { since, peak } => NodState::Moved {
                    since,
                    peak: peak.max(delta),
                },
            };
        }

        result.detail("peak_delta", max_delta);
        result.fail(ReasonCode::HeadNodNotDetected, 0.0)
    }

    fn detect_eyebrow_raise(&self, series: &FeatureSeries) -> ChallengeResult {
        let mut result = ChallengeResult::new(ChallengeType::EyebrowRaise);
        let threshold = self.config.eyebrow_raise_threshold;

        let available = series.eyebrow_distance.iter().filter_map(|d| *d);
        let base = match baseline(available, self.config.baseline_frames) {
            Some(b) if b > 1e-9 => b,
            _ => return result.fail(ReasonCode::EyebrowRaiseNotDetected, 0.0),
        };
        result.detail("baseline_distance", base);

        let mut peak = f64::NEG_INFINITY;
        for (i, distance) in series.eyebrow_distance.iter().enumerate() {
            let Some(d) = *distance else {
                continue;
            };
            let relative = (d - base) / base;
            peak = peak.max(relative);
            if relative > threshold {
                result.detail("peak_increase", relative);
                let confidence = magnitude_confidence(relative - threshold, threshold);
                return result.pass(confidence, series.frame_indices[i], 0.0);
            }
        }

        result.detail("peak_increase", peak);
        result.fail(ReasonCode::EyebrowRaiseNotDetected, 0.0)
    }
}

impl Default for ActiveChallengeDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Challenge Generator
///
/// Draws a distinct set of challenges for a session from an injected RNG so
/// that callers control seeding.
pub struct ChallengeGenerator {
    pool: Vec<ChallengeType>,
}

impl ChallengeGenerator {
    pub fn new() -> Self {
        Self {
            pool: ChallengeType::ALL.to_vec(),
        }
    }

    /// Restrict generation to a subset of challenge types
    pub fn with_pool(pool: Vec<ChallengeType>) -> Self {
        let mut unique: Vec<ChallengeType> = Vec::with_capacity(pool.len());
        for c in pool {
            if !unique.contains(&c) {
                unique.push(c);
            }
        }
        Self { pool: unique }
    }

    /// Pick `count` distinct challenges (capped at the pool size)
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<ChallengeType> {
        self.pool.choose_multiple(rng, count.min(self.pool.len())).copied().collect()
    }
}

impl Default for ChallengeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face_metrics::fixtures::{brow, eye, mouth};
    use crate::shared::HeadPose;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FRAME_MS: f64 = 33.0;

    fn frame(i: usize, ts: f64) -> LandmarkData {
        LandmarkData::new(i, ts)
            .with_eyes(eye(-30.0, 50.0, 15.0, 5.0), eye(30.0, 50.0, 15.0, 5.0))
            .with_mouth_outer(mouth(0.0, 120.0, 20.0, 8.0))
            .with_eyebrows(brow(-30.0, 30.0), brow(30.0, 30.0))
    }

    fn neutral_sequence(n: usize, spacing: f64) -> Vec<LandmarkData> {
        (0..n).map(|i| frame(i, i as f64 * spacing)).collect()
    }

    fn close_eyes(lm: &mut LandmarkData) {
        lm.left_eye = Some(eye(-30.0, 50.0, 15.0, 0.5));
        lm.right_eye = Some(eye(30.0, 50.0, 15.0, 0.5));
    }

    #[test]
    fn test_blink_detected() {
        let mut seq = neutral_sequence(15, FRAME_MS);
        close_eyes(&mut seq[6]);
        close_eyes(&mut seq[7]);

        let detector = ActiveChallengeDetector::new();
        let result = detector.detect_challenge(ChallengeType::Blink, &seq);
        assert!(result.passed);
        assert_eq!(result.detection_frame, Some(6));
        assert_relative_eq!(result.duration_ms, 66.0);
        assert!(result.confidence > 0.5);
    }

    #[test]
    fn test_blink_too_fast() {
        let mut seq = neutral_sequence(15, 10.0);
        close_eyes(&mut seq[6]);
        close_eyes(&mut seq[7]);

        let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::Blink, &seq);
        assert!(!result.passed);
        assert_eq!(result.reason_codes, vec![ReasonCode::BlinkTooFast]);
    }

    #[test]
    fn test_blink_too_slow_and_unterminated() {
        let mut seq = neutral_sequence(30, FRAME_MS);
        for lm in &mut seq[5..25] {
            close_eyes(lm);
        }
        let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::Blink, &seq);
        assert_eq!(result.reason_codes, vec![ReasonCode::BlinkTooSlow]);

        // Eyes close and never reopen
        let mut seq = neutral_sequence(15, FRAME_MS);
        for lm in &mut seq[12..] {
            close_eyes(lm);
        }
        let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::Blink, &seq);
        assert_eq!(result.reason_codes, vec![ReasonCode::BlinkNotDetected]);
        assert_relative_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_insufficient_data() {
        let seq = neutral_sequence(5, FRAME_MS);
        let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::Smile, &seq);
        assert!(!result.passed);
        assert_relative_eq!(result.confidence, 0.0);
        assert_eq!(result.reason_codes, vec![ReasonCode::ChallengeInsufficientData]);
    }

    #[test]
    fn test_smile_sustained_until_end() {
        let mut seq = neutral_sequence(20, FRAME_MS);
        for lm in &mut seq[8..] {
            lm.mouth_outer = Some(mouth(0.0, 120.0, 30.0, 4.0));
        }
        let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::Smile, &seq);
        assert!(result.passed, "{:?}", result);
        assert_eq!(result.detection_frame, Some(8));
    }

    #[test]
    fn test_smile_too_short() {
        let mut seq = neutral_sequence(20, FRAME_MS);
        for lm in &mut seq[8..11] {
            lm.mouth_outer = Some(mouth(0.0, 120.0, 30.0, 4.0));
        }
        let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::Smile, &seq);
        assert_eq!(result.reason_codes, vec![ReasonCode::SmileTooShort]);
    }

    fn yaw_sequence(yaw_after: f32) -> Vec<LandmarkData> {
        (0..20)
            .map(|i| {
                let yaw = if i < 8 { 0.0 } else { yaw_after };
                frame(i, i as f64 * FRAME_MS).with_head_pose(HeadPose::new(0.0, yaw, 0.0))
            })
            .collect()
    }

    #[test]
    fn test_head_turn_left_and_wrong_direction() {
        let seq = yaw_sequence(-20.0);
        let detector = ActiveChallengeDetector::new();

        let left = detector.detect_challenge(ChallengeType::HeadTurnLeft, &seq);
        assert!(left.passed);
        assert_relative_eq!(left.confidence, 0.5 + 0.5 * 5.0 / 15.0, epsilon = 1e-9);

        let right = detector.detect_challenge(ChallengeType::HeadTurnRight, &seq);
        assert!(!right.passed);
        assert_eq!(right.reason_codes, vec![ReasonCode::WrongDirection]);
    }

    #[test]
    fn test_head_turn_excessive() {
        let seq = yaw_sequence(60.0);
        let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::HeadTurnRight, &seq);
        assert_eq!(result.reason_codes, vec![ReasonCode::HeadTurnExcessive]);
    }

    #[test]
    fn test_head_nod() {
        let seq: Vec<LandmarkData> = (0..20)
            .map(|i| {
                let pitch = if (8..14).contains(&i) { 15.0 } else { 0.0 };
                frame(i, i as f64 * FRAME_MS).with_head_pose(HeadPose::new(pitch, 0.0, 0.0))
            })
            .collect();
        let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::HeadNod, &seq);
        assert!(result.passed);
        assert_eq!(result.detection_frame, Some(8));
        assert_relative_eq!(result.duration_ms, 6.0 * FRAME_MS);

        // Too quick a dip resets the state machine
        let seq: Vec<LandmarkData> = (0..20)
            .map(|i| {
                let pitch = if i == 8 { 15.0 } else { 0.0 };
                frame(i, i as f64 * FRAME_MS).with_head_pose(HeadPose::new(pitch, 0.0, 0.0))
            })
            .collect();
        let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::HeadNod, &seq);
        assert_eq!(result.reason_codes, vec![ReasonCode::HeadNodNotDetected]);
    }

    #[test]
    fn test_eyebrow_raise() {
        let mut seq = neutral_sequence(15, FRAME_MS);
        for lm in &mut seq[10..] {
            lm.left_eyebrow = Some(brow(-30.0, 24.0));
            lm.right_eyebrow = Some(brow(30.0, 24.0));
        }
        let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::EyebrowRaise, &seq);
        assert!(result.passed);
        assert_eq!(result.detection_frame, Some(10));

        let seq = neutral_sequence(15, FRAME_MS);
        let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::EyebrowRaise, &seq);
        assert_eq!(result.reason_codes, vec![ReasonCode::EyebrowRaiseNotDetected]);
    }

    #[test]
    fn test_overall_active_score() {
        let detector = ActiveChallengeDetector::new();
        let mut seq = neutral_sequence(15, FRAME_MS);
        close_eyes(&mut seq[6]);
        close_eyes(&mut seq[7]);

        let results = detector.detect_all_challenges(&[ChallengeType::Blink, ChallengeType::Smile], &seq);
        let score = detector.get_overall_active_score(&results, &[ChallengeType::Blink], &[ChallengeType::Smile]);
        assert_relative_eq!(score.score, 0.7);
        assert!(score.required_passed);
        assert!(!score.all_passed);
        assert!(score.reason_codes.is_empty());

        let score = detector.get_overall_active_score(&results, &[ChallengeType::Blink], &[]);
        assert_relative_eq!(score.score, 1.0);

        let score = detector.get_overall_active_score(
            &results,
            &[ChallengeType::Smile, ChallengeType::HeadNod],
            &[],
        );
        assert_relative_eq!(score.score, 0.3);
        assert_eq!(
            score.reason_codes,
            vec![ReasonCode::SmileNotDetected, ReasonCode::ChallengeNotPerformed]
        );
    }

    #[test]
    fn test_generator_distinct() {
        let generator = ChallengeGenerator::new();
        let mut rng = StdRng::seed_from_u64(7);
        let picked = generator.generate(&mut rng, 4);
        assert_eq!(picked.len(), 4);
        for (i, a) in picked.iter().enumerate() {
            assert!(!picked[i + 1..].contains(a));
        }
        assert_eq!(generator.generate(&mut rng, 10).len(), 6);

        let small = ChallengeGenerator::with_pool(vec![ChallengeType::Blink, ChallengeType::Blink]);
        assert_eq!(small.generate(&mut rng, 3), vec![ChallengeType::Blink]);
    }

    #[test]
    fn test_challenge_type_parsing() {
        for c in ChallengeType::ALL {
            assert_eq!(c.as_str().parse::<ChallengeType>(), Ok(c));
        }
        assert!("wink".parse::<ChallengeType>().is_err());
    }
}

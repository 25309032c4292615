mod common;

use approx::assert_relative_eq;
use common::*;
use veid_liveness::shared::eye_aspect_ratio;
use veid_liveness::{
    ActiveChallengeDetector, ChallengeType, Decision, LivenessConfig, LivenessDetector,
    PassiveAnalyzer, PassiveConfig, ReasonCode, SpoofDetector, SpoofType,
};

#[test]
fn closed_eye_has_lower_ear() {
    let open = eye_aspect_ratio(&eye(0.0, 0.0, 15.0, 5.0)).unwrap();
    let closed = eye_aspect_ratio(&eye(0.0, 0.0, 15.0, 0.5)).unwrap();
    assert!(closed < open);
}

#[test]
fn blink_within_duration_window_passes() {
    // Two closed frames (the configured minimum), 33 ms apart, reopening after 66 ms
    let seq = blink_sequence(20, FRAME_MS, 8..10);
    let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::Blink, &seq);

    assert!(result.passed);
    assert_eq!(result.detection_frame, Some(8));
    assert_relative_eq!(result.duration_ms, 66.0);
    // min EAR is far below threshold, so confidence saturates
    assert_relative_eq!(result.confidence, 1.0);
}

#[test]
fn blink_too_fast_is_reported() {
    let seq = blink_sequence(20, 10.0, 8..10);
    let result = ActiveChallengeDetector::new().detect_challenge(ChallengeType::Blink, &seq);

    assert!(!result.passed);
    assert_eq!(result.reason_codes, vec![ReasonCode::BlinkTooFast]);
}

#[test]
fn head_turn_left_and_wrong_direction() {
    let seq = yaw_sequence(20, 8, -20.0);
    let detector = ActiveChallengeDetector::new();

    assert!(detector.detect_challenge(ChallengeType::HeadTurnLeft, &seq).passed);

    let right = detector.detect_challenge(ChallengeType::HeadTurnRight, &seq);
    assert!(!right.passed);
    assert_eq!(right.reason_codes, vec![ReasonCode::WrongDirection]);
}

#[test]
fn identical_frames_have_no_motion() {
    let frames = static_capture(15);
    let result = PassiveAnalyzer::new().analyze(&frames, None).unwrap();

    assert_eq!(result.details["avg_motion"], 0.0);
    assert!(result.reason_codes.contains(&ReasonCode::NoMotion));
    assert_eq!(result.motion_score, PassiveConfig::default().low_motion_score);
}

#[test]
fn spoof_overall_is_max_of_types() {
    for frames in [static_capture(12), moving_capture(12), noise_frames(7, 12, 80)] {
        let result = SpoofDetector::new().analyze(&frames, None, None).unwrap();
        let max = SpoofType::ALL
            .iter()
            .map(|&t| result.score(t))
            .fold(f64::NEG_INFINITY, f64::max);

        assert_eq!(result.overall_spoof_score, max);
        assert_eq!(result.spoof_type.is_some(), result.is_spoof);
        if let Some(t) = result.spoof_type {
            assert_eq!(result.score(t), max);
        }
    }
}

#[test]
fn static_face_without_landmarks_is_not_live() {
    let frames = static_capture(20);
    let result = LivenessDetector::new().detect(&frames, None, None, None, None);

    let passive = result.passive_result.as_ref().unwrap();
    assert!(passive.motion_score <= PassiveConfig::default().low_motion_score);
    assert!(result.reason_codes.contains(&ReasonCode::NoMotion));
    assert_ne!(result.decision, Decision::Live);
    assert!(!result.is_live);
    assert!(result.verify_hash());
}

#[test]
fn invalid_configuration_fails_before_detection() {
    let mut config = LivenessConfig::default();
    config.passive.weights.texture += 0.5;
    assert!(LivenessDetector::with_config(config).is_err());

    let mut config = LivenessConfig::default();
    config.decision.pass_threshold = 1.5;
    assert!(LivenessDetector::with_config(config).is_err());
}

#[test]
fn component_scores_within_unit_interval() {
    let detector = LivenessDetector::new();
    let landmarks = blink_sequence(20, FRAME_MS, 8..10);

    for frames in [static_capture(20), moving_capture(20), noise_frames(3, 20, 72)] {
        let result = detector.detect(&frames, None, Some(&landmarks), None, None);
        for score in [
            result.liveness_score,
            result.confidence,
            result.active_score,
            result.passive_score,
            result.spoof_score,
        ] {
            assert!((0.0..=1.0).contains(&score), "{}", score);
        }

        let passive = result.passive_result.unwrap();
        let spoof = result.spoof_result.unwrap();
        for score in [
            passive.texture_score,
            passive.depth_score,
            passive.motion_score,
            passive.reflection_score,
            passive.moire_score,
            passive.frequency_score,
            passive.combined_score,
            spoof.photo_print_score,
            spoof.screen_display_score,
            spoof.video_replay_score,
            spoof.mask_2d_score,
            spoof.mask_3d_score,
            spoof.deepfake_score,
            spoof.overall_spoof_score,
        ] {
            assert!((0.0..=1.0).contains(&score), "{}", score);
        }
    }
}

#[test]
fn blink_capture_satisfies_required_challenge() {
    let frames = moving_capture(20);
    let landmarks = blink_sequence(20, FRAME_MS, 8..10);
    let result = LivenessDetector::new().detect(&frames, None, Some(&landmarks), None, None);

    assert!(result.challenges_passed);
    assert_eq!(result.challenge_results.len(), 1);
    assert!(result.challenge_results[0].passed);
    assert!(!result
        .reason_codes
        .iter()
        .any(|c| matches!(c, ReasonCode::BlinkNotDetected | ReasonCode::InsufficientLandmarks)));
}

#[test]
fn natural_capture_with_blink_is_live() {
    let frames = natural_capture(20);
    let landmarks = blink_sequence(20, FRAME_MS, 8..10);
    let result = LivenessDetector::new().detect(&frames, None, Some(&landmarks), None, None);

    let passive = result.passive_result.as_ref().unwrap();
    let spoof = result.spoof_result.as_ref().unwrap();
    assert!(passive.is_live);
    assert!(passive.motion_score > 0.7, "{}", passive.motion_score);
    assert!(!spoof.is_spoof, "{:?}", spoof);
    assert!(spoof.overall_spoof_score < 0.45, "{}", spoof.overall_spoof_score);

    assert_eq!(result.decision, Decision::Live);
    assert!(result.is_live);
    assert!(result.challenges_passed);
    assert!(result.liveness_score >= 0.85, "{}", result.liveness_score);
    assert!(result.reason_codes.is_empty(), "{:?}", result.reason_codes);
    assert!(result.verify_hash());
}

#[test]
fn requested_challenges_override_configuration() {
    let frames = moving_capture(20);
    let landmarks = blink_sequence(20, FRAME_MS, 8..10);
    let result = LivenessDetector::new().detect(
        &frames,
        None,
        Some(&landmarks),
        Some(&[ChallengeType::Smile]),
        Some(&[ChallengeType::Blink]),
    );

    assert!(!result.challenges_passed);
    assert_eq!(result.challenge_results.len(), 2);
    assert!(result.reason_codes.contains(&ReasonCode::SmileNotDetected));
}

#[test]
fn reason_codes_are_ordered_and_unique() {
    let frames = static_capture(20);
    let result = LivenessDetector::new().detect(&frames, None, None, None, None);

    let codes = &result.reason_codes;
    for (i, a) in codes.iter().enumerate() {
        assert!(!codes[i + 1..].contains(a), "duplicate {}", a);
    }
    for pair in codes.windows(2) {
        assert!(pair[0].severity() <= pair[1].severity());
    }
}

#[test]
fn veid_record_matches_result() {
    let frames = static_capture(20);
    let result = LivenessDetector::new().detect(&frames, None, None, None, None);
    let record = result.to_veid_record();

    assert_eq!(record.liveness_score, (result.liveness_score * 10_000.0).round() as u32);
    assert_eq!(record.decision, result.decision);
    assert_eq!(record.result_hash, result.result_hash);
    assert_eq!(&record.model_hash[..], &result.model_hash[..16]);
    assert!(record.reason_codes.len() <= 5);
    assert_eq!(record.reason_codes[0], result.reason_codes[0].as_str());
}

//! Property tests over random captures and landmark geometry

mod common;

use common::*;
use proptest::prelude::*;
use veid_liveness::liveness::result::compute_result_hash;
use veid_liveness::reason_codes::order_reason_codes;
use veid_liveness::shared::eye_aspect_ratio;
use veid_liveness::{Decision, LivenessDetector, ReasonCode, SpoofDetector, SpoofType};

fn code_subset() -> impl Strategy<Value = Vec<ReasonCode>> {
    prop::collection::vec(0..ReasonCode::ALL.len(), 0..12)
        .prop_map(|idx| idx.into_iter().map(|i| ReasonCode::ALL[i]).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn detection_scores_bounded(seed in any::<u64>(), n in 0usize..24, size in 12u32..48) {
        let frames = noise_frames(seed, n, size);
        let landmarks = blink_sequence(n, FRAME_MS, n / 3..n / 2);
        let result = LivenessDetector::new().detect(&frames, None, Some(&landmarks), None, None);

        for score in [
            result.liveness_score,
            result.confidence,
            result.active_score,
            result.passive_score,
            result.spoof_score,
        ] {
            prop_assert!((0.0..=1.0).contains(&score));
        }
        prop_assert!(result.verify_hash());
        prop_assert_eq!(result.is_live, result.decision == Decision::Live);
        if n < 10 {
            prop_assert_eq!(&result.reason_codes, &vec![ReasonCode::InsufficientFrames]);
        }
    }

    #[test]
    fn spoof_overall_is_arg_max(seed in any::<u64>(), n in 1usize..16, size in 8u32..48) {
        let frames = noise_frames(seed, n, size);
        let result = SpoofDetector::new().analyze(&frames, None, None).unwrap();

        let max = SpoofType::ALL.iter().map(|&t| result.score(t)).fold(0.0f64, f64::max);
        prop_assert_eq!(result.overall_spoof_score, max);
        prop_assert_eq!(result.spoof_type.is_some(), result.is_spoof);
        if let Some(t) = result.spoof_type {
            prop_assert_eq!(result.score(t), max);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn closing_the_eye_lowers_ear(
        w in 5.0f32..40.0,
        open in 2.0f32..20.0,
        ratio in 0.05f32..0.9,
    ) {
        let open_ear = eye_aspect_ratio(&eye(0.0, 0.0, w, open)).unwrap();
        let closed_ear = eye_aspect_ratio(&eye(0.0, 0.0, w, open * ratio)).unwrap();
        prop_assert!(closed_ear < open_ear);
    }

    #[test]
    fn ordered_codes_are_unique_and_sorted(codes in code_subset()) {
        let ordered = order_reason_codes(codes.iter().copied());

        for (i, code) in ordered.iter().enumerate() {
            prop_assert!(!ordered[i + 1..].contains(code));
        }
        for pair in ordered.windows(2) {
            prop_assert!(pair[0].severity() <= pair[1].severity());
        }
        for code in &codes {
            prop_assert!(ordered.contains(code));
        }
    }

    #[test]
    fn result_hash_ignores_code_order(codes in code_subset(), score in 0.0f64..=1.0) {
        let mut reversed = codes.clone();
        reversed.reverse();

        prop_assert_eq!(
            compute_result_hash(score, false, Decision::Uncertain, &codes, "model"),
            compute_result_hash(score, false, Decision::Uncertain, &reversed, "model")
        );
    }
}

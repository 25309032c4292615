//! Reason Codes
//!
//! Closed set of machine-readable codes explaining a liveness verdict.
//! Every code maps to a category and a severity through static tables so
//! that results can be ordered without consulting any runtime state.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Reason-code category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCategory {
    Spoof,
    Challenge,
    Passive,
    Quality,
    System,
}

/// Severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

macro_rules! reason_codes {
    ($( $variant:ident => $code:literal, $category:ident, $severity:ident; )+) => {
        /// Machine-readable reason code
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ReasonCode {
            $( $variant, )+
        }

        impl ReasonCode {
            /// Every code, in declaration order
            pub const ALL: &'static [ReasonCode] = &[ $( ReasonCode::$variant, )+ ];

            /// Wire string, e.g. `CHALLENGE_BLINK_TOO_FAST`
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( ReasonCode::$variant => $code, )+
                }
            }

            pub const fn category(self) -> ReasonCategory {
                match self {
                    $( ReasonCode::$variant => ReasonCategory::$category, )+
                }
            }

            pub const fn severity(self) -> Severity {
                match self {
                    $( ReasonCode::$variant => Severity::$severity, )+
                }
            }
        }

        impl FromStr for ReasonCode {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $code => Ok(ReasonCode::$variant), )+
                    other => Err(format!("unknown reason code: {}", other)),
                }
            }
        }
    };
}

reason_codes! {
    // Quality
    InsufficientFrames => "QUALITY_INSUFFICIENT_FRAMES", Quality, High;
    InsufficientLandmarks => "QUALITY_INSUFFICIENT_LANDMARKS", Quality, Medium;
    FaceTooSmall => "QUALITY_FACE_TOO_SMALL", Quality, Low;
    PoorLighting => "QUALITY_POOR_LIGHTING", Quality, Low;

    // Challenge
    ChallengeNotPerformed => "CHALLENGE_NOT_PERFORMED", Challenge, High;
    ChallengeInsufficientData => "CHALLENGE_INSUFFICIENT_DATA", Challenge, Medium;
    BlinkNotDetected => "CHALLENGE_BLINK_NOT_DETECTED", Challenge, High;
    BlinkTooFast => "CHALLENGE_BLINK_TOO_FAST", Challenge, Medium;
    BlinkTooSlow => "CHALLENGE_BLINK_TOO_SLOW", Challenge, Medium;
    SmileNotDetected => "CHALLENGE_SMILE_NOT_DETECTED", Challenge, High;
    SmileTooShort => "CHALLENGE_SMILE_TOO_SHORT", Challenge, Medium;
    HeadTurnNotDetected => "CHALLENGE_HEAD_TURN_NOT_DETECTED", Challenge, High;
    HeadTurnExcessive => "CHALLENGE_HEAD_TURN_EXCESSIVE", Challenge, Medium;
    WrongDirection => "CHALLENGE_WRONG_DIRECTION", Challenge, High;
    HeadNodNotDetected => "CHALLENGE_HEAD_NOD_NOT_DETECTED", Challenge, High;
    EyebrowRaiseNotDetected => "CHALLENGE_EYEBROW_RAISE_NOT_DETECTED", Challenge, High;

    // Passive
    TextureAnomaly => "PASSIVE_TEXTURE_ANOMALY", Passive, Medium;
    DepthAnomaly => "PASSIVE_DEPTH_ANOMALY", Passive, Medium;
    NoMotion => "PASSIVE_NO_MOTION", Passive, Medium;
    UnnaturalMotion => "PASSIVE_UNNATURAL_MOTION", Passive, Medium;
    RegularMotion => "PASSIVE_REGULAR_MOTION", Passive, Low;
    ReflectionAnomaly => "PASSIVE_REFLECTION_ANOMALY", Passive, Low;
    MoireDetected => "PASSIVE_MOIRE_DETECTED", Passive, High;
    FrequencyAnomaly => "PASSIVE_FREQUENCY_ANOMALY", Passive, Low;

    // Spoof
    SpoofPhotoPrint => "SPOOF_PHOTO_PRINT", Spoof, High;
    SpoofScreenDisplay => "SPOOF_SCREEN_DISPLAY", Spoof, High;
    SpoofVideoReplay => "SPOOF_VIDEO_REPLAY", Spoof, High;
    SpoofMask2d => "SPOOF_MASK_2D", Spoof, High;
    SpoofMask3d => "SPOOF_MASK_3D", Spoof, High;
    SpoofDeepfake => "SPOOF_DEEPFAKE", Spoof, High;
    SpoofHighConfidence => "SPOOF_HIGH_CONFIDENCE", Spoof, Critical;

    // System
    SystemProcessingError => "SYSTEM_PROCESSING_ERROR", System, Critical;
    SystemModelError => "SYSTEM_MODEL_ERROR", System, Critical;
    SystemTimeout => "SYSTEM_TIMEOUT", System, Critical;
    SystemInvalidInput => "SYSTEM_INVALID_INPUT", System, Critical;
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReasonCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Rank used to break severity ties: spoof, challenge, passive, quality, system
fn category_rank(category: ReasonCategory) -> u8 {
    match category {
        ReasonCategory::Spoof => 0,
        ReasonCategory::Challenge => 1,
        ReasonCategory::Passive => 2,
        ReasonCategory::Quality => 3,
        ReasonCategory::System => 4,
    }
}

/// Deduplicate (keeping first occurrence) and order most severe first.
///
/// Ties on severity fall back to category, then to input order.
pub fn order_reason_codes<I>(codes: I) -> Vec<ReasonCode>
where
    I: IntoIterator<Item = ReasonCode>,
{
    let mut ordered: Vec<ReasonCode> = Vec::new();
    for code in codes {
        if !ordered.contains(&code) {
            ordered.push(code);
        }
    }
    // sort_by_key is stable
    ordered.sort_by_key(|c| (c.severity(), category_rank(c.category())));
    ordered
}

/// Codes as wire strings, sorted lexicographically and deduplicated
pub fn canonical_code_strings(codes: &[ReasonCode]) -> Vec<&'static str> {
    let mut strings: Vec<&'static str> = codes.iter().map(|c| c.as_str()).collect();
    strings.sort_unstable();
    strings.dedup();
    strings
}

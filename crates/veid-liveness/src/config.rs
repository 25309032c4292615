use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::liveness::ChallengeType;

const WEIGHT_TOLERANCE: f64 = 0.001;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level liveness configuration. Immutable once a detector is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Fewer frames than this short-circuits to "uncertain"
    pub min_frames_required: usize,
    /// Frames beyond this are dropped
    pub max_frames: usize,
    /// Used to synthesize landmark timestamps when none are supplied
    pub target_fps: f64,
    pub required_challenges: Vec<ChallengeType>,
    pub optional_challenges: Vec<ChallengeType>,
    pub challenge: ChallengeConfig,
    pub passive: PassiveConfig,
    pub spoof: SpoofConfig,
    pub decision: DecisionConfig,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            min_frames_required: 10,
            max_frames: 300,
            target_fps: 30.0,
            required_challenges: vec![ChallengeType::Blink],
            optional_challenges: Vec::new(),
            challenge: ChallengeConfig::default(),
            passive: PassiveConfig::default(),
            spoof: SpoofConfig::default(),
            decision: DecisionConfig::default(),
        }
    }
}

/// Gesture thresholds and durations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    pub min_sequence_frames: usize,
    /// Frames used for the yaw/pitch/eyebrow baseline
    pub baseline_frames: usize,
    pub blink_ear_threshold: f64,
    pub blink_min_frames: usize,
    pub blink_min_duration_ms: f64,
    pub blink_max_duration_ms: f64,
    pub smile_ratio_threshold: f64,
    pub smile_min_duration_ms: f64,
    /// Degrees
    pub head_turn_angle_threshold: f64,
    pub head_turn_max_angle: f64,
    pub head_turn_min_duration_ms: f64,
    pub nod_angle_threshold: f64,
    pub nod_min_duration_ms: f64,
    /// Relative increase over baseline
    pub eyebrow_raise_threshold: f64,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            min_sequence_frames: 10,
            baseline_frames: 5,
            blink_ear_threshold: 0.21,
            blink_min_frames: 2,
            blink_min_duration_ms: 50.0,
            blink_max_duration_ms: 500.0,
            smile_ratio_threshold: 3.0,
            smile_min_duration_ms: 300.0,
            head_turn_angle_threshold: 15.0,
            head_turn_max_angle: 45.0,
            head_turn_min_duration_ms: 200.0,
            nod_angle_threshold: 10.0,
            nod_min_duration_ms: 150.0,
            eyebrow_raise_threshold: 0.15,
        }
    }
}

/// Weights of the passive cues (moire enters as `1 - moire`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassiveWeights {
    pub texture: f64,
    pub depth: f64,
    pub motion: f64,
    pub reflection: f64,
    pub moire: f64,
}

impl PassiveWeights {
    pub fn sum(&self) -> f64 {
        self.texture + self.depth + self.motion + self.reflection + self.moire
    }

    fn as_array(&self) -> [f64; 5] {
        [self.texture, self.depth, self.motion, self.reflection, self.moire]
    }
}

impl Default for PassiveWeights {
    fn default() -> Self {
        Self {
            texture: 0.25,
            depth: 0.20,
            motion: 0.25,
            reflection: 0.15,
            moire: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassiveConfig {
    /// Side of the square FFT patch
    pub fft_window: usize,
    /// Crops below this side length get neutral texture/depth/reflection
    pub min_crop_size: usize,

    pub texture_variance_norm: f64,
    pub texture_uniformity_threshold: f64,
    pub texture_uniformity_penalty: f64,
    pub texture_threshold: f64,

    pub depth_gradient_norm: f64,
    pub depth_flatness_threshold: f64,
    pub depth_flatness_penalty: f64,
    pub depth_threshold: f64,

    /// Mean absolute inter-frame difference (gray levels)
    pub min_motion_threshold: f64,
    pub max_motion_threshold: f64,
    pub low_motion_score: f64,
    pub unnatural_motion_score: f64,
    pub motion_cv_threshold: f64,
    pub regular_motion_cap: f64,

    pub reflection_min_brightness: f64,
    pub reflection_low: f64,
    pub reflection_high: f64,

    /// Cycles/pixel
    pub moire_band_low: f64,
    pub moire_band_high: f64,
    pub moire_ratio_ceiling: f64,
    pub moire_threshold: f64,

    pub frequency_low_radius: f64,
    pub frequency_high_radius: f64,
    pub frequency_low_anomaly: f64,
    pub frequency_high_anomaly: f64,

    /// Acceptable mean crop luma
    pub lighting_min: f64,
    pub lighting_max: f64,

    pub weights: PassiveWeights,
}

impl Default for PassiveConfig {
    fn default() -> Self {
        Self {
            fft_window: 64,
            min_crop_size: 8,
            texture_variance_norm: 5000.0,
            texture_uniformity_threshold: 0.15,
            texture_uniformity_penalty: 0.5,
            texture_threshold: 0.3,
            depth_gradient_norm: 400.0,
            depth_flatness_threshold: 0.05,
            depth_flatness_penalty: 0.3,
            depth_threshold: 0.3,
            min_motion_threshold: 0.5,
            max_motion_threshold: 30.0,
            low_motion_score: 0.1,
            unnatural_motion_score: 0.3,
            motion_cv_threshold: 0.1,
            regular_motion_cap: 0.5,
            reflection_min_brightness: 180.0,
            reflection_low: 0.005,
            reflection_high: 0.05,
            moire_band_low: 0.25,
            moire_band_high: 0.45,
            moire_ratio_ceiling: 0.5,
            moire_threshold: 0.5,
            frequency_low_radius: 0.1,
            frequency_high_radius: 0.3,
            frequency_low_anomaly: 0.02,
            frequency_high_anomaly: 0.4,
            lighting_min: 40.0,
            lighting_max: 220.0,
            weights: PassiveWeights::default(),
        }
    }
}

/// Attack-score thresholds and normalisers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoofConfig {
    pub spoof_threshold: f64,
    pub high_confidence_threshold: f64,
    pub fft_window: usize,
    pub print_laplacian_norm: f64,
    pub natural_saturation: f64,
    pub edge_sharpness_norm: f64,
    pub screen_peak_radius: f64,
    pub screen_peak_ratio_norm: f64,
    pub banding_norm: f64,
    pub replay_diff_variance_norm: f64,
    pub blockiness_norm: f64,
    pub mask_edge_norm: f64,
    pub mask_texture_norm: f64,
    pub depth_cv_norm: f64,
    pub color_variance_norm: f64,
    pub micro_expression_norm: f64,
    pub micro_expression_min_frames: usize,
    pub deepfake_blend_norm: f64,
    pub deepfake_jitter_norm: f64,
    pub deepfake_min_frames: usize,
}

impl Default for SpoofConfig {
    fn default() -> Self {
        Self {
            spoof_threshold: 0.5,
            high_confidence_threshold: 0.8,
            fft_window: 64,
            print_laplacian_norm: 500.0,
            natural_saturation: 0.25,
            edge_sharpness_norm: 20.0,
            screen_peak_radius: 0.15,
            screen_peak_ratio_norm: 0.2,
            banding_norm: 0.3,
            replay_diff_variance_norm: 4.0,
            blockiness_norm: 1.0,
            mask_edge_norm: 2.0,
            mask_texture_norm: 8.0,
            depth_cv_norm: 1.0,
            color_variance_norm: 400.0,
            micro_expression_norm: 0.02,
            micro_expression_min_frames: 10,
            deepfake_blend_norm: 1.5,
            deepfake_jitter_norm: 2.0,
            deepfake_min_frames: 5,
        }
    }
}

/// Combination weights, thresholds, penalties and bonuses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub active_weight: f64,
    pub passive_weight: f64,
    pub spoof_weight: f64,
    pub pass_threshold: f64,
    pub high_confidence_threshold: f64,
    pub low_confidence_threshold: f64,
    pub single_failure_penalty: f64,
    pub multiple_failure_penalty: f64,
    pub spoof_penalty: f64,
    pub all_challenges_bonus: f64,
    pub motion_bonus: f64,
    pub motion_bonus_threshold: f64,
    /// Spoof confidence above which the verdict is "spoof" outright
    pub spoof_override_confidence: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            active_weight: 0.35,
            passive_weight: 0.35,
            spoof_weight: 0.30,
            pass_threshold: 0.75,
            high_confidence_threshold: 0.90,
            low_confidence_threshold: 0.50,
            single_failure_penalty: 0.15,
            multiple_failure_penalty: 0.30,
            spoof_penalty: 0.25,
            all_challenges_bonus: 0.05,
            motion_bonus: 0.05,
            motion_bonus_threshold: 0.7,
            spoof_override_confidence: 0.8,
        }
    }
}

impl LivenessConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LivenessConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration with environment variable overrides
    /// Environment variables are prefixed with VEID_LIVENESS_
    /// Example: VEID_LIVENESS_PASS_THRESHOLD=0.8
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub(crate) fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        use std::env;

        fn parse<T: std::str::FromStr>(name: &str, val: &str) -> Result<T, ConfigError> {
            val.trim()
                .parse()
                .map_err(|_| ConfigError::Validation(format!("Invalid {}", name)))
        }

        if let Ok(val) = env::var("VEID_LIVENESS_MIN_FRAMES_REQUIRED") {
            self.min_frames_required = parse("VEID_LIVENESS_MIN_FRAMES_REQUIRED", &val)?;
        }
        if let Ok(val) = env::var("VEID_LIVENESS_MAX_FRAMES") {
            self.max_frames = parse("VEID_LIVENESS_MAX_FRAMES", &val)?;
        }
        if let Ok(val) = env::var("VEID_LIVENESS_TARGET_FPS") {
            self.target_fps = parse("VEID_LIVENESS_TARGET_FPS", &val)?;
        }
        if let Ok(val) = env::var("VEID_LIVENESS_REQUIRED_CHALLENGES") {
            self.required_challenges = parse_challenge_list("VEID_LIVENESS_REQUIRED_CHALLENGES", &val)?;
        }
        if let Ok(val) = env::var("VEID_LIVENESS_OPTIONAL_CHALLENGES") {
            self.optional_challenges = parse_challenge_list("VEID_LIVENESS_OPTIONAL_CHALLENGES", &val)?;
        }
        if let Ok(val) = env::var("VEID_LIVENESS_PASS_THRESHOLD") {
            self.decision.pass_threshold = parse("VEID_LIVENESS_PASS_THRESHOLD", &val)?;
        }
        if let Ok(val) = env::var("VEID_LIVENESS_SPOOF_THRESHOLD") {
            self.spoof.spoof_threshold = parse("VEID_LIVENESS_SPOOF_THRESHOLD", &val)?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_frames_required < 1 {
            return Err(ConfigError::Validation(
                "min_frames_required must be >= 1".to_string(),
            ));
        }
        if self.max_frames < self.min_frames_required {
            return Err(ConfigError::Validation(
                "max_frames must be >= min_frames_required".to_string(),
            ));
        }
        if !(self.target_fps > 0.0 && self.target_fps.is_finite()) {
            return Err(ConfigError::Validation(
                "target_fps must be positive".to_string(),
            ));
        }

        // Challenge validation
        let c = &self.challenge;
        if c.min_sequence_frames < 1 || c.baseline_frames < 1 || c.blink_min_frames < 1 {
            return Err(ConfigError::Validation(
                "challenge frame counts must be >= 1".to_string(),
            ));
        }
        if !(c.blink_min_duration_ms >= 0.0 && c.blink_min_duration_ms <= c.blink_max_duration_ms) {
            return Err(ConfigError::Validation(
                "challenge.blink_min_duration_ms must be in [0, blink_max_duration_ms]".to_string(),
            ));
        }
        if !(c.head_turn_angle_threshold > 0.0 && c.head_turn_angle_threshold < c.head_turn_max_angle) {
            return Err(ConfigError::Validation(
                "challenge.head_turn_angle_threshold must be in (0, head_turn_max_angle)".to_string(),
            ));
        }
        for (name, value) in [
            ("blink_ear_threshold", c.blink_ear_threshold),
            ("smile_ratio_threshold", c.smile_ratio_threshold),
            ("nod_angle_threshold", c.nod_angle_threshold),
            ("eyebrow_raise_threshold", c.eyebrow_raise_threshold),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::Validation(format!(
                    "challenge.{} must be positive",
                    name
                )));
            }
        }

        // Passive validation
        let p = &self.passive;
        if p.weights.as_array().iter().any(|w| !(*w >= 0.0)) {
            return Err(ConfigError::Validation(
                "passive.weights must be non-negative".to_string(),
            ));
        }
        if (p.weights.sum() - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::Validation(format!(
                "passive.weights must sum to 1.0 (got {:.4})",
                p.weights.sum()
            )));
        }
        if p.fft_window < 8 {
            return Err(ConfigError::Validation(
                "passive.fft_window must be >= 8".to_string(),
            ));
        }
        if !(p.moire_band_low >= 0.0 && p.moire_band_low < p.moire_band_high) {
            return Err(ConfigError::Validation(
                "passive.moire_band_low must be in [0, moire_band_high)".to_string(),
            ));
        }
        if !(p.min_motion_threshold >= 0.0 && p.min_motion_threshold < p.max_motion_threshold) {
            return Err(ConfigError::Validation(
                "passive.min_motion_threshold must be in [0, max_motion_threshold)".to_string(),
            ));
        }
        if !(p.reflection_low <= p.reflection_high && p.frequency_low_anomaly <= p.frequency_high_anomaly) {
            return Err(ConfigError::Validation(
                "passive anomaly bands must have low <= high".to_string(),
            ));
        }

        // Spoof validation
        let s = &self.spoof;
        if !(0.0..=1.0).contains(&s.spoof_threshold) {
            return Err(ConfigError::Validation(
                "spoof.spoof_threshold must be in [0, 1]".to_string(),
            ));
        }
        if !(s.high_confidence_threshold >= s.spoof_threshold && s.high_confidence_threshold <= 1.0) {
            return Err(ConfigError::Validation(
                "spoof.high_confidence_threshold must be in [spoof_threshold, 1]".to_string(),
            ));
        }
        if s.fft_window < 8 {
            return Err(ConfigError::Validation(
                "spoof.fft_window must be >= 8".to_string(),
            ));
        }

        // Decision validation
        let d = &self.decision;
        let weights = [d.active_weight, d.passive_weight, d.spoof_weight];
        if weights.iter().any(|w| !(*w >= 0.0)) {
            return Err(ConfigError::Validation(
                "decision weights must be non-negative".to_string(),
            ));
        }
        let weight_sum: f64 = weights.iter().sum();
        if (weight_sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::Validation(format!(
                "decision weights must sum to 1.0 (got {:.4})",
                weight_sum
            )));
        }
        if !(0.0..=1.0).contains(&d.pass_threshold) {
            return Err(ConfigError::Validation(
                "decision.pass_threshold must be in [0, 1]".to_string(),
            ));
        }
        if !(d.low_confidence_threshold <= d.pass_threshold
            && d.pass_threshold <= d.high_confidence_threshold
            && d.high_confidence_threshold <= 1.0)
        {
            return Err(ConfigError::Validation(
                "decision thresholds must satisfy low <= pass <= high <= 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Canonical byte encoding of every setting, in declaration order.
    ///
    /// Floats are written as the little-endian `i64` of `round(v * 1e6)`,
    /// counts as little-endian `u64`. Challenge names follow, each terminated by
    /// a zero byte, with `0xFF` between the required and optional lists.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut w = CanonicalWriter::default();

        w.count(self.min_frames_required);
        w.count(self.max_frames);
        w.float(self.target_fps);

        let c = &self.challenge;
        w.count(c.min_sequence_frames);
        w.count(c.baseline_frames);
        w.float(c.blink_ear_threshold);
        w.count(c.blink_min_frames);
        w.float(c.blink_min_duration_ms);
        w.float(c.blink_max_duration_ms);
        w.float(c.smile_ratio_threshold);
        w.float(c.smile_min_duration_ms);
        w.float(c.head_turn_angle_threshold);
        w.float(c.head_turn_max_angle);
        w.float(c.head_turn_min_duration_ms);
        w.float(c.nod_angle_threshold);
        w.float(c.nod_min_duration_ms);
        w.float(c.eyebrow_raise_threshold);

        let p = &self.passive;
        w.count(p.fft_window);
        w.count(p.min_crop_size);
        for v in [
            p.texture_variance_norm,
            p.texture_uniformity_threshold,
            p.texture_uniformity_penalty,
            p.texture_threshold,
            p.depth_gradient_norm,
            p.depth_flatness_threshold,
            p.depth_flatness_penalty,
            p.depth_threshold,
            p.min_motion_threshold,
            p.max_motion_threshold,
            p.low_motion_score,
            p.unnatural_motion_score,
            p.motion_cv_threshold,
            p.regular_motion_cap,
            p.reflection_min_brightness,
            p.reflection_low,
            p.reflection_high,
            p.moire_band_low,
            p.moire_band_high,
            p.moire_ratio_ceiling,
            p.moire_threshold,
            p.frequency_low_radius,
            p.frequency_high_radius,
            p.frequency_low_anomaly,
            p.frequency_high_anomaly,
            p.lighting_min,
            p.lighting_max,
        ] {
            w.float(v);
        }
        for v in p.weights.as_array() {
            w.float(v);
        }

        let s = &self.spoof;
        w.float(s.spoof_threshold);
        w.float(s.high_confidence_threshold);
        w.count(s.fft_window);
        for v in [
            s.print_laplacian_norm,
            s.natural_saturation,
            s.edge_sharpness_norm,
            s.screen_peak_radius,
            s.screen_peak_ratio_norm,
            s.banding_norm,
            s.replay_diff_variance_norm,
            s.blockiness_norm,
            s.mask_edge_norm,
            s.mask_texture_norm,
            s.depth_cv_norm,
            s.color_variance_norm,
            s.micro_expression_norm,
        ] {
            w.float(v);
        }
        w.count(s.micro_expression_min_frames);
        w.float(s.deepfake_blend_norm);
        w.float(s.deepfake_jitter_norm);
        w.count(s.deepfake_min_frames);

        let d = &self.decision;
        for v in [
            d.active_weight,
            d.passive_weight,
            d.spoof_weight,
            d.pass_threshold,
            d.high_confidence_threshold,
            d.low_confidence_threshold,
            d.single_failure_penalty,
            d.multiple_failure_penalty,
            d.spoof_penalty,
            d.all_challenges_bonus,
            d.motion_bonus,
            d.motion_bonus_threshold,
            d.spoof_override_confidence,
        ] {
            w.float(v);
        }

        for challenge in &self.required_challenges {
            w.name(challenge.as_str());
        }
        w.bytes.push(0xFF);
        for challenge in &self.optional_challenges {
            w.name(challenge.as_str());
        }

        w.bytes
    }

    /// Export configuration to TOML string
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self
            .to_toml_string()
            .map_err(|e| ConfigError::Validation(format!("TOML serialization error: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}

fn parse_challenge_list(name: &str, val: &str) -> Result<Vec<ChallengeType>, ConfigError> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<ChallengeType>()
                .map_err(|_| ConfigError::Validation(format!("Invalid {}: {}", name, s)))
        })
        .collect()
}

/// Fixed-point encoder for configuration hashing
#[derive(Default)]
struct CanonicalWriter {
    bytes: Vec<u8>,
}

impl CanonicalWriter {
    fn float(&mut self, v: f64) {
        self.bytes.extend_from_slice(&f64_to_canonical(v).to_le_bytes());
    }

    fn count(&mut self, v: usize) {
        self.bytes.extend_from_slice(&(v as u64).to_le_bytes());
    }

    fn name(&mut self, s: &str) {
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);
    }
}

/// Convert f64 to a platform-independent fixed-point representation
fn f64_to_canonical(val: f64) -> i64 {
    const SCALE: f64 = 1_000_000.0;

    if val.is_nan() {
        return i64::MAX;
    }
    if val == f64::INFINITY {
        return i64::MAX - 1;
    }
    if val == f64::NEG_INFINITY {
        return i64::MIN;
    }

    // Clamp so that the scaled value fits in i64
    let clamped = val.clamp(-9.0e12, 9.0e12);
    (clamped * SCALE).round() as i64
}

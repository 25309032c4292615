//! Passive Liveness Analysis
//!
//! Scores raw frames without user cooperation:
//! - Texture (LBP code spread and histogram uniformity)
//! - Depth (gradient relief and intensity flatness)
//! - Motion (inter-frame difference energy and regularity)
//! - Specular reflection (bright-pixel fraction)
//! - Moire (band-limited spectral energy of a screen grid)
//! - Frequency balance (high vs. low spectral energy)
//!
//! Each cue is scored per frame over the face crop and averaged in frame
//! order. Degenerate crops take a neutral score instead of failing.

use serde::Serialize;
use std::collections::BTreeMap;

use veid_signals::dsp::stats::{self, percentile_u8, unit};
use veid_signals::{
    intensity_variation, local_binary_pattern, FaceRegion, Frame, GradientField, GrayImage,
    SpectrumAnalyzer,
};

use super::frame_pipeline::{map_with_scratch, FaceCrops};
use super::temporal_consistency::TemporalProfile;
use crate::config::PassiveConfig;
use crate::error::LivenessError;
use crate::reason_codes::ReasonCode;

const NEUTRAL_SCORE: f64 = 0.5;

/// Passive analysis result. Holds scores only, never pixel data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassiveAnalysisResult {
    pub texture_score: f64,
    pub depth_score: f64,
    pub motion_score: f64,
    pub reflection_score: f64,
    /// Higher means more screen-like
    pub moire_score: f64,
    pub frequency_score: f64,
    pub combined_score: f64,
    pub is_live: bool,
    pub reason_codes: Vec<ReasonCode>,
    pub details: BTreeMap<String, f64>,
}

/// Per-frame cue values. `None` marks a crop the cue could not use.
#[derive(Debug, Clone, Default)]
struct FrameCues {
    texture: Option<f64>,
    lbp_variance: Option<f64>,
    lbp_uniformity: Option<f64>,
    depth: Option<f64>,
    gradient_variance: Option<f64>,
    reflection: Option<f64>,
    reflection_fraction: Option<f64>,
    reflection_in_band: Option<bool>,
    moire: Option<f64>,
    moire_ratio: Option<f64>,
    frequency: Option<f64>,
    frequency_ratio: Option<f64>,
    frequency_in_band: Option<bool>,
    too_small: bool,
    brightness: f64,
}

/// Reusable per-worker buffers
struct PassiveScratch {
    gradients: GradientField,
    histogram: [u32; 256],
    spectrum: SpectrumAnalyzer,
}

impl PassiveScratch {
    fn new(fft_window: usize) -> Self {
        Self {
            gradients: GradientField::new(),
            histogram: [0; 256],
            spectrum: SpectrumAnalyzer::new(fft_window),
        }
    }
}

/// Mean of the available values, `neutral` when none are
fn mean_or(values: impl Iterator<Item = Option<f64>>, neutral: f64) -> f64 {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        neutral
    } else {
        stats::mean(&present)
    }
}

/// More than half of the measured frames fell outside their band
fn mostly_out_of_band(values: impl Iterator<Item = Option<bool>>) -> bool {
    let (mut measured, mut outside) = (0usize, 0usize);
    for in_band in values.flatten() {
        measured += 1;
        if !in_band {
            outside += 1;
        }
    }
    measured > 0 && 2 * outside > measured
}

/// Passive Analyzer
pub struct PassiveAnalyzer {
    config: PassiveConfig,
}

impl PassiveAnalyzer {
    pub fn new() -> Self {
        Self::with_config(PassiveConfig::default())
    }

    pub fn with_config(config: PassiveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PassiveConfig {
        &self.config
    }

    /// Analyze a frame sequence.
    ///
    /// `face_regions` pair with frames by position; frames without a usable
    /// region are analyzed whole. Only an empty frame list is an error.
    pub fn analyze(
        &self,
        frames: &[Frame],
        face_regions: Option<&[FaceRegion]>,
    ) -> Result<PassiveAnalysisResult, LivenessError> {
        self.analyze_crops(&FaceCrops::extract(frames, face_regions))
    }

    /// Analyze crops already extracted for this capture
    pub(crate) fn analyze_crops(&self, crops: &FaceCrops) -> Result<PassiveAnalysisResult, LivenessError> {
        if crops.is_empty() {
            return Err(LivenessError::EmptyInput);
        }

        let fft_window = self.config.fft_window;
        let cues: Vec<FrameCues> = map_with_scratch(
            &crops.gray,
            || PassiveScratch::new(fft_window),
            |scratch, _, gray| self.frame_cues(gray, scratch),
        );

        Ok(self.aggregate(&crops.gray, &cues))
    }

    fn frame_cues(&self, gray: &GrayImage, scratch: &mut PassiveScratch) -> FrameCues {
        let cfg = &self.config;
        let (brightness, _) = gray.mean_std();
        let mut cues = FrameCues {
            brightness,
            ..Default::default()
        };

        if gray.min_dim() >= cfg.min_crop_size {
            // Texture
            let lbp = local_binary_pattern(gray, &mut scratch.histogram);
            let mut texture = unit(lbp.variance / cfg.texture_variance_norm);
            if lbp.uniformity > cfg.texture_uniformity_threshold {
                texture *= cfg.texture_uniformity_penalty;
            }
            cues.texture = Some(unit(texture));
            cues.lbp_variance = Some(lbp.variance);
            cues.lbp_uniformity = Some(lbp.uniformity);

            // Depth
            scratch.gradients.compute(gray);
            let gradient_variance = scratch.gradients.stats().magnitude_variance;
            let mut depth = unit(gradient_variance / cfg.depth_gradient_norm);
            if intensity_variation(gray) < cfg.depth_flatness_threshold {
                depth -= cfg.depth_flatness_penalty;
            }
            cues.depth = Some(unit(depth));
            cues.gradient_variance = Some(gradient_variance);

            // Reflection
            let p99 = percentile_u8(&gray.data, 99.0) as f64;
            let cutoff = p99.max(cfg.reflection_min_brightness);
            let bright = gray.data.iter().filter(|&&v| v as f64 >= cutoff).count();
            let fraction = bright as f64 / gray.len() as f64;
            let (score, in_band) = if fraction < cfg.reflection_low {
                (0.5, false)
            } else if fraction > cfg.reflection_high {
                (0.2, false)
            } else {
                (0.9, true)
            };
            cues.reflection = Some(score);
            cues.reflection_fraction = Some(fraction);
            cues.reflection_in_band = Some(in_band);
        }

        if scratch.spectrum.compute(gray) {
            let moire_ratio = scratch
                .spectrum
                .band_energy_ratio(cfg.moire_band_low, cfg.moire_band_high);
            cues.moire = Some(unit(moire_ratio / cfg.moire_ratio_ceiling));
            cues.moire_ratio = Some(moire_ratio);

            let ratio = scratch
                .spectrum
                .high_low_ratio(cfg.frequency_low_radius, cfg.frequency_high_radius);
            let in_band = ratio >= cfg.frequency_low_anomaly && ratio <= cfg.frequency_high_anomaly;
            cues.frequency = Some(if in_band { 0.8 } else { 0.3 });
            cues.frequency_ratio = Some(ratio);
            cues.frequency_in_band = Some(in_band);
        } else {
            cues.too_small = true;
        }

        cues
    }

    fn aggregate(&self, crops: &[GrayImage], cues: &[FrameCues]) -> PassiveAnalysisResult {
        let cfg = &self.config;
        let mut reason_codes = Vec::new();
        let mut details = BTreeMap::new();

        let texture_score = mean_or(cues.iter().map(|c| c.texture), NEUTRAL_SCORE);
        let depth_score = mean_or(cues.iter().map(|c| c.depth), NEUTRAL_SCORE);
        let reflection_score = mean_or(cues.iter().map(|c| c.reflection), NEUTRAL_SCORE);
        let moire_score = mean_or(cues.iter().map(|c| c.moire), 0.0);
        let frequency_score = mean_or(cues.iter().map(|c| c.frequency), NEUTRAL_SCORE);

        if texture_score < cfg.texture_threshold {
            reason_codes.push(ReasonCode::TextureAnomaly);
        }
        if depth_score < cfg.depth_threshold {
            reason_codes.push(ReasonCode::DepthAnomaly);
        }

        let profile = TemporalProfile::from_crops(crops);
        let motion_score = self.score_motion(&profile, &mut reason_codes);

        if mostly_out_of_band(cues.iter().map(|c| c.reflection_in_band)) {
            reason_codes.push(ReasonCode::ReflectionAnomaly);
        }
        if moire_score >= cfg.moire_threshold {
            reason_codes.push(ReasonCode::MoireDetected);
        }
        if mostly_out_of_band(cues.iter().map(|c| c.frequency_in_band)) {
            reason_codes.push(ReasonCode::FrequencyAnomaly);
        }

        let small_frames = cues.iter().filter(|c| c.too_small).count();
        if small_frames > 0 {
            log::warn!(
                "{} of {} crops smaller than the {}px spectral window",
                small_frames,
                cues.len(),
                cfg.fft_window
            );
            reason_codes.push(ReasonCode::FaceTooSmall);
        }

        let brightness: Vec<f64> = cues.iter().map(|c| c.brightness).collect();
        let mean_brightness = stats::mean(&brightness);
        if mean_brightness < cfg.lighting_min || mean_brightness > cfg.lighting_max {
            reason_codes.push(ReasonCode::PoorLighting);
        }

        let w = &cfg.weights;
        let combined_score = unit(
            w.texture * texture_score
                + w.depth * depth_score
                + w.motion * motion_score
                + w.reflection * reflection_score
                + w.moire * (1.0 - moire_score),
        );
        let is_live = combined_score >= 0.5 && moire_score < cfg.moire_threshold;

        details.insert("frames".to_string(), cues.len() as f64);
        details.insert(
            "lbp_variance".to_string(),
            mean_or(cues.iter().map(|c| c.lbp_variance), 0.0),
        );
        details.insert(
            "lbp_uniformity".to_string(),
            mean_or(cues.iter().map(|c| c.lbp_uniformity), 0.0),
        );
        details.insert(
            "gradient_variance".to_string(),
            mean_or(cues.iter().map(|c| c.gradient_variance), 0.0),
        );
        details.insert(
            "reflection_fraction".to_string(),
            mean_or(cues.iter().map(|c| c.reflection_fraction), 0.0),
        );
        details.insert(
            "moire_ratio".to_string(),
            mean_or(cues.iter().map(|c| c.moire_ratio), 0.0),
        );
        details.insert(
            "frequency_ratio".to_string(),
            mean_or(cues.iter().map(|c| c.frequency_ratio), 0.0),
        );
        details.insert("avg_motion".to_string(), profile.mean_diff);
        details.insert("motion_cv".to_string(), profile.diff_cv);
        details.insert("mean_brightness".to_string(), mean_brightness);
        details.insert("small_crops".to_string(), small_frames as f64);

        log::debug!(
            "Passive: texture={:.3} depth={:.3} motion={:.3} reflection={:.3} moire={:.3} frequency={:.3} combined={:.3}",
            texture_score,
            depth_score,
            motion_score,
            reflection_score,
            moire_score,
            frequency_score,
            combined_score
        );

        PassiveAnalysisResult {
            texture_score,
            depth_score,
            motion_score,
            reflection_score,
            moire_score,
            frequency_score,
            combined_score,
            is_live,
            reason_codes,
            details,
        }
    }

    fn score_motion(&self, profile: &TemporalProfile, codes: &mut Vec<ReasonCode>) -> f64 {
        let cfg = &self.config;

        if !profile.has_motion() || profile.mean_diff < cfg.min_motion_threshold {
            codes.push(ReasonCode::NoMotion);
            return cfg.low_motion_score;
        }
        if profile.mean_diff > cfg.max_motion_threshold {
            codes.push(ReasonCode::UnnaturalMotion);
            return cfg.unnatural_motion_score;
        }

        let score = 0.7 + 0.3 * profile.diff_cv.min(1.0);
        if profile.diff_cv < cfg.motion_cv_threshold {
            codes.push(ReasonCode::RegularMotion);
            return score.min(cfg.regular_motion_cap);
        }
        score
    }
}

impl Default for PassiveAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

//! Presentation Attack Classification
//!
//! Scores six attack types independently from the same frames. The overall
//! spoof score is the largest of the six, and its label names the attack when
//! the score crosses the configured threshold.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use veid_signals::dsp::stats::{self, unit};
use veid_signals::{
    block_boundary_ratio, laplacian_variance, mean_block_std, FaceRegion, Frame, GradientField,
    GrayImage, Rect, SpectrumAnalyzer,
};

use super::frame_pipeline::{map_with_scratch, FaceCrops};
use super::temporal_consistency::{second_difference_jitter, TemporalProfile};
use crate::config::SpoofConfig;
use crate::error::LivenessError;
use crate::reason_codes::ReasonCode;
use crate::shared::face_metrics::{average_ear, eyebrow_distance, mouth_smile_ratio};
use crate::shared::LandmarkData;

/// Crops below this side length contribute nothing
const MIN_CROP_SIZE: usize = 8;
const BLOCK_SIZE: usize = 8;
const BORDER_RING: usize = 2;
const BLEND_INNER_RADIUS: f64 = 0.6;
const BLEND_OUTER_RADIUS: f64 = 0.9;
const MIN_REPLAY_FRAMES: usize = 3;

/// Presentation attack type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpoofType {
    PhotoPrint,
    ScreenDisplay,
    VideoReplay,
    #[serde(rename = "mask_2d")]
    Mask2d,
    #[serde(rename = "mask_3d")]
    Mask3d,
    Deepfake,
}

impl SpoofType {
    /// Every type, in tie-break order for the arg-max
    pub const ALL: [SpoofType; 6] = [
        SpoofType::PhotoPrint,
        SpoofType::ScreenDisplay,
        SpoofType::VideoReplay,
        SpoofType::Mask2d,
        SpoofType::Mask3d,
        SpoofType::Deepfake,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SpoofType::PhotoPrint => "photo_print",
            SpoofType::ScreenDisplay => "screen_display",
            SpoofType::VideoReplay => "video_replay",
            SpoofType::Mask2d => "mask_2d",
            SpoofType::Mask3d => "mask_3d",
            SpoofType::Deepfake => "deepfake",
        }
    }

    pub const fn reason_code(self) -> ReasonCode {
        match self {
            SpoofType::PhotoPrint => ReasonCode::SpoofPhotoPrint,
            SpoofType::ScreenDisplay => ReasonCode::SpoofScreenDisplay,
            SpoofType::VideoReplay => ReasonCode::SpoofVideoReplay,
            SpoofType::Mask2d => ReasonCode::SpoofMask2d,
            SpoofType::Mask3d => ReasonCode::SpoofMask3d,
            SpoofType::Deepfake => ReasonCode::SpoofDeepfake,
        }
    }
}

impl fmt::Display for SpoofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spoof detection result. Holds scores only, never pixel data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpoofDetectionResult {
    pub is_spoof: bool,
    /// Arg-max attack, present only when `is_spoof`
    pub spoof_type: Option<SpoofType>,
    pub overall_spoof_score: f64,
    pub confidence: f64,
    pub photo_print_score: f64,
    pub screen_display_score: f64,
    pub video_replay_score: f64,
    pub mask_2d_score: f64,
    pub mask_3d_score: f64,
    pub deepfake_score: f64,
    pub reason_codes: Vec<ReasonCode>,
    pub details: BTreeMap<String, f64>,
}

impl SpoofDetectionResult {
    /// Score for one attack type
    pub fn score(&self, spoof_type: SpoofType) -> f64 {
        match spoof_type {
            SpoofType::PhotoPrint => self.photo_print_score,
            SpoofType::ScreenDisplay => self.screen_display_score,
            SpoofType::VideoReplay => self.video_replay_score,
            SpoofType::Mask2d => self.mask_2d_score,
            SpoofType::Mask3d => self.mask_3d_score,
            SpoofType::Deepfake => self.deepfake_score,
        }
    }
}

/// Per-frame spoof signals, each in [0, 1] with higher meaning more spoof-like
#[derive(Debug, Clone, Copy, Default)]
struct FrameSignals {
    print_texture: f64,
    desaturation: f64,
    edge_softness: f64,
    screen_peak: f64,
    banding: f64,
    blockiness: f64,
    mask_edge: f64,
    mask_texture: f64,
    depth_uniformity: f64,
    material_uniformity: f64,
    blend_boundary: f64,
}

impl FrameSignals {
    const COUNT: usize = 11;
    const NAMES: [&'static str; Self::COUNT] = [
        "print_texture",
        "desaturation",
        "edge_softness",
        "screen_peak",
        "banding",
        "blockiness",
        "mask_edge",
        "mask_texture",
        "depth_uniformity",
        "material_uniformity",
        "blend_boundary",
    ];

    fn as_array(&self) -> [f64; Self::COUNT] {
        [
            self.print_texture,
            self.desaturation,
            self.edge_softness,
            self.screen_peak,
            self.banding,
            self.blockiness,
            self.mask_edge,
            self.mask_texture,
            self.depth_uniformity,
            self.material_uniformity,
            self.blend_boundary,
        ]
    }

    fn from_array(v: [f64; Self::COUNT]) -> Self {
        Self {
            print_texture: v[0],
            desaturation: v[1],
            edge_softness: v[2],
            screen_peak: v[3],
            banding: v[4],
            blockiness: v[5],
            mask_edge: v[6],
            mask_texture: v[7],
            depth_uniformity: v[8],
            material_uniformity: v[9],
            blend_boundary: v[10],
        }
    }

    /// Element-wise mean in frame order; zero when no frame was usable
    fn mean(frames: &[Option<FrameSignals>]) -> (Self, usize) {
        let mut sums = [0.0f64; Self::COUNT];
        let mut count = 0usize;
        for signals in frames.iter().flatten() {
            for (sum, v) in sums.iter_mut().zip(signals.as_array()) {
                *sum += v;
            }
            count += 1;
        }
        if count == 0 {
            return (Self::default(), 0);
        }
        for sum in sums.iter_mut() {
            *sum /= count as f64;
        }
        (Self::from_array(sums), count)
    }
}

/// Reusable per-worker buffers
struct SpoofScratch {
    gradients: GradientField,
    spectrum: SpectrumAnalyzer,
}

/// Spoof Detector
pub struct SpoofDetector {
    config: SpoofConfig,
}

impl SpoofDetector {
    pub fn new() -> Self {
        Self::with_config(SpoofConfig::default())
    }

    pub fn with_config(config: SpoofConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SpoofConfig {
        &self.config
    }

    /// Score every attack type over a frame sequence.
    ///
    /// Landmarks, when given, feed the micro-expression cue of the 3-D mask
    /// score. Only an empty frame list is an error.
    pub fn analyze(
        &self,
        frames: &[Frame],
        face_regions: Option<&[FaceRegion]>,
        landmarks: Option<&[LandmarkData]>,
    ) -> Result<SpoofDetectionResult, LivenessError> {
        self.analyze_crops(frames, &FaceCrops::extract(frames, face_regions), landmarks)
    }

    /// Score crops already extracted from `frames`. Colour cues still read
    /// the RGB frames through the same rectangles.
    pub(crate) fn analyze_crops(
        &self,
        frames: &[Frame],
        crops: &FaceCrops,
        landmarks: Option<&[LandmarkData]>,
    ) -> Result<SpoofDetectionResult, LivenessError> {
        if frames.is_empty() {
            return Err(LivenessError::EmptyInput);
        }
        debug_assert_eq!(frames.len(), crops.len());

        let cfg = &self.config;
        let fft_window = cfg.fft_window;

        let signals: Vec<Option<FrameSignals>> = map_with_scratch(
            frames,
            || SpoofScratch {
                gradients: GradientField::new(),
                spectrum: SpectrumAnalyzer::new(fft_window),
            },
            |scratch, i, frame| self.frame_signals(frame, crops.rects[i], &crops.gray[i], scratch),
        );
        let crops: &[GrayImage] = &crops.gray;

        let (mean, usable) = FrameSignals::mean(&signals);
        if usable < frames.len() {
            log::warn!(
                "{} of {} crops too small for spoof analysis",
                frames.len() - usable,
                frames.len()
            );
        }

        let mut details = BTreeMap::new();
        for (name, value) in FrameSignals::NAMES.iter().zip(mean.as_array()) {
            details.insert(name.to_string(), value);
        }

        // Temporal cues
        let profile = TemporalProfile::from_crops(crops);
        let temporal_consistency = if frames.len() >= MIN_REPLAY_FRAMES {
            unit(1.0 - profile.diff_variance / cfg.replay_diff_variance_norm)
        } else {
            0.0
        };

        let luma: Vec<f64> = crops.iter().map(|c| c.mean_std().0).collect();
        let temporal_jitter = if frames.len() >= cfg.deepfake_min_frames {
            unit(second_difference_jitter(&luma) / cfg.deepfake_jitter_norm)
        } else {
            0.0
        };

        let micro_expression = landmarks
            .filter(|seq| seq.len() >= cfg.micro_expression_min_frames)
            .map(|seq| self.micro_expression_stillness(seq))
            .unwrap_or(0.0);

        details.insert("temporal_consistency".to_string(), temporal_consistency);
        details.insert("temporal_jitter".to_string(), temporal_jitter);
        details.insert("micro_expression".to_string(), micro_expression);
        details.insert("diff_variance".to_string(), profile.diff_variance);
        details.insert("loop_correlation".to_string(), profile.loop_correlation);
        details.insert(
            "loop_detected".to_string(),
            if profile.looped() { 1.0 } else { 0.0 },
        );
        details.insert("usable_frames".to_string(), usable as f64);

        let photo_print_score =
            unit(0.4 * mean.print_texture + 0.3 * mean.desaturation + 0.3 * mean.edge_softness);
        let screen_display_score = unit(0.5 * mean.screen_peak + 0.5 * mean.banding);
        let video_replay_score = unit(0.5 * temporal_consistency + 0.5 * mean.blockiness);
        let mask_2d_score = unit(0.5 * mean.mask_edge + 0.5 * mean.mask_texture);
        let mask_3d_score = unit(
            0.35 * mean.depth_uniformity + 0.35 * mean.material_uniformity + 0.30 * micro_expression,
        );
        let deepfake_score = unit(0.5 * mean.blend_boundary + 0.5 * temporal_jitter);

        let scores = [
            photo_print_score,
            screen_display_score,
            video_replay_score,
            mask_2d_score,
            mask_3d_score,
            deepfake_score,
        ];

        let (top, overall_spoof_score) = scores
            .iter()
            .enumerate()
            .fold((0usize, scores[0]), |best, (i, &s)| if s > best.1 { (i, s) } else { best });
        let is_spoof = overall_spoof_score >= cfg.spoof_threshold;
        let spoof_type = is_spoof.then(|| SpoofType::ALL[top]);

        let mut reason_codes: Vec<ReasonCode> = SpoofType::ALL
            .iter()
            .zip(scores)
            .filter(|&(_, s)| s >= cfg.spoof_threshold)
            .map(|(t, _)| t.reason_code())
            .collect();
        if overall_spoof_score >= cfg.high_confidence_threshold {
            reason_codes.push(ReasonCode::SpoofHighConfidence);
        }

        let confidence = if is_spoof {
            overall_spoof_score
        } else {
            1.0 - overall_spoof_score
        };

        log::debug!(
            "Spoof: photo={:.3} screen={:.3} replay={:.3} mask2d={:.3} mask3d={:.3} deepfake={:.3} overall={:.3}",
            photo_print_score,
            screen_display_score,
            video_replay_score,
            mask_2d_score,
            mask_3d_score,
            deepfake_score,
            overall_spoof_score
        );

        Ok(SpoofDetectionResult {
            is_spoof,
            spoof_type,
            overall_spoof_score,
            confidence,
            photo_print_score,
            screen_display_score,
            video_replay_score,
            mask_2d_score,
            mask_3d_score,
            deepfake_score,
            reason_codes,
            details,
        })
    }

    fn frame_signals(
        &self,
        frame: &Frame,
        rect: Option<Rect>,
        gray: &GrayImage,
        scratch: &mut SpoofScratch,
    ) -> Option<FrameSignals> {
        if gray.min_dim() < MIN_CROP_SIZE {
            return None;
        }
        let cfg = &self.config;
        let color = frame.color_stats(rect);

        scratch.gradients.compute(gray);
        let gradient = scratch.gradients.stats();

        let screen_peak = if scratch.spectrum.compute(gray) {
            unit(scratch.spectrum.peak_ratio(cfg.screen_peak_radius) / cfg.screen_peak_ratio_norm)
        } else {
            0.0
        };

        Some(FrameSignals {
            print_texture: unit(1.0 - laplacian_variance(gray) / cfg.print_laplacian_norm),
            desaturation: unit(1.0 - color.mean_saturation / cfg.natural_saturation),
            edge_softness: unit(1.0 - gradient.mean_magnitude / cfg.edge_sharpness_norm),
            screen_peak,
            banding: unit(1.0 - color.unique_color_ratio / cfg.banding_norm),
            blockiness: unit((block_boundary_ratio(gray, BLOCK_SIZE) - 1.0) / cfg.blockiness_norm),
            mask_edge: unit((scratch.gradients.border_ratio(BORDER_RING) - 1.0) / cfg.mask_edge_norm),
            mask_texture: unit(1.0 - mean_block_std(gray, BLOCK_SIZE) / cfg.mask_texture_norm),
            depth_uniformity: unit(1.0 - gradient.magnitude_cv / cfg.depth_cv_norm),
            material_uniformity: unit(1.0 - color.mean_channel_variance / cfg.color_variance_norm),
            blend_boundary: unit(
                (scratch.gradients.radial_ratio(BLEND_INNER_RADIUS, BLEND_OUTER_RADIUS) - 1.0)
                    / cfg.deepfake_blend_norm,
            ),
        })
    }

    /// `1 - mean CV(EAR, smile ratio, eyebrow distance) / norm`. A rigid mask
    /// keeps every facial ratio still.
    fn micro_expression_stillness(&self, landmarks: &[LandmarkData]) -> f64 {
        let ear: Vec<f64> = landmarks.iter().map(average_ear).collect();
        let smile: Vec<f64> = landmarks.iter().map(mouth_smile_ratio).collect();
        let brow: Vec<f64> = landmarks.iter().filter_map(eyebrow_distance).collect();

        let mut cvs = vec![
            stats::coefficient_of_variation(&ear),
            stats::coefficient_of_variation(&smile),
        ];
        if brow.len() >= 2 {
            cvs.push(stats::coefficient_of_variation(&brow));
        }

        unit(1.0 - stats::mean(&cvs) / self.config.micro_expression_norm)
    }
}

impl Default for SpoofDetector {
    fn default() -> Self {
        Self::new()
    }
}

//! Temporal Consistency Analysis
//!
//! Frame-to-frame statistics over a sequence of grayscale crops:
//! - Inter-frame difference series (motion energy)
//! - Dispersion of that series (regular vs. natural motion)
//! - Lagged autocorrelation (periodic artifacts such as video loops)

use veid_signals::dsp::stats;
use veid_signals::GrayImage;

/// Smallest lag considered when looking for loops
const MIN_LOOP_LAG: usize = 2;

/// Correlation above which the difference series is considered periodic
pub const LOOP_CORRELATION_THRESHOLD: f64 = 0.8;

/// Summary of inter-frame change across a sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemporalProfile {
    /// Mean absolute difference between consecutive crops
    pub frame_diffs: Vec<f64>,
    pub mean_diff: f64,
    pub diff_variance: f64,
    /// `std / mean` of the differences (0 when there is no motion)
    pub diff_cv: f64,
    /// Largest normalised autocorrelation of the difference series
    pub loop_correlation: f64,
}

impl TemporalProfile {
    /// Build the profile from crops in frame order. Fewer than two crops give
    /// an empty profile.
    pub fn from_crops(crops: &[GrayImage]) -> Self {
        if crops.len() < 2 {
            return Self::default();
        }

        let frame_diffs: Vec<f64> = crops.windows(2).map(|w| w[0].mean_abs_diff(&w[1])).collect();

        Self {
            mean_diff: stats::mean(&frame_diffs),
            diff_variance: stats::variance(&frame_diffs),
            diff_cv: stats::coefficient_of_variation(&frame_diffs),
            loop_correlation: loop_correlation(&frame_diffs),
            frame_diffs,
        }
    }

    pub fn has_motion(&self) -> bool {
        !self.frame_diffs.is_empty()
    }

    /// Difference series repeats with a fixed period
    pub fn looped(&self) -> bool {
        self.loop_correlation > LOOP_CORRELATION_THRESHOLD
    }
}

/// Largest normalised autocorrelation over lags `2..=n/2`.
///
/// Returns 0 for a series too short to hold two periods or with no variance.
pub fn loop_correlation(series: &[f64]) -> f64 {
    let n = series.len();
    if n < 2 * MIN_LOOP_LAG + 1 {
        return 0.0;
    }

    let mean = stats::mean(series);
    let variance = stats::variance(series);
    if variance < 1e-12 {
        return 0.0;
    }

    let mut max_corr = 0.0f64;
    for lag in MIN_LOOP_LAG..=n / 2 {
        let mut corr = 0.0;
        for i in 0..n - lag {
            corr += (series[i] - mean) * (series[i + lag] - mean);
        }
        corr /= (n - lag) as f64 * variance;
        max_corr = max_corr.max(corr);
    }

    max_corr.clamp(0.0, 1.0)
}

/// Mean absolute second difference `|x[i+1] - 2 x[i] + x[i-1]|`
pub fn second_difference_jitter(series: &[f64]) -> f64 {
    if series.len() < 3 {
        return 0.0;
    }
    let total: f64 = series
        .windows(3)
        .map(|w| (w[2] - 2.0 * w[1] + w[0]).abs())
        .sum();
    total / (series.len() - 2) as f64
}

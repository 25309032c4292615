//! 2-D Power Spectrum
//!
//! Computes the power spectrum of a centred square patch of a grayscale crop.
//! The patch is mean-removed and Hann-windowed, then transformed row by row
//! and column by column with a 1-D FFT.
//!
//! # Determinism
//!
//! The FFT is planned with `FftPlannerScalar`, which never selects an AVX,
//! SSE or NEON kernel. The butterfly order is therefore the same on every
//! target and the spectrum is bit-identical across hosts.

use std::f64::consts::PI;
use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlannerScalar};

use crate::vision::GrayImage;

/// Reusable 2-D spectrum analyzer for a fixed window size.
///
/// All buffers are allocated once in `new` and reused by every `compute`.
pub struct SpectrumAnalyzer {
    size: usize,
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    /// Per-bin radial frequency in cycles/pixel
    radius: Vec<f64>,
    buffer: Vec<Complex64>,
    column: Vec<Complex64>,
    scratch: Vec<Complex64>,
    power: Vec<f64>,
    valid: bool,
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("size", &self.size)
            .field("valid", &self.valid)
            .finish()
    }
}

impl SpectrumAnalyzer {
    /// Create an analyzer for `size x size` patches (`size` is raised to 2)
    pub fn new(size: usize) -> Self {
        let size = size.max(2);
        let mut planner = FftPlannerScalar::<f64>::new();
        let fft = planner.plan_fft_forward(size);
        let scratch_len = fft.get_inplace_scratch_len();

        let window = (0..size)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / (size - 1) as f64).cos())
            .collect();

        let freq = |k: usize| -> f64 {
            let signed = if k <= size / 2 { k as f64 } else { k as f64 - size as f64 };
            signed / size as f64
        };
        let mut radius = Vec::with_capacity(size * size);
        for v in 0..size {
            for u in 0..size {
                let (fu, fv) = (freq(u), freq(v));
                radius.push((fu * fu + fv * fv).sqrt());
            }
        }

        Self {
            size,
            fft,
            window,
            radius,
            buffer: vec![Complex64::new(0.0, 0.0); size * size],
            column: vec![Complex64::new(0.0, 0.0); size],
            scratch: vec![Complex64::new(0.0, 0.0); scratch_len],
            power: vec![0.0; size * size],
            valid: false,
        }
    }

    /// Window size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the last `compute` produced a spectrum
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Compute the spectrum of the centred patch of `gray`.
    ///
    /// Returns `false` (and invalidates the analyzer) when the crop is smaller
    /// than the window in either dimension.
    pub fn compute(&mut self, gray: &GrayImage) -> bool {
        let n = self.size;
        if gray.width < n || gray.height < n {
            self.valid = false;
            return false;
        }

        let x0 = (gray.width - n) / 2;
        let y0 = (gray.height - n) / 2;

        let mut sum = 0.0f64;
        for y in 0..n {
            for x in 0..n {
                sum += gray.get(x0 + x, y0 + y) as f64;
            }
        }
        let mean = sum / (n * n) as f64;

        for y in 0..n {
            for x in 0..n {
                let v = (gray.get(x0 + x, y0 + y) as f64 - mean) * self.window[x] * self.window[y];
                self.buffer[y * n + x] = Complex64::new(v, 0.0);
            }
        }

        // Rows: the buffer is a contiguous run of `n` rows of length `n`
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        // Columns
        for x in 0..n {
            for y in 0..n {
                self.column[y] = self.buffer[y * n + x];
            }
            self.fft.process_with_scratch(&mut self.column, &mut self.scratch);
            for y in 0..n {
                self.buffer[y * n + x] = self.column[y];
            }
        }

        for (p, c) in self.power.iter_mut().zip(&self.buffer) {
            *p = c.norm_sqr();
        }
        self.power[0] = 0.0;

        self.valid = true;
        true
    }

    /// Total power excluding DC
    pub fn total_power(&self) -> f64 {
        if !self.valid {
            return 0.0;
        }
        self.power.iter().sum()
    }

    /// Fraction of total power with radial frequency in `[low, high]`
    pub fn band_energy_ratio(&self, low: f64, high: f64) -> f64 {
        let total = self.total_power();
        if total <= 0.0 {
            return 0.0;
        }
        let band: f64 = self
            .power
            .iter()
            .zip(&self.radius)
            .filter(|&(_, &r)| r >= low && r <= high)
            .map(|(&p, _)| p)
            .sum();
        band / total
    }

    /// `high / (low + high)` where low is `0 < r < low_radius` and high is
    /// `r > high_radius`
    pub fn high_low_ratio(&self, low_radius: f64, high_radius: f64) -> f64 {
        if !self.valid {
            return 0.0;
        }
        let mut low = 0.0f64;
        let mut high = 0.0f64;
        for (&p, &r) in self.power.iter().zip(&self.radius) {
            if r > 0.0 && r < low_radius {
                low += p;
            } else if r > high_radius {
                high += p;
            }
        }
        if low + high <= 0.0 {
            return 0.0;
        }
        high / (low + high)
    }

    /// Largest power with `r > split` divided by largest power with
    /// `0 < r <= split`. A strong isolated off-centre peak (pixel grid) gives a
    /// high value.
    pub fn peak_ratio(&self, split: f64) -> f64 {
        if !self.valid {
            return 0.0;
        }
        let mut low_peak = 0.0f64;
        let mut high_peak = 0.0f64;
        for (&p, &r) in self.power.iter().zip(&self.radius) {
            if r > split {
                high_peak = high_peak.max(p);
            } else if r > 0.0 {
                low_peak = low_peak.max(p);
            }
        }
        if high_peak <= 0.0 {
            return 0.0;
        }
        if low_peak <= 0.0 {
            return f64::INFINITY;
        }
        high_peak / low_peak
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stripes(size: usize, period: usize) -> GrayImage {
        GrayImage::from_fn(size, size, |x, _| if (x / (period / 2)) % 2 == 0 { 200 } else { 40 })
    }

    #[test]
    fn test_flat_patch_has_no_power() {
        let gray = GrayImage::from_fn(64, 64, |_, _| 120);
        let mut analyzer = SpectrumAnalyzer::new(32);
        assert!(analyzer.compute(&gray));
        assert_relative_eq!(analyzer.total_power(), 0.0);
        assert_relative_eq!(analyzer.band_energy_ratio(0.25, 0.45), 0.0);
        assert_relative_eq!(analyzer.peak_ratio(0.15), 0.0);
    }

    #[test]
    fn test_small_crop_rejected() {
        let gray = GrayImage::from_fn(16, 16, |_, _| 0);
        let mut analyzer = SpectrumAnalyzer::new(32);
        assert!(!analyzer.compute(&gray));
        assert!(!analyzer.is_valid());
        assert_relative_eq!(analyzer.high_low_ratio(0.1, 0.3), 0.0);
    }

    #[test]
    fn test_fine_stripes_land_in_moire_band() {
        // Period 3 pixels is about 0.33 cycles/pixel
        let gray = GrayImage::from_fn(64, 64, |x, _| if x % 3 == 0 { 220 } else { 30 });
        let mut analyzer = SpectrumAnalyzer::new(64);
        assert!(analyzer.compute(&gray));
        assert!(analyzer.band_energy_ratio(0.25, 0.45) > 0.5);
        assert!(analyzer.high_low_ratio(0.1, 0.3) > 0.5);
    }

    #[test]
    fn test_coarse_stripes_are_low_frequency() {
        // Period 32 pixels is about 0.03 cycles/pixel
        let gray = stripes(64, 32);
        let mut analyzer = SpectrumAnalyzer::new(64);
        assert!(analyzer.compute(&gray));
        assert!(analyzer.band_energy_ratio(0.25, 0.45) < 0.1);
        assert!(analyzer.high_low_ratio(0.1, 0.3) < 0.2);
    }

    #[test]
    fn test_compute_is_repeatable() {
        let gray = stripes(48, 6);
        let mut a = SpectrumAnalyzer::new(32);
        let mut b = SpectrumAnalyzer::new(32);
        a.compute(&gray);
        b.compute(&GrayImage::from_fn(48, 48, |_, _| 3));
        b.compute(&gray);
        assert_eq!(a.band_energy_ratio(0.2, 0.4).to_bits(), b.band_energy_ratio(0.2, 0.4).to_bits());
    }
}

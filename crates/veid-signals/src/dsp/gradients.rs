//! Finite-Difference Kernels
//!
//! Gradient magnitude fields, Laplacian response and 8x8 block statistics
//! over grayscale crops. These stand in for relief, print sharpness and
//! compression cues in the liveness analyzers.

use super::stats::unit;
use crate::vision::GrayImage;

const EPS: f64 = 1e-3;

/// Summary of a gradient magnitude field
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradientStats {
    pub mean_magnitude: f64,
    pub magnitude_variance: f64,
    /// `std / mean` of the magnitudes (0 for a flat field)
    pub magnitude_cv: f64,
}

/// Forward-difference gradient magnitudes, reusable across frames.
///
/// The field is `(w - 1) x (h - 1)`: sample (x, y) uses pixels (x+1, y) and
/// (x, y+1).
#[derive(Debug, Clone, Default)]
pub struct GradientField {
    pub width: usize,
    pub height: usize,
    pub magnitudes: Vec<f64>,
}

impl GradientField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the field for `gray`. Crops smaller than 2x2 give an empty field.
    pub fn compute(&mut self, gray: &GrayImage) {
        self.magnitudes.clear();
        if gray.width < 2 || gray.height < 2 {
            self.width = 0;
            self.height = 0;
            return;
        }

        self.width = gray.width - 1;
        self.height = gray.height - 1;
        self.magnitudes.reserve(self.width * self.height);

        for y in 0..self.height {
            for x in 0..self.width {
                let c = gray.get(x, y) as f64;
                let gx = gray.get(x + 1, y) as f64 - c;
                let gy = gray.get(x, y + 1) as f64 - c;
                self.magnitudes.push((gx * gx + gy * gy).sqrt());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    pub fn stats(&self) -> GradientStats {
        if self.magnitudes.is_empty() {
            return GradientStats::default();
        }
        let n = self.magnitudes.len() as f64;
        let mean = self.magnitudes.iter().sum::<f64>() / n;
        let variance = self
            .magnitudes
            .iter()
            .map(|&m| (m - mean) * (m - mean))
            .sum::<f64>()
            / n;
        let magnitude_cv = if mean > 1e-12 { variance.sqrt() / mean } else { 0.0 };

        GradientStats {
            mean_magnitude: mean,
            magnitude_variance: variance,
            magnitude_cv,
        }
    }

    /// Mean magnitude of the outer `ring`-pixel frame divided by the mean of the
    /// whole field. Returns 1.0 (no seam) when the field is too small or flat.
    pub fn border_ratio(&self, ring: usize) -> f64 {
        if self.width <= 2 * ring || self.height <= 2 * ring {
            return 1.0;
        }

        let mut border_sum = 0.0;
        let mut border_count = 0usize;
        let mut total_sum = 0.0;

        for y in 0..self.height {
            for x in 0..self.width {
                let m = self.magnitudes[y * self.width + x];
                total_sum += m;
                if x < ring || y < ring || x >= self.width - ring || y >= self.height - ring {
                    border_sum += m;
                    border_count += 1;
                }
            }
        }

        let total_mean = total_sum / self.magnitudes.len() as f64;
        let border_mean = border_sum / border_count as f64;
        (border_mean + EPS) / (total_mean + EPS)
    }

    /// Mean magnitude in the annulus `[inner, outer)` divided by the mean inside
    /// `inner`, radii as fractions of the half-size around the centre.
    pub fn radial_ratio(&self, inner: f64, outer: f64) -> f64 {
        if self.width < 4 || self.height < 4 {
            return 1.0;
        }

        let cx = (self.width as f64 - 1.0) / 2.0;
        let cy = (self.height as f64 - 1.0) / 2.0;
        let half = self.width.min(self.height) as f64 / 2.0;

        let (mut inner_sum, mut inner_count) = (0.0, 0usize);
        let (mut outer_sum, mut outer_count) = (0.0, 0usize);

        for y in 0..self.height {
            for x in 0..self.width {
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                let r = (dx * dx + dy * dy).sqrt() / half;
                let m = self.magnitudes[y * self.width + x];
                if r < inner {
                    inner_sum += m;
                    inner_count += 1;
                } else if r < outer {
                    outer_sum += m;
                    outer_count += 1;
                }
            }
        }

        if inner_count == 0 || outer_count == 0 {
            return 1.0;
        }
        let inner_mean = inner_sum / inner_count as f64;
        let outer_mean = outer_sum / outer_count as f64;
        (outer_mean + EPS) / (inner_mean + EPS)
    }
}

/// Gradient statistics of a crop (allocates a temporary field)
pub fn gradient_stats(gray: &GrayImage) -> GradientStats {
    let mut field = GradientField::new();
    field.compute(gray);
    field.stats()
}

/// Variance of the 4-neighbour Laplacian over interior pixels
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    if gray.width < 3 || gray.height < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0usize;

    for y in 1..gray.height - 1 {
        for x in 1..gray.width - 1 {
            let lap = 4.0 * gray.get(x, y) as f64
                - gray.get(x - 1, y) as f64
                - gray.get(x + 1, y) as f64
                - gray.get(x, y - 1) as f64
                - gray.get(x, y + 1) as f64;
            sum += lap;
            sum_sq += lap * lap;
            count += 1;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// Ratio of mean absolute step across `block` boundaries to the mean step
/// inside blocks, over both axes. 1.0 means no block structure.
pub fn block_boundary_ratio(gray: &GrayImage, block: usize) -> f64 {
    if block < 2 || gray.width <= block || gray.height < 2 {
        return 1.0;
    }

    let (mut boundary_sum, mut boundary_count) = (0.0f64, 0usize);
    let (mut interior_sum, mut interior_count) = (0.0f64, 0usize);

    for y in 0..gray.height {
        for x in 1..gray.width {
            let step = gray.get(x, y).abs_diff(gray.get(x - 1, y)) as f64;
            if x % block == 0 {
                boundary_sum += step;
                boundary_count += 1;
            } else {
                interior_sum += step;
                interior_count += 1;
            }
        }
    }
    for y in 1..gray.height {
        for x in 0..gray.width {
            let step = gray.get(x, y).abs_diff(gray.get(x, y - 1)) as f64;
            if y % block == 0 {
                boundary_sum += step;
                boundary_count += 1;
            } else {
                interior_sum += step;
                interior_count += 1;
            }
        }
    }

    if boundary_count == 0 || interior_count == 0 {
        return 1.0;
    }
    let boundary = boundary_sum / boundary_count as f64;
    let interior = interior_sum / interior_count as f64;
    (boundary + EPS) / (interior + EPS)
}

/// Mean standard deviation of non-overlapping `block x block` tiles.
/// Falls back to the whole-crop deviation when no full tile fits.
pub fn mean_block_std(gray: &GrayImage, block: usize) -> f64 {
    if block == 0 || gray.width < block || gray.height < block {
        return gray.mean_std().1;
    }

    let tiles_x = gray.width / block;
    let tiles_y = gray.height / block;
    let n = (block * block) as f64;
    let mut total = 0.0;

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let mut sum = 0.0f64;
            let mut sum_sq = 0.0f64;
            for y in ty * block..(ty + 1) * block {
                for x in tx * block..(tx + 1) * block {
                    let v = gray.get(x, y) as f64;
                    sum += v;
                    sum_sq += v * v;
                }
            }
            let mean = sum / n;
            total += (sum_sq / n - mean * mean).max(0.0).sqrt();
        }
    }

    total / (tiles_x * tiles_y) as f64
}

/// Normalised flatness of a crop: `std / mean` of intensity, in [0, 1]
pub fn intensity_variation(gray: &GrayImage) -> f64 {
    let (mean, std) = gray.mean_std();
    if mean < 1e-9 {
        return 0.0;
    }
    unit(std / mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn checkerboard(size: usize, cell: usize) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| if (x / cell + y / cell) % 2 == 0 { 200 } else { 50 })
    }

    #[test]
    fn test_flat_image_has_no_gradient() {
        let gray = GrayImage::from_fn(16, 16, |_, _| 128);
        let stats = gradient_stats(&gray);
        assert_relative_eq!(stats.mean_magnitude, 0.0);
        assert_relative_eq!(stats.magnitude_variance, 0.0);
        assert_relative_eq!(laplacian_variance(&gray), 0.0);
    }

    #[test]
    fn test_horizontal_ramp_gradient() {
        let gray = GrayImage::from_fn(10, 10, |x, _| (x * 10) as u8);
        let stats = gradient_stats(&gray);
        assert_relative_eq!(stats.mean_magnitude, 10.0);
        assert_relative_eq!(stats.magnitude_variance, 0.0);
    }

    #[test]
    fn test_checkerboard_has_laplacian_energy() {
        let gray = checkerboard(16, 1);
        assert!(laplacian_variance(&gray) > 1000.0);
    }

    #[test]
    fn test_block_boundary_ratio_detects_blocks() {
        let blocky = checkerboard(32, 8);
        assert!(block_boundary_ratio(&blocky, 8) > 10.0);

        let flat = GrayImage::from_fn(32, 32, |_, _| 90);
        assert_relative_eq!(block_boundary_ratio(&flat, 8), 1.0);
    }

    #[test]
    fn test_mean_block_std() {
        let flat_tiles = checkerboard(32, 8);
        assert_relative_eq!(mean_block_std(&flat_tiles, 8), 0.0);

        let fine = checkerboard(32, 1);
        assert_relative_eq!(mean_block_std(&fine, 8), 75.0);
    }

    #[test]
    fn test_border_ratio_detects_cutout_edge() {
        // Flat interior, sharp frame at the crop boundary
        let gray = GrayImage::from_fn(32, 32, |x, y| {
            if x < 2 || y < 2 || x >= 30 || y >= 30 { 0 } else { 150 }
        });
        let mut field = GradientField::new();
        field.compute(&gray);
        assert!(field.border_ratio(2) > 1.5);
    }

    #[test]
    fn test_radial_ratio_flat_is_neutral() {
        let gray = GrayImage::from_fn(32, 32, |_, _| 100);
        let mut field = GradientField::new();
        field.compute(&gray);
        assert_relative_eq!(field.radial_ratio(0.6, 0.9), 1.0);
    }
}

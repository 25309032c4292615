//! Local Binary Patterns
//!
//! Simplified 8-neighbour LBP: each interior pixel is encoded by comparing
//! its neighbours (clockwise from top-left) against the centre. Real skin
//! yields a wide spread of codes; printed or displayed faces tend to collapse
//! onto a few dominant patterns.

use crate::vision::GrayImage;

/// Neighbour offsets, clockwise from top-left. Bit `i` is set when
/// neighbour `i` is at least as bright as the centre.
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

/// Summary of the LBP code distribution
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LbpStats {
    /// Population variance of the codes (0..=255 values)
    pub variance: f64,
    /// Histogram uniformity `sum(p^2)`; 1.0 means a single code
    pub uniformity: f64,
    /// Number of interior pixels encoded
    pub samples: usize,
}

/// Compute LBP statistics into a caller-owned histogram.
///
/// `hist` is overwritten. Crops smaller than 3x3 have no interior and return
/// `LbpStats::default()`.
pub fn local_binary_pattern(gray: &GrayImage, hist: &mut [u32; 256]) -> LbpStats {
    hist.fill(0);
    if gray.width < 3 || gray.height < 3 {
        return LbpStats::default();
    }

    for y in 1..gray.height - 1 {
        for x in 1..gray.width - 1 {
            let center = gray.get(x, y);
            let mut code = 0u8;
            for (bit, &(dx, dy)) in NEIGHBOURS.iter().enumerate() {
                let nx = (x as isize + dx) as usize;
                let ny = (y as isize + dy) as usize;
                if gray.get(nx, ny) >= center {
                    code |= 1 << bit;
                }
            }
            hist[code as usize] += 1;
        }
    }

    histogram_stats(hist)
}

/// Variance and uniformity of a code histogram, summed in code order
fn histogram_stats(hist: &[u32; 256]) -> LbpStats {
    let samples: usize = hist.iter().map(|&c| c as usize).sum();
    if samples == 0 {
        return LbpStats::default();
    }

    let n = samples as f64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut uniformity = 0.0f64;

    for (code, &count) in hist.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let c = count as f64;
        let v = code as f64;
        sum += v * c;
        sum_sq += v * v * c;
        let p = c / n;
        uniformity += p * p;
    }

    let mean = sum / n;
    LbpStats {
        variance: (sum_sq / n - mean * mean).max(0.0),
        uniformity,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_image_single_code() {
        let gray = GrayImage::from_fn(10, 10, |_, _| 77);
        let mut hist = [0u32; 256];
        let stats = local_binary_pattern(&gray, &mut hist);

        // Every neighbour equals the centre, so every bit is set
        assert_eq!(hist[255], 64);
        assert_eq!(stats.samples, 64);
        assert_relative_eq!(stats.uniformity, 1.0);
        assert_relative_eq!(stats.variance, 0.0);
    }

    #[test]
    fn test_noise_spreads_codes() {
        // Deterministic pseudo-random texture
        let mut state = 12345u32;
        let gray = GrayImage::from_fn(32, 32, |_, _| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            (state >> 16) as u8
        });
        let mut hist = [0u32; 256];
        let stats = local_binary_pattern(&gray, &mut hist);

        assert!(stats.uniformity < 0.05);
        assert!(stats.variance > 1000.0);
    }

    #[test]
    fn test_too_small_crop() {
        let gray = GrayImage::from_fn(2, 2, |_, _| 1);
        let mut hist = [9u32; 256];
        let stats = local_binary_pattern(&gray, &mut hist);
        assert_eq!(stats, LbpStats::default());
        assert!(hist.iter().all(|&c| c == 0));
    }
}

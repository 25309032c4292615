//! Image Processing Operations
//!
//! Provides the pixel operations the liveness analyzers need:
//! - RGB8 frame container with bounds-checked access
//! - Grayscale crop extraction into a reusable buffer
//! - Single-pass colour statistics over a crop
//! - Mean absolute difference between crops

use super::face_roi::Rect;
use crate::error::SignalError;

/// Image wrapper that provides unified access to pixel data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw RGB8 pixel data (row-major)
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Timestamp in microseconds
    pub timestamp_us: i64,
}

impl Frame {
    /// Create a new frame from raw RGB8 data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_us: i64) -> Result<Self, SignalError> {
        if width == 0 || height == 0 {
            return Err(SignalError::EmptyFrame { width, height });
        }
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(SignalError::DataSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, width, height, timestamp_us })
    }

    /// Create a frame filled with a single colour
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self { data, width, height, timestamp_us: 0 }
    }

    /// Create a frame by evaluating `f(x, y)` for every pixel
    pub fn from_fn<F>(width: u32, height: u32, timestamp_us: i64, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 3],
    {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self { data, width, height, timestamp_us }
    }

    /// Get pixel at (x, y) as [R, G, B]
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0];
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Rectangle covering the whole frame
    pub fn full_rect(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Resolve an optional crop to a rectangle inside the frame.
    /// Falls back to the whole frame when the crop is absent or empty.
    pub fn resolve_rect(&self, rect: Option<Rect>) -> Rect {
        rect.and_then(|r| r.clamp_to(self.width, self.height))
            .unwrap_or_else(|| self.full_rect())
    }

    /// Write the BT.601 luma of `rect` into `out`, reusing its allocation
    pub fn grayscale_into(&self, rect: Option<Rect>, out: &mut GrayImage) {
        let rect = self.resolve_rect(rect);
        out.reset(rect.width as usize, rect.height as usize);

        let stride = self.width as usize * 3;
        for y in rect.y..rect.y + rect.height {
            let row = y as usize * stride;
            for x in rect.x..rect.x + rect.width {
                let idx = row + x as usize * 3;
                out.data.push(luma(self.data[idx], self.data[idx + 1], self.data[idx + 2]));
            }
        }
    }

    /// Convert a crop to grayscale
    pub fn to_grayscale(&self, rect: Option<Rect>) -> GrayImage {
        let mut gray = GrayImage::default();
        self.grayscale_into(rect, &mut gray);
        gray
    }

    /// Colour statistics over a crop
    pub fn color_stats(&self, rect: Option<Rect>) -> ColorStats {
        let rect = self.resolve_rect(rect);
        let count = rect.area();
        if count == 0 {
            return ColorStats::default();
        }

        let mut sum = [0.0f64; 3];
        let mut sum_sq = [0.0f64; 3];
        let mut saturation_sum = 0.0f64;
        // 15-bit colour cube (5 bits per channel) as a bitset
        let mut seen = vec![0u64; 512];
        let mut unique = 0usize;

        let stride = self.width as usize * 3;
        for y in rect.y..rect.y + rect.height {
            let row = y as usize * stride;
            for x in rect.x..rect.x + rect.width {
                let idx = row + x as usize * 3;
                let px = [self.data[idx], self.data[idx + 1], self.data[idx + 2]];

                for c in 0..3 {
                    let v = px[c] as f64;
                    sum[c] += v;
                    sum_sq[c] += v * v;
                }

                let max = px[0].max(px[1]).max(px[2]);
                let min = px[0].min(px[1]).min(px[2]);
                if max > 0 {
                    saturation_sum += (max - min) as f64 / max as f64;
                }

                let key = ((px[0] as usize >> 3) << 10) | ((px[1] as usize >> 3) << 5) | (px[2] as usize >> 3);
                let (word, bit) = (key / 64, key % 64);
                if seen[word] & (1 << bit) == 0 {
                    seen[word] |= 1 << bit;
                    unique += 1;
                }
            }
        }

        let n = count as f64;
        let mut variance_sum = 0.0;
        let mut mean_rgb = [0.0; 3];
        for c in 0..3 {
            let mean = sum[c] / n;
            mean_rgb[c] = mean;
            variance_sum += (sum_sq[c] / n - mean * mean).max(0.0);
        }

        ColorStats {
            mean_rgb,
            mean_saturation: saturation_sum / n,
            mean_channel_variance: variance_sum / 3.0,
            unique_color_ratio: unique as f64 / n,
        }
    }
}

/// ITU-R BT.601 luma, rounded to nearest u8 so that gray pixels map to themselves
#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8
}

/// Colour statistics of a crop
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorStats {
    /// Mean R, G, B (0-255)
    pub mean_rgb: [f64; 3],
    /// Mean HSV saturation (0-1)
    pub mean_saturation: f64,
    /// Mean of the three per-channel variances
    pub mean_channel_variance: f64,
    /// Distinct 15-bit quantized colours divided by pixel count
    pub unique_color_ratio: f64,
}

/// Grayscale buffer, row-major u8 luma
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, SignalError> {
        if data.len() != width * height {
            return Err(SignalError::DataSizeMismatch {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> u8,
    {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Clear and resize for reuse without releasing capacity
    pub fn reset(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.reserve(width * height);
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Smaller of width and height
    pub fn min_dim(&self) -> usize {
        self.width.min(self.height)
    }

    /// Mean and population standard deviation of intensity
    pub fn mean_std(&self) -> (f64, f64) {
        if self.data.is_empty() {
            return (0.0, 0.0);
        }
        let n = self.data.len() as f64;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for &v in &self.data {
            let v = v as f64;
            sum += v;
            sum_sq += v * v;
        }
        let mean = sum / n;
        (mean, (sum_sq / n - mean * mean).max(0.0).sqrt())
    }

    /// Mean absolute intensity difference over the common top-left extent
    pub fn mean_abs_diff(&self, other: &GrayImage) -> f64 {
        let w = self.width.min(other.width);
        let h = self.height.min(other.height);
        if w == 0 || h == 0 {
            return 0.0;
        }

        let mut total = 0u64;
        for y in 0..h {
            let a = &self.data[y * self.width..y * self.width + w];
            let b = &other.data[y * other.width..y * other.width + w];
            for (&pa, &pb) in a.iter().zip(b) {
                total += pa.abs_diff(pb) as u64;
            }
        }
        total as f64 / (w * h) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_creation() {
        let frame = Frame::filled(100, 100, [0, 0, 0]);
        assert_eq!(frame.width, 100);
        assert_eq!(frame.height, 100);
        assert_eq!(frame.data.len(), 100 * 100 * 3);
    }

    #[test]
    fn test_frame_size_mismatch() {
        let err = Frame::new(vec![0u8; 10], 2, 2, 0).unwrap_err();
        assert_eq!(err, SignalError::DataSizeMismatch { expected: 12, actual: 10 });
        assert!(Frame::new(Vec::new(), 0, 4, 0).is_err());
    }

    #[test]
    fn test_grayscale() {
        let data = vec![255, 255, 255, 0, 0, 0]; // White + Black pixels
        let frame = Frame::new(data, 2, 1, 0).unwrap();
        let gray = frame.to_grayscale(None);
        assert_eq!(gray.data[0], 255);
        assert_eq!(gray.data[1], 0);
    }

    #[test]
    fn test_grayscale_crop() {
        let frame = Frame::from_fn(10, 10, 0, |x, y| if x >= 5 && y >= 5 { [200, 200, 200] } else { [0, 0, 0] });
        let gray = frame.to_grayscale(Some(Rect::new(5, 5, 5, 5)));
        assert_eq!(gray.width, 5);
        assert_eq!(gray.height, 5);
        assert!(gray.data.iter().all(|&v| v == 200));
    }

    #[test]
    fn test_color_stats_gray_frame() {
        let frame = Frame::filled(8, 8, [120, 120, 120]);
        let stats = frame.color_stats(None);
        assert_relative_eq!(stats.mean_saturation, 0.0);
        assert_relative_eq!(stats.mean_channel_variance, 0.0);
        assert_relative_eq!(stats.unique_color_ratio, 1.0 / 64.0);
    }

    #[test]
    fn test_color_stats_saturated() {
        let frame = Frame::filled(4, 4, [255, 0, 0]);
        let stats = frame.color_stats(None);
        assert_relative_eq!(stats.mean_saturation, 1.0);
        assert_relative_eq!(stats.mean_rgb[0], 255.0);
    }

    #[test]
    fn test_mean_abs_diff() {
        let a = GrayImage::from_fn(4, 4, |_, _| 10);
        let b = GrayImage::from_fn(6, 6, |_, _| 14);
        assert_relative_eq!(a.mean_abs_diff(&b), 4.0);
        assert_relative_eq!(a.mean_abs_diff(&a), 0.0);
    }

    #[test]
    fn test_mean_std() {
        let gray = GrayImage::new(2, 1, vec![0, 100]).unwrap();
        let (mean, std) = gray.mean_std();
        assert_relative_eq!(mean, 50.0);
        assert_relative_eq!(std, 50.0);
    }
}

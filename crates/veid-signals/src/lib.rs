//! # veid-signals
//!
//! Pixel-level signal kernels used by the VEID liveness pipeline.
//!
//! This crate provides:
//! - **Vision primitives**: RGB8 `Frame`, grayscale crops, face-region clamping
//! - **DSP kernels**: gradients, Laplacian, local binary patterns, block statistics
//! - **Spectral analysis**: 2-D power spectrum with reusable scratch buffers
//!
//! Every kernel is a pure function of its input. Accumulation happens in
//! index order in `f64`, and the FFT is planned through the scalar planner so
//! that results do not depend on the SIMD features of the host CPU.
//!
//! ## Example
//!
//! ```ignore
//! use veid_signals::{Frame, GrayImage, SpectrumAnalyzer};
//!
//! let frame = Frame::new(rgb_bytes, 128, 128, 0)?;
//! let mut gray = GrayImage::default();
//! frame.grayscale_into(None, &mut gray);
//!
//! let mut spectrum = SpectrumAnalyzer::new(64);
//! if spectrum.compute(&gray) {
//!     println!("band ratio: {:.3}", spectrum.band_energy_ratio(0.25, 0.45));
//! }
//! ```

pub mod dsp;
mod error;
pub mod vision;

pub use dsp::{
    block_boundary_ratio, gradient_stats, intensity_variation, laplacian_variance,
    local_binary_pattern, mean_block_std, GradientField, GradientStats, LbpStats,
    SpectrumAnalyzer,
};
pub use error::SignalError;
pub use vision::{ColorStats, FaceRegion, Frame, GrayImage, Rect};

//! DSP kernels over grayscale crops
//!
//! - `stats`: order-stable descriptive statistics
//! - `gradients`: finite differences, Laplacian and block statistics
//! - `texture`: 8-neighbour local binary patterns
//! - `spectrum`: 2-D power spectrum with reusable buffers

pub mod gradients;
pub mod spectrum;
pub mod stats;
pub mod texture;

pub use gradients::{
    block_boundary_ratio, gradient_stats, intensity_variation, laplacian_variance, mean_block_std,
    GradientField, GradientStats,
};
pub use spectrum::SpectrumAnalyzer;
pub use texture::{local_binary_pattern, LbpStats};

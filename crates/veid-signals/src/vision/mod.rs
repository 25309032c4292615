//! Vision module: frames, grayscale crops and face regions
//!
//! This module provides:
//! - `Frame` struct holding immutable RGB8 pixel data
//! - `GrayImage` scratch buffer for BT.601 luma crops
//! - `FaceRegion` bounding boxes injected by an external face tracker
//! - `ColorStats` single-pass colour statistics over a crop
//!
//! # Design
//!
//! Face detection happens outside this crate. Callers inject bounding boxes
//! from whatever tracker they run (MediaPipe, dlib, a server-side detector)
//! and this module only clamps and crops.

mod face_roi;
mod image_ops;

pub use face_roi::{FaceRegion, Rect};
pub use image_ops::{ColorStats, Frame, GrayImage};

//! Frame Pipeline
//!
//! Per-frame fan-out shared by the passive and spoof analyzers. With the
//! `parallel` feature, frames are processed on the rayon pool with one
//! scratch arena per worker; without it, a single arena is reused in a plain
//! loop. Either way the output vector is in frame order, so any reduction
//! the caller performs over it sees the same operands in the same order.
//!
//! Grayscale face crops are extracted once per capture in [`FaceCrops`] and
//! read by both analyzers.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use veid_signals::{FaceRegion, Frame, GrayImage, Rect};

/// Map `f` over `items` in order, handing it a per-worker scratch value
/// created by `init`.
#[cfg(feature = "parallel")]
pub(crate) fn map_with_scratch<T, S, R, I, F>(items: &[T], init: I, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    I: Fn() -> S + Sync + Send,
    F: Fn(&mut S, usize, &T) -> R + Sync + Send,
{
    items
        .par_iter()
        .enumerate()
        .map_init(init, |scratch, (i, item)| f(scratch, i, item))
        .collect()
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn map_with_scratch<T, S, R, I, F>(items: &[T], init: I, f: F) -> Vec<R>
where
    I: Fn() -> S,
    F: Fn(&mut S, usize, &T) -> R,
{
    let mut scratch = init();
    items
        .iter()
        .enumerate()
        .map(|(i, item)| f(&mut scratch, i, item))
        .collect()
}

/// Run two closures, potentially in parallel
#[cfg(feature = "parallel")]
pub(crate) fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    rayon::join(a, b)
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA,
    B: FnOnce() -> RB,
{
    (a(), b())
}

/// Crop rectangle for every frame.
///
/// Regions pair with frames by position. A missing region, or one with no
/// overlap with its frame, means the whole frame.
pub(crate) fn resolve_regions(frames: &[Frame], regions: Option<&[FaceRegion]>) -> Vec<Option<Rect>> {
    if let Some(regions) = regions {
        if regions.len() != frames.len() {
            log::warn!(
                "Face region count {} does not match frame count {}",
                regions.len(),
                frames.len()
            );
        }
    }

    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            regions
                .and_then(|r| r.get(i))
                .and_then(|region| region.to_rect(frame.width, frame.height))
        })
        .collect()
}

/// Per-frame crop rectangles and their luma crops, in frame order
pub(crate) struct FaceCrops {
    pub(crate) rects: Vec<Option<Rect>>,
    pub(crate) gray: Vec<GrayImage>,
}

impl FaceCrops {
    pub(crate) fn extract(frames: &[Frame], regions: Option<&[FaceRegion]>) -> Self {
        let rects = resolve_regions(frames, regions);
        let gray = map_with_scratch(frames, || (), |_, i, frame| frame.to_grayscale(rects[i]));
        Self { rects, gray }
    }

    pub(crate) fn len(&self) -> usize {
        self.gray.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.gray.is_empty()
    }
}

//! Face Region and ROI Clamping
//!
//! Face boxes come from an external tracker in floating-point pixel
//! coordinates and may extend past the frame edges. They are clamped to an
//! integer `Rect` before any crop is taken.

/// Integer pixel rectangle, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Number of pixels covered
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Clamp to a `frame_w x frame_h` frame. Returns `None` if nothing remains.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<Rect> {
        if self.x >= frame_w || self.y >= frame_h {
            return None;
        }
        let width = self.width.min(frame_w - self.x);
        let height = self.height.min(frame_h - self.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Rect { x: self.x, y: self.y, width, height })
    }
}

/// Face detection result supplied by an external tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRegion {
    /// Bounding box [x, y, width, height] in pixels
    pub bbox: [f32; 4],
    /// Detection confidence (0-1)
    pub confidence: f32,
}

impl FaceRegion {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            bbox: [x, y, width, height],
            confidence: 1.0,
        }
    }

    /// Convert to a pixel rectangle clamped to the frame.
    ///
    /// Negative origins are shifted to zero and the extent shrunk to match.
    /// Non-finite boxes yield `None`.
    pub fn to_rect(&self, frame_w: u32, frame_h: u32) -> Option<Rect> {
        let [x, y, w, h] = self.bbox;
        if !(x.is_finite() && y.is_finite() && w.is_finite() && h.is_finite()) {
            return None;
        }

        let x0 = x.floor().max(0.0);
        let y0 = y.floor().max(0.0);
        let x1 = (x + w).ceil().min(frame_w as f32);
        let y1 = (y + h).ceil().min(frame_h as f32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Rect::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
            .clamp_to(frame_w, frame_h)
    }
}

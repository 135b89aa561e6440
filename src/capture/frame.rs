//! The shared frame type produced by capture sources and consumed by every
//! subscribed instance's reducer.

use std::sync::Arc;

use crate::color::Rgb8;

/// Tags the pixel format the frame originated in, so a reducer or
/// tone-mapper can pick matching LUT/YUV-matrix variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb24,
    Bgr24,
    Nv12,
    P010,
}

/// An immutable, reference-counted frame. Frames are shared between the
/// producer and every subscribed consumer; no consumer may mutate the
/// pixel data. The frame's lifetime ends when the last `Arc` clone drops.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pixels: Arc<[Rgb8]>,
}

impl Frame {
    /// Build a frame from already-decoded RGB pixels in row-major order.
    /// Panics if `pixels.len() != width * height` — this is a programmer
    /// error in the capture source, not a runtime condition to recover from.
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: Vec<Rgb8>) -> Self {
        assert_eq!(pixels.len(), (width as usize) * (height as usize));
        Frame { width, height, format, pixels: Arc::from(pixels) }
    }

    pub fn pixels(&self) -> &[Rgb8] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

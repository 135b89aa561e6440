//! Cheap average-color sampling over a fractional rectangle of a frame.
//!
//! This is the same "resize-and-skip" analyzer the teacher used to average a
//! capture region into one color, generalized from a single fixed LED table
//! to the fractional [`crate::config::ScanRect`] used across the crate, and
//! put to work behind the border detector rather than the main reducer (the
//! reducer itself uses precomputed index lists, see [`crate::reducer`]).

use crate::color::Rgb8;
use crate::config::ScanRect;

use super::frame::Frame;

/// Samples a frame at reduced resolution, skipping rows/columns to keep the
/// cost of scanning a full-resolution capture down.
pub struct ImageAnalyzer<'f> {
    frame: &'f Frame,
    resize_width: u32,
    resize_height: u32,
}

impl<'f> ImageAnalyzer<'f> {
    pub fn new(frame: &'f Frame, resize_width: u32, resize_height: u32) -> Self {
        let resize_width = if resize_width == 0 { frame.width } else { resize_width };
        let resize_height = if resize_height == 0 { frame.height } else { resize_height };
        ImageAnalyzer { frame, resize_width, resize_height }
    }

    /// Average color over `rect`, sampled at the analyzer's resize
    /// resolution. Returns black for an empty frame or a degenerate (zero
    /// area) rectangle.
    pub fn average_color(&self, rect: ScanRect) -> Rgb8 {
        if self.frame.is_empty() {
            return Rgb8::BLACK;
        }

        let width_ratio = self.frame.width as f32 / self.resize_width as f32;
        let height_ratio = self.frame.height as f32 / self.resize_height as f32;

        let y1 = (rect.y1 * self.resize_height as f32) as u32;
        let y2 = (rect.y2 * self.resize_height as f32) as u32;
        let x1 = (rect.x1 * self.resize_width as f32) as u32;
        let x2 = (rect.x2 * self.resize_width as f32) as u32;

        if y2 <= y1 || x2 <= x1 {
            return Rgb8::BLACK;
        }

        let pixels = self.frame.pixels();
        let (mut r_sum, mut g_sum, mut b_sum, mut n) = (0u32, 0u32, 0u32, 0u32);
        for row in y1..y2 {
            for col in x1..x2 {
                let src_row = (row as f32 * height_ratio) as u32;
                let src_col = (col as f32 * width_ratio) as u32;
                let idx = (src_row * self.frame.width + src_col) as usize;
                if let Some(pixel) = pixels.get(idx) {
                    r_sum += pixel.r as u32;
                    g_sum += pixel.g as u32;
                    b_sum += pixel.b as u32;
                    n += 1;
                }
            }
        }

        if n == 0 {
            Rgb8::BLACK
        } else {
            Rgb8::new((r_sum / n) as u8, (g_sum / n) as u8, (b_sum / n) as u8)
        }
    }
}

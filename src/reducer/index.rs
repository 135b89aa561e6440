//! Precomputed per-LED pixel index lists, rebuilt whenever frame size,
//! borders, or layout change (spec §3 "Reducer state", §4.2 "Index
//! pre-computation").

use crate::config::{Led, LedLayout};

/// Cap on how many source pixels may feed a single LED. 32-bit accumulators
/// in [`super::reduce`] would still be safe well past this, but a LED this
/// large is itself a sign the layout or borders are wrong.
pub const MAX_PIXELS_PER_LED: usize = 1 << 24;

/// Target sample count for sparse mode; large LED rectangles are
/// sub-sampled down toward this rather than accumulating every pixel.
const SPARSE_SAMPLE_TARGET: usize = 121;

/// Which reduction formula [`super::Reducer::reduce`] applies to each LED's
/// sampled pixel set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReduceMode {
    Unicolor,
    Mean,
    WeightedMean,
}

#[derive(Clone, Debug, Default)]
pub struct ReducerIndex {
    /// One dense (or sparse-sampled) list of absolute pixel indices per LED.
    pub pixel_indices: Vec<Vec<u32>>,
    pub h_border: u32,
    pub v_border: u32,
    pub mode: ReduceMode,
    pub sparse: bool,
    pub frame_w: u32,
    pub frame_h: u32,
}

impl Default for ReduceMode {
    fn default() -> Self {
        ReduceMode::Mean
    }
}

impl ReducerIndex {
    /// Rebuild the index for the given layout, frame dimensions and border
    /// insets. `frame_w`/`frame_h` must both be nonzero; an empty frame is
    /// handled by the caller before this is reached.
    pub fn build(layout: &LedLayout, frame_w: u32, frame_h: u32, h_border: u32, v_border: u32, mode: ReduceMode, sparse: bool) -> Self {
        let w_inner = frame_w.saturating_sub(2 * h_border).max(1);
        let h_inner = frame_h.saturating_sub(2 * v_border).max(1);

        let pixel_indices = layout
            .leds
            .iter()
            .map(|led| indices_for_led(led, frame_w, w_inner, h_inner, h_border, v_border, sparse))
            .collect();

        ReducerIndex { pixel_indices, h_border, v_border, mode, sparse, frame_w, frame_h }
    }

    pub fn matches(&self, frame_w: u32, frame_h: u32) -> bool {
        self.frame_w == frame_w && self.frame_h == frame_h
    }
}

fn indices_for_led(led: &Led, frame_w: u32, w_inner: u32, h_inner: u32, h_border: u32, v_border: u32, sparse: bool) -> Vec<u32> {
    if led.disabled {
        return Vec::new();
    }
    let rect = led.rect;

    let x0 = (rect.x1 * w_inner as f32).round() as u32 + h_border;
    let x1 = (rect.x2 * w_inner as f32).round() as u32 + h_border;
    let y0 = (rect.y1 * h_inner as f32).round() as u32 + v_border;
    let y1 = (rect.y2 * h_inner as f32).round() as u32 + v_border;

    let mut indices = Vec::new();
    for y in y0..y1 {
        for x in x0..x1 {
            indices.push(y * frame_w + x);
        }
    }

    if sparse && indices.len() > SPARSE_SAMPLE_TARGET {
        let step = (indices.len() / SPARSE_SAMPLE_TARGET).max(1);
        indices = indices.into_iter().step_by(step).collect();
    }

    if indices.len() > MAX_PIXELS_PER_LED {
        indices.truncate(MAX_PIXELS_PER_LED);
    }

    indices
}
